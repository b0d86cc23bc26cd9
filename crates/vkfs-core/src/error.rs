use thiserror::Error;

pub type VkfsResult<T> = Result<T, VkfsError>;

#[derive(Debug, Error)]
pub enum VkfsError {
    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

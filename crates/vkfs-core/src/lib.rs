pub mod config;
pub mod error;

pub use config::{CryptoConfig, LogConfig, SchemePreference, VkfsConfig};
pub use error::{VkfsError, VkfsResult};

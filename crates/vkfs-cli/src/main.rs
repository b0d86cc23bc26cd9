//! vkfs: vault key and filename tool
//!
//! Commands:
//!   unlock                       - check a password against a vault key file
//!   encrypt-name <name>          - print the ciphertext name for a cleartext entry
//!   decrypt-name <ciphertext>    - print the cleartext name for a ciphertext entry
//!   config show                  - display current configuration
//!
//! Key material is never printed; only names and status go to stdout.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use secrecy::SecretString;
use std::path::{Path, PathBuf};
use tracing::info;

use vkfs_core::VkfsConfig;
use vkfs_crypto::{
    verify_version_mac, FilenameCipher, KdfLimits, KeyRecord, MasterKeyUnwrapper, Password,
    SchemeVariant, VaultKeys,
};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "vkfs",
    version,
    about = "Vault key unlock and filename encryption",
    long_about = "vkfs: unlock vault master keys and encrypt/decrypt entry names"
)]
struct Cli {
    /// Path to vkfs.toml configuration file
    #[arg(long, short = 'c', env = "VKFS_CONFIG", default_value = "vkfs.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides config
    #[arg(long, env = "VKFS_LOG")]
    log: Option<String>,

    /// Log format; overrides config
    #[arg(long, env = "VKFS_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Derive the master keys and report whether the password is correct
    Unlock {
        /// Vault key file (overrides config key_file)
        #[arg(long, short = 'k', env = "VKFS_KEY_FILE")]
        key_file: Option<PathBuf>,
    },

    /// Encrypt a cleartext entry name
    #[command(name = "encrypt-name")]
    EncryptName {
        /// Cleartext entry name
        name: String,
        /// Parent directory id (empty = vault root)
        #[arg(long, short = 'd', default_value = "")]
        dir_id: String,
        /// Vault key file (overrides config key_file)
        #[arg(long, short = 'k', env = "VKFS_KEY_FILE")]
        key_file: Option<PathBuf>,
    },

    /// Decrypt a ciphertext entry name
    #[command(name = "decrypt-name")]
    DecryptName {
        /// Base-32 ciphertext name
        ciphertext: String,
        /// Parent directory id (empty = vault root)
        #[arg(long, short = 'd', default_value = "")]
        dir_id: String,
        /// Vault key file (overrides config key_file)
        #[arg(long, short = 'k', env = "VKFS_KEY_FILE")]
        key_file: Option<PathBuf>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = VkfsConfig::load(&cli.config)
        .with_context(|| format!("loading config: {}", cli.config.display()))?;

    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = cli.log_format.clone().unwrap_or(match config.log.format.as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Text,
    });
    init_logging(&level, &format);

    match cli.command {
        Commands::Unlock { key_file } => cmd_unlock(&config, key_file.as_deref()).await,
        Commands::EncryptName { name, dir_id, key_file } => {
            cmd_encrypt_name(&config, key_file.as_deref(), &name, &dir_id).await
        }
        Commands::DecryptName { ciphertext, dir_id, key_file } => {
            cmd_decrypt_name(&config, key_file.as_deref(), &ciphertext, &dir_id).await
        }
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(&config, &cli.config),
    }
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr so stdout stays clean for names
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

// ── Unlock ────────────────────────────────────────────────────────────────────

struct UnlockedVault {
    keys: VaultKeys,
    variant: SchemeVariant,
    format_version: u32,
}

fn read_password() -> Result<SecretString> {
    if let Ok(pw) = std::env::var("VKFS_PASSWORD") {
        return Ok(SecretString::from(pw));
    }
    let pw = rpassword::prompt_password("Vault password: ").context("reading password")?;
    Ok(SecretString::from(pw))
}

async fn unlock_vault(config: &VkfsConfig, key_file: Option<&Path>) -> Result<UnlockedVault> {
    let path = key_file
        .map(Path::to_path_buf)
        .or_else(|| config.crypto.key_file.clone())
        .context("no key file given (use --key-file or set crypto.key_file)")?;

    let json = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("reading key file: {}", path.display()))?;
    let record = KeyRecord::from_json(&json)
        .with_context(|| format!("parsing key file: {}", path.display()))?;
    let variant = SchemeVariant::resolve(config.crypto.scheme, record.format_version())?;

    info!(
        key_file = %path.display(),
        version = record.format_version(),
        scheme = %variant,
        "unlocking vault"
    );

    let password = Password::from(&read_password()?);
    let unwrapper = MasterKeyUnwrapper::with_limits(KdfLimits::from(&config.crypto));
    let keys = unwrapper
        .derive_master_keys_async(record.clone(), password, variant)
        .await
        .context("unlocking vault")?;

    if config.crypto.verify_version_mac {
        verify_version_mac(&keys, &record).context("verifying key file")?;
    }

    Ok(UnlockedVault {
        keys,
        variant,
        format_version: record.format_version(),
    })
}

// ── Commands ──────────────────────────────────────────────────────────────────

async fn cmd_unlock(config: &VkfsConfig, key_file: Option<&Path>) -> Result<()> {
    let vault = unlock_vault(config, key_file).await?;
    println!(
        "unlocked: format version {}, scheme {}",
        vault.format_version, vault.variant
    );
    Ok(())
}

async fn cmd_encrypt_name(
    config: &VkfsConfig,
    key_file: Option<&Path>,
    name: &str,
    dir_id: &str,
) -> Result<()> {
    let vault = unlock_vault(config, key_file).await?;
    println!("{}", encrypt_entry_name(&vault, name, dir_id)?);
    Ok(())
}

async fn cmd_decrypt_name(
    config: &VkfsConfig,
    key_file: Option<&Path>,
    ciphertext: &str,
    dir_id: &str,
) -> Result<()> {
    let vault = unlock_vault(config, key_file).await?;
    println!("{}", decrypt_entry_name(&vault, ciphertext, dir_id)?);
    Ok(())
}

fn encrypt_entry_name(vault: &UnlockedVault, name: &str, dir_id: &str) -> Result<String> {
    FilenameCipher::new(&vault.keys, vault.variant)
        .encrypt_name(name.as_bytes(), dir_id.as_bytes())
        .context("encrypting name")
}

fn decrypt_entry_name(vault: &UnlockedVault, ciphertext: &str, dir_id: &str) -> Result<String> {
    let name = FilenameCipher::new(&vault.keys, vault.variant)
        .decrypt_name(ciphertext, dir_id.as_bytes())
        .context("decrypting name")?;
    String::from_utf8(name).context("decrypted name is not UTF-8")
}

fn cmd_config_show(config: &VkfsConfig, path: &Path) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("rendering config")?;
    println!("# {}", path.display());
    print!("{rendered}");
    Ok(())
}

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use serde::Deserialize;
use url::Url;

pub const DEFAULT_CERTIFICATE_PATH: &str = "cert.crt";
pub const DEFAULT_PRIVATE_KEY_PATH: &str = "cert.key";
pub const DEFAULT_SHELL_URL: &str = "https://localhost";
pub const DEFAULT_TARGET_PATH: &str = "dist";

/// Options that may come from the command line, the environment or a
/// config file.
#[derive(Args, Debug, Default)]
pub struct PublishArgs {
    /// Client TLS certificate (PEM) [default: cert.crt]
    #[arg(long, value_name = "FILE", env = "SITEPIN_CERTIFICATE_PATH")]
    pub certificate_path: Option<PathBuf>,

    /// Private key of the client certificate (PEM) [default: cert.key]
    #[arg(long, value_name = "FILE", env = "SITEPIN_PRIVATE_KEY_PATH")]
    pub private_key_path: Option<PathBuf>,

    /// Base URL of the node API [default: https://localhost]
    #[arg(long, value_name = "URL", env = "SITEPIN_SHELL_URL")]
    pub shell_url: Option<Url>,

    /// Name of the node key to publish under
    #[arg(long, value_name = "NAME", env = "SITEPIN_KEY_NAME")]
    pub key_name: Option<String>,

    /// Directory to publish [default: dist]
    #[arg(long, value_name = "DIR", env = "SITEPIN_TARGET_PATH")]
    pub target_path: Option<PathBuf>,
}

/// Contents of a `--config` TOML file.
#[derive(Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub certificate_path: Option<PathBuf>,
    pub private_key_path: Option<PathBuf>,
    pub shell_url: Option<String>,
    pub key_name: Option<String>,
    pub target_path: Option<PathBuf>,
}

impl FileConfig {
    /// Reads `path`, resolving relative certificate and key paths against
    /// the directory containing it.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut config: FileConfig = toml::from_str(&contents)
            .with_context(|| format!("could not parse config file {}", path.display()))?;

        let base = path.parent().unwrap_or(Path::new(""));
        config.certificate_path = config.certificate_path.map(|p| resolve_relative(base, p));
        config.private_key_path = config.private_key_path.map(|p| resolve_relative(base, p));
        Ok(config)
    }
}

fn resolve_relative(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path
    }
}

/// Fully resolved settings of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub certificate_path: PathBuf,
    pub private_key_path: PathBuf,
    pub shell_url: Url,
    pub key_name: String,
    pub target_path: PathBuf,
}

impl Settings {
    /// Merges command line / environment values over the config file, then
    /// fills in defaults.
    pub fn resolve(args: PublishArgs, file: Option<FileConfig>) -> Result<Self> {
        let file = file.unwrap_or_default();

        let shell_url = match (args.shell_url, file.shell_url) {
            (Some(url), _) => url,
            (None, Some(raw)) => raw
                .parse()
                .with_context(|| format!("invalid shell-url '{raw}' in config file"))?,
            (None, None) => DEFAULT_SHELL_URL
                .parse()
                .context("invalid default shell url")?,
        };

        let Some(key_name) = args.key_name.or(file.key_name) else {
            bail!("no key name given; pass --key-name or set key-name in the config file");
        };
        if key_name.trim().is_empty() {
            bail!("key name must not be empty");
        }

        Ok(Self {
            certificate_path: args
                .certificate_path
                .or(file.certificate_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CERTIFICATE_PATH)),
            private_key_path: args
                .private_key_path
                .or(file.private_key_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PRIVATE_KEY_PATH)),
            shell_url,
            key_name,
            target_path: args
                .target_path
                .or(file.target_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TARGET_PATH)),
        })
    }
}

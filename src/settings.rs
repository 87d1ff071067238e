use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info};
use serde::Deserialize;

use mailsrs::{Separator, SrsConfig};

/// Engine settings as given on the command line, in the environment, or in
/// a JSON file. Command line and environment win over the file.
#[derive(clap::Args, Deserialize, Debug, Default, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Secret key for hashing, unique and permanent per server
    #[arg(long, env = "SRS_SECRET", hide_env_values = true, global = true)]
    pub secret: Option<String>,

    /// File whose first line is the secret
    #[arg(long, env = "SRS_SECRET_FILE", global = true)]
    pub secret_file: Option<PathBuf>,

    /// Domain of this forwarding relay
    #[arg(long, env = "SRS_DOMAIN", global = true)]
    pub domain: Option<String>,

    /// Number of hash characters in rewritten addresses (default: 4)
    #[arg(long, env = "SRS_HASH_LENGTH", global = true)]
    pub hash_length: Option<usize>,

    /// Days a rewritten address stays reversible (default: 21)
    #[arg(long, env = "SRS_MAX_AGE_DAYS", global = true)]
    pub max_age_days: Option<u32>,

    /// Separator after SRS0/SRS1, one of = + - (default: =)
    #[arg(long, env = "SRS_SEPARATOR", global = true)]
    pub separator: Option<String>,
}

impl Settings {
    /// Fill every unset value from `other`.
    pub fn or(self, other: Settings) -> Settings {
        Settings {
            secret: self.secret.or(other.secret),
            secret_file: self.secret_file.or(other.secret_file),
            domain: self.domain.or(other.domain),
            hash_length: self.hash_length.or(other.hash_length),
            max_age_days: self.max_age_days.or(other.max_age_days),
            separator: self.separator.or(other.separator),
        }
    }

    pub fn into_config(self) -> Result<SrsConfig> {
        let secret = match (self.secret, &self.secret_file) {
            (Some(secret), _) => secret,
            (None, Some(path)) => read_secret_file(path)?,
            (None, None) => bail!("no secret configured, set SRS_SECRET or SRS_SECRET_FILE"),
        };
        let domain = self
            .domain
            .ok_or_else(|| anyhow!("no domain configured, set SRS_DOMAIN"))?;

        let mut builder = SrsConfig::builder(secret, domain);
        if let Some(hash_length) = self.hash_length {
            builder = builder.hash_length(hash_length);
        }
        if let Some(max_age_days) = self.max_age_days {
            builder = builder.max_age_days(max_age_days);
        }
        if let Some(separator) = self.separator {
            builder = builder.separator(parse_separator(&separator)?);
        }
        Ok(builder.build()?)
    }
}

pub fn load_file(path: &Path) -> Result<Settings> {
    info!("[settings] loading configuration from {}", path.display());
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    debug!("[settings] file sets domain={:?}", settings.domain);
    Ok(settings)
}

fn read_secret_file(path: &Path) -> Result<String> {
    debug!("[settings] reading secret from {}", path.display());
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read secret file {}", path.display()))?;
    let secret = content.lines().next().unwrap_or_default().trim_end().to_string();
    if secret.is_empty() {
        bail!("secret file {} is empty", path.display());
    }
    Ok(secret)
}

fn parse_separator(value: &str) -> Result<Separator> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Separator::try_from(c)?),
        _ => bail!("separator must be a single character, got {:?}", value),
    }
}

//! Engine configuration and the time source it reads.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::debug;

use crate::error::SrsError;
use crate::tag::MAX_HASH_LENGTH;
use crate::timestamp::TIME_SLOTS;

pub const DEFAULT_HASH_LENGTH: usize = 4;
pub const DEFAULT_MAX_AGE_DAYS: u32 = 21;

/// Source of the current instant for timestamps and freshness checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stopped at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Character placed right after `SRS0`/`SRS1` in envelopes this relay emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Separator {
    #[default]
    Equals,
    Plus,
    Minus,
}

impl Separator {
    pub fn as_char(self) -> char {
        match self {
            Separator::Equals => '=',
            Separator::Plus => '+',
            Separator::Minus => '-',
        }
    }

    pub fn is_separator(c: char) -> bool {
        Separator::try_from(c).is_ok()
    }
}

impl TryFrom<char> for Separator {
    type Error = SrsError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            '=' => Ok(Separator::Equals),
            '+' => Ok(Separator::Plus),
            '-' => Ok(Separator::Minus),
            other => Err(SrsError::InvalidConfig(format!(
                "separator must be one of '=', '+', '-', got {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Validated, immutable engine configuration.
///
/// Only [`SrsConfigBuilder::build`] creates one, so every instance carries
/// resolved defaults.
#[derive(Clone)]
pub struct SrsConfig {
    secret: Vec<u8>,
    domain: String,
    hash_length: usize,
    max_age_days: u32,
    separator: Separator,
    clock: Arc<dyn Clock>,
}

impl SrsConfig {
    pub fn builder(secret: impl Into<Vec<u8>>, domain: impl Into<String>) -> SrsConfigBuilder {
        SrsConfigBuilder {
            secret: secret.into(),
            domain: domain.into(),
            hash_length: DEFAULT_HASH_LENGTH,
            max_age_days: DEFAULT_MAX_AGE_DAYS,
            separator: Separator::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn hash_length(&self) -> usize {
        self.hash_length
    }

    pub fn max_age_days(&self) -> u32 {
        self.max_age_days
    }

    pub fn separator(&self) -> Separator {
        self.separator
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

impl fmt::Debug for SrsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SrsConfig")
            .field("secret", &"<redacted>")
            .field("domain", &self.domain)
            .field("hash_length", &self.hash_length)
            .field("max_age_days", &self.max_age_days)
            .field("separator", &self.separator)
            .finish_non_exhaustive()
    }
}

pub struct SrsConfigBuilder {
    secret: Vec<u8>,
    domain: String,
    hash_length: usize,
    max_age_days: u32,
    separator: Separator,
    clock: Arc<dyn Clock>,
}

impl SrsConfigBuilder {
    pub fn hash_length(mut self, hash_length: usize) -> Self {
        self.hash_length = hash_length;
        self
    }

    pub fn max_age_days(mut self, max_age_days: u32) -> Self {
        self.max_age_days = max_age_days;
        self
    }

    pub fn separator(mut self, separator: Separator) -> Self {
        self.separator = separator;
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn build(self) -> Result<SrsConfig, SrsError> {
        if self.secret.is_empty() {
            return Err(SrsError::InvalidConfig("secret must not be empty".into()));
        }
        if self.domain.is_empty() || self.domain.contains('@') {
            return Err(SrsError::InvalidConfig(format!(
                "domain {:?} is not a bare domain name",
                self.domain
            )));
        }
        if self.hash_length == 0 || self.hash_length > MAX_HASH_LENGTH {
            return Err(SrsError::InvalidConfig(format!(
                "hash length must be between 1 and {}, got {}",
                MAX_HASH_LENGTH, self.hash_length
            )));
        }
        if u64::from(self.max_age_days) >= TIME_SLOTS {
            return Err(SrsError::InvalidConfig(format!(
                "max age must be below {} days, got {}",
                TIME_SLOTS, self.max_age_days
            )));
        }

        debug!(
            "[config] domain={}, hash_length={}, max_age_days={}, separator={}",
            self.domain, self.hash_length, self.max_age_days, self.separator
        );

        Ok(SrsConfig {
            secret: self.secret,
            domain: self.domain,
            hash_length: self.hash_length,
            max_age_days: self.max_age_days,
            separator: self.separator,
            clock: self.clock,
        })
    }
}

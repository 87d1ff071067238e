use log::{debug, warn};

use crate::address::{self, Address};
use crate::config::SrsConfig;
use crate::envelope::{self, Envelope};
use crate::error::SrsError;
use crate::tag;
use crate::timestamp;

/// SRS rewriting engine for one relay domain.
///
/// Holds nothing but its configuration, so one instance can be shared across
/// threads and called concurrently.
#[derive(Debug, Clone)]
pub struct Srs {
    config: SrsConfig,
}

impl Srs {
    pub fn new(config: SrsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SrsConfig {
        &self.config
    }

    /// Rewrite a sender address so it belongs to the relay domain.
    ///
    /// Addresses already at the relay domain come back unchanged. An SRS0
    /// address from another relay becomes SRS1, and an SRS1 address is
    /// re-signed for this relay without nesting.
    pub fn forward(&self, email: &str) -> Result<String, SrsError> {
        let addr = match address::bare_local(email) {
            Some(addr) => {
                debug!("[srs] forward: {:?} has no domain, wrapping with empty host", email);
                addr
            }
            None => address::split(email)?,
        };

        if addr.domain.eq_ignore_ascii_case(self.config.domain()) {
            debug!("[srs] forward: {} is already local", email);
            return Ok(email.to_string());
        }

        match envelope::classify(&addr.local) {
            Envelope::Unwrapped => Ok(self.rewrite(&addr)),
            Envelope::Form1 => self.rewrite_srs0(&addr),
            Envelope::Form2 => self.rewrite_srs1(&addr),
        }
    }

    fn rewrite(&self, addr: &Address) -> String {
        let ts = timestamp::encode(self.config.now());
        let hash = self.hash(&[ts.as_str(), addr.domain.as_str(), addr.local.as_str()]);
        envelope::format_form1(
            self.config.separator(),
            &hash,
            &ts,
            &addr.domain,
            &addr.local,
            self.config.domain(),
        )
    }

    /// SRS0 from another relay: keep its envelope opaque, sign it with the
    /// host that relay lives at.
    fn rewrite_srs0(&self, addr: &Address) -> Result<String, SrsError> {
        let opaque = envelope::opaque_part(&addr.local);
        let hash = self.hash(&[addr.domain.as_str(), opaque]);
        envelope::format_form2(
            self.config.separator(),
            &hash,
            &addr.domain,
            opaque,
            self.config.domain(),
        )
    }

    /// SRS1 from another relay: drop its hash and sign the same host and
    /// opaque part ourselves.
    fn rewrite_srs1(&self, addr: &Address) -> Result<String, SrsError> {
        let form = envelope::parse_form2(&addr.local)?;
        let hash = self.hash(&[form.host, form.opaque]);
        envelope::format_form2(
            self.config.separator(),
            &hash,
            form.host,
            form.opaque,
            self.config.domain(),
        )
    }

    /// Undo one layer of rewriting done by this relay.
    ///
    /// SRS0 yields the original address. SRS1 yields the SRS0 address of the
    /// relay that wrapped it first; that relay checks its own hash.
    pub fn reverse(&self, email: &str) -> Result<String, SrsError> {
        let addr = address::split(email)?;

        match envelope::classify(&addr.local) {
            Envelope::Form1 => {
                let form = envelope::parse_form1(&addr.local)?;
                timestamp::validate(form.timestamp, self.config.now(), self.config.max_age_days())
                    .map_err(|e| {
                        warn!("[srs] reverse: {}: {}", email, e);
                        e
                    })?;
                if !self.verify(form.tag, &[form.timestamp, form.host, form.user]) {
                    warn!("[srs] reverse: hash mismatch for {}", email);
                    return Err(SrsError::TagInvalid);
                }
                Ok(format!("{}@{}", form.user, form.host))
            }
            Envelope::Form2 => {
                let form = envelope::parse_form2(&addr.local)?;
                if !self.verify(form.tag, &[form.host, form.opaque]) {
                    warn!("[srs] reverse: hash mismatch for {}", email);
                    return Err(SrsError::TagInvalid);
                }
                Ok(envelope::format_unwrapped_form2(form.opaque, form.host))
            }
            Envelope::Unwrapped => {
                debug!("[srs] reverse: {} is not an SRS address", email);
                Err(SrsError::NotAnSrsAddress)
            }
        }
    }

    fn hash(&self, fields: &[&str]) -> String {
        tag::compute(self.config.secret(), fields, self.config.hash_length())
    }

    fn verify(&self, hash: &str, fields: &[&str]) -> bool {
        tag::verify(hash, self.config.secret(), fields, self.config.hash_length())
    }
}

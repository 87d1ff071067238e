use thiserror::Error;

/// Everything that can go wrong while rewriting or reversing an address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SrsError {
    /// No "@", empty local-part, or not a single RFC 5322 mailbox
    #[error("bad formatted email address")]
    BadAddressFormat,

    /// Local-part does not start with SRS0/SRS1 followed by a separator
    #[error("not an SRS address")]
    NotAnSrsAddress,

    /// Nothing follows the SRS prefix
    #[error("SRS address has no content after its prefix")]
    EnvelopeTooShort,

    /// A field the envelope form requires is absent
    #[error("no {0} in SRS address")]
    MissingField(&'static str),

    /// SRS1 tag and host segment is below the length floor
    #[error("SRS1 hash segment too short")]
    TagTooShort,

    #[error("bad base32 character {0:?} in timestamp")]
    InvalidTimestampDigit(char),

    /// Outside the freshness window, either too old or too far in the future
    #[error("timestamp out of date")]
    TimestampExpired,

    #[error("hash invalid in SRS address")]
    TagInvalid,

    #[error("invalid SRS configuration: {0}")]
    InvalidConfig(String),
}

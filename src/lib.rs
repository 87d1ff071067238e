//! Sender Rewriting Scheme for forwarding mail relays.
//!
//! A relay that forwards mail rewrites the envelope sender into its own
//! domain so SPF checks at the next hop pass, and reverses the rewrite when a
//! bounce comes back:
//!
//! ```text
//! user@origin.org  --forward-->  SRS0=HHHH=TT=origin.org=user@relay.net
//! SRS0=HHHH=TT=origin.org=user@relay.net  --reverse-->  user@origin.org
//! ```
//!
//! `HHHH` is a truncated HMAC-SHA1 over the other fields and `TT` a day
//! counter that limits how long a rewritten address stays valid. Addresses
//! that are already rewritten by another relay become `SRS1` addresses that
//! point back at that relay.
//!
//! ```no_run
//! use mailsrs::{Srs, SrsConfig};
//!
//! let config = SrsConfig::builder("per-server secret", "relay.net").build()?;
//! let srs = Srs::new(config);
//! let wrapped = srs.forward("user@origin.org")?;
//! assert_eq!(srs.reverse(&wrapped)?, "user@origin.org");
//! # Ok::<(), mailsrs::SrsError>(())
//! ```

pub mod address;
pub mod config;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod tag;
pub mod timestamp;

pub use config::{Clock, FixedClock, Separator, SrsConfig, SrsConfigBuilder, SystemClock};
pub use engine::Srs;
pub use error::SrsError;

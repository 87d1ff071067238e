//! Cyclic day counter carried in SRS0 envelopes.
//!
//! The counter is the number of whole days since the Unix epoch modulo 1024,
//! written in a 32-symbol alphabet with the most significant digit first. It
//! wraps roughly every 2.8 years, so freshness checks compare within a cycle.

use chrono::{DateTime, Utc};
use log::debug;

use crate::error::SrsError;

pub const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";
pub const TIME_SLOTS: u64 = 1024;
const SECONDS_PER_DAY: i64 = 60 * 60 * 24;

/// Day slot in `[0, 1024)` for the given instant.
pub fn time_slot(now: DateTime<Utc>) -> u64 {
    now.timestamp()
        .div_euclid(SECONDS_PER_DAY)
        .rem_euclid(TIME_SLOTS as i64) as u64
}

/// Render the current day slot. Slot zero encodes as the empty string.
pub fn encode(now: DateTime<Utc>) -> String {
    encode_slot(time_slot(now))
}

fn encode_slot(mut slot: u64) -> String {
    let mut digits = Vec::new();
    while slot > 0 {
        digits.push(BASE32_ALPHABET[(slot % 32) as usize] as char);
        slot /= 32;
    }
    digits.iter().rev().collect()
}

fn digit_value(c: char) -> Option<u64> {
    let upper = c.to_ascii_uppercase();
    BASE32_ALPHABET
        .iter()
        .position(|&b| b as char == upper)
        .map(|p| p as u64)
}

/// Check that `encoded` names a day no more than `max_age_days` before `now`.
pub fn validate(encoded: &str, now: DateTime<Utc>, max_age_days: u32) -> Result<(), SrsError> {
    let mut then: u64 = 0;
    for c in encoded.chars() {
        let digit = digit_value(c).ok_or(SrsError::InvalidTimestampDigit(c))?;
        then = then
            .checked_mul(32)
            .and_then(|v| v.checked_add(digit))
            .ok_or(SrsError::TimestampExpired)?;
    }

    let mut now_slot = time_slot(now);
    if now_slot < then {
        // lift into the same cycle as `then`
        let laps = (then - now_slot).div_ceil(TIME_SLOTS);
        now_slot = laps
            .checked_mul(TIME_SLOTS)
            .and_then(|lift| lift.checked_add(now_slot))
            .ok_or(SrsError::TimestampExpired)?;
    }

    debug!(
        "[timestamp] then={}, now={}, max_age_days={}",
        then, now_slot, max_age_days
    );

    if now_slot <= then.saturating_add(u64::from(max_age_days)) {
        Ok(())
    } else {
        Err(SrsError::TimestampExpired)
    }
}

use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Length of a base64-encoded SHA-1 digest, the longest tag we can emit.
pub const MAX_HASH_LENGTH: usize = 28;

/// Keyed tag over the lower-cased concatenation of `fields`.
///
/// The fields are joined in the order given, so callers fix the canonical
/// order. The result keeps base64 case; only verification folds case.
pub fn compute(secret: &[u8], fields: &[&str], hash_length: usize) -> String {
    let canonical = fields.concat().to_lowercase();
    let mut mac = HmacSha1::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(canonical.as_bytes());
    let digest = mac.finalize().into_bytes();

    let mut encoded = STANDARD.encode(digest);
    encoded.truncate(hash_length.min(MAX_HASH_LENGTH));
    encoded
}

/// Recompute the tag and compare it to `tag`, ignoring ASCII case.
pub fn verify(tag: &str, secret: &[u8], fields: &[&str], hash_length: usize) -> bool {
    let expected = compute(secret, fields, hash_length);
    if expected.len() != tag.len() {
        return false;
    }
    expected
        .bytes()
        .zip(tag.bytes())
        .fold(0u8, |diff, (a, b)| {
            diff | (a.to_ascii_lowercase() ^ b.to_ascii_lowercase())
        })
        == 0
}

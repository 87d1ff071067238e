use log::debug;
use mailparse::{addrparse, MailAddr};

use crate::error::SrsError;

/// An email address split into its two halves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub local: String,
    pub domain: String,
}

/// Parse `input` as a single RFC 5322 mailbox and split it at the last "@".
///
/// Display names and angle brackets are dropped. Groups, lists and anything
/// without both a local-part and a domain-part are rejected.
pub fn split(input: &str) -> Result<Address, SrsError> {
    let list = addrparse(input).map_err(|e| {
        debug!("[address] failed to parse {:?}: {}", input, e);
        SrsError::BadAddressFormat
    })?;

    let addr = match &list[..] {
        [MailAddr::Single(info)] => info.addr.clone(),
        other => {
            debug!("[address] expected one mailbox in {:?}, found {}", input, other.len());
            return Err(SrsError::BadAddressFormat);
        }
    };

    let (local, domain) = addr.rsplit_once('@').ok_or_else(|| {
        debug!("[address] no \"@\" in {:?}", input);
        SrsError::BadAddressFormat
    })?;

    if !is_local_part(local) || !is_domain_part(domain) {
        debug!("[address] invalid local-part or domain-part in {:?}", input);
        return Err(SrsError::BadAddressFormat);
    }

    Ok(Address {
        local: local.to_string(),
        domain: domain.to_string(),
    })
}

/// RFC 5322 `atext`. Non-ASCII is allowed for internationalized addresses.
fn is_atext(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-/=?^_`{|}~".contains(c) || !c.is_ascii()
}

/// `atom *("." atom)`: no empty atoms, so no leading, trailing or doubled dots.
fn is_dot_atom(s: &str) -> bool {
    !s.is_empty() && s.split('.').all(|atom| !atom.is_empty() && atom.chars().all(is_atext))
}

/// `"..."` with backslash escapes and no bare quote, CR or LF inside.
fn is_quoted_string(s: &str) -> bool {
    let Some(inner) = s.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')) else {
        return false;
    };
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if chars.next().is_none() {
                    return false;
                }
            }
            '"' | '\r' | '\n' => return false,
            _ => {}
        }
    }
    true
}

fn is_local_part(s: &str) -> bool {
    is_dot_atom(s) || is_quoted_string(s)
}

/// Dot-atom host name or a bracketed address literal such as `[192.0.2.1]`.
fn is_domain_part(s: &str) -> bool {
    if let Some(literal) = s.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
        return !literal.is_empty()
            && !literal
                .chars()
                .any(|c| matches!(c, '[' | ']' | '\\') || c.is_whitespace());
    }
    is_dot_atom(s)
}

/// A mailbox with a local-part and nothing after the "@", such as `"user@"`.
///
/// Such input is not a valid RFC 5322 address, but forwarding still accepts it
/// and records an empty original domain.
pub fn bare_local(input: &str) -> Option<Address> {
    let local = input.strip_suffix('@')?;
    if !is_local_part(local) {
        return None;
    }
    Some(Address {
        local: local.to_string(),
        domain: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(local: &str, domain: &str) -> Address {
        Address {
            local: local.to_string(),
            domain: domain.to_string(),
        }
    }

    #[test]
    fn split_plain_address() {
        assert_eq!(split("test@domain").unwrap(), address("test", "domain"));
    }

    #[test]
    fn split_keeps_case() {
        assert_eq!(
            split("TEST@OtherDomain.COM").unwrap(),
            address("TEST", "OtherDomain.COM")
        );
    }

    #[test]
    fn split_strips_display_name() {
        assert_eq!(
            split("Test User <test@domain.org>").unwrap(),
            address("test", "domain.org")
        );
    }

    #[test]
    fn split_srs_local_part() {
        assert_eq!(
            split("SRS0=XjO9=2V=otherdomain.com=test@example.com").unwrap(),
            address("SRS0=XjO9=2V=otherdomain.com=test", "example.com")
        );
    }

    #[test]
    fn split_rejects_missing_at() {
        assert_eq!(split("no-at"), Err(SrsError::BadAddressFormat));
    }

    #[test]
    fn split_rejects_empty() {
        assert_eq!(split(""), Err(SrsError::BadAddressFormat));
    }

    #[test]
    fn split_rejects_list() {
        assert_eq!(
            split("a@one.org, b@two.org"),
            Err(SrsError::BadAddressFormat)
        );
    }

    #[test]
    fn split_rejects_unbalanced_comment() {
        assert_eq!(split("(test@domain"), Err(SrsError::BadAddressFormat));
    }

    #[test]
    fn split_rejects_bad_local_parts() {
        for input in ["a..b@domain.org", ".ab@domain.org", "ab.@domain.org"] {
            assert_eq!(split(input), Err(SrsError::BadAddressFormat), "{}", input);
        }
    }

    #[test]
    fn split_rejects_bad_domains() {
        for input in ["user@domain..org", "user@.domain.org", "user@[]"] {
            assert_eq!(split(input), Err(SrsError::BadAddressFormat), "{}", input);
        }
    }

    #[test]
    fn local_part_syntax() {
        assert!(is_local_part("first.last+tag"));
        assert!(is_local_part("SRS0=ab/+=2W=host.org=user"));
        assert!(is_local_part("\"john doe\""));
        assert!(is_local_part("\"a\\\"b\""));
        assert!(!is_local_part("(test"));
        assert!(!is_local_part("john doe"));
        assert!(!is_local_part("<user"));
        assert!(!is_local_part("\"open"));
        assert!(!is_local_part(""));
    }

    #[test]
    fn domain_part_syntax() {
        assert!(is_domain_part("example.com"));
        assert!(is_domain_part("localhost"));
        assert!(is_domain_part("[192.0.2.1]"));
        assert!(is_domain_part("[IPv6:2001:db8::1]"));
        assert!(!is_domain_part("exa mple.com"));
        assert!(!is_domain_part("example.com>"));
        assert!(!is_domain_part("[1.2.3.4"));
        assert!(!is_domain_part(""));
    }

    #[test]
    fn bare_local_accepts_trailing_at() {
        assert_eq!(bare_local("test@"), Some(address("test", "")));
    }

    #[test]
    fn bare_local_rejects_others() {
        assert_eq!(bare_local("@"), None);
        assert_eq!(bare_local("test@example.com"), None);
        assert_eq!(bare_local("a@b@"), None);
        assert_eq!(bare_local("some user@"), None);
        assert_eq!(bare_local("(test@"), None);
    }
}

//! Local-part grammar of the two SRS envelope forms.
//!
//! ```text
//! SRS0<sep>TAG=TIMESTAMP=HOST=USER
//! SRS1<sep>TAG=HOST=<inner sep>OPAQUE
//! ```
//!
//! `<sep>` is one of `=`, `+`, `-`. In an SRS1 envelope the host is followed by
//! `=` and then the separator of the envelope that was wrapped, so the inner
//! part can be handed back unchanged.

use log::debug;

use crate::config::Separator;
use crate::error::SrsError;

pub const SRS0_PREFIX: &str = "SRS0";
pub const SRS1_PREFIX: &str = "SRS1";

/// Prefix plus its separator.
const PREFIX_LEN: usize = 5;

/// SRS1 `TAG=HOST` segments of this length or less are rejected.
const MIN_SRS1_HASH_SEGMENT: usize = 8;

/// What a local-part looks like before any rewriting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    Unwrapped,
    Form1,
    Form2,
}

/// Fields of an `SRS0` local-part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Form1<'a> {
    pub tag: &'a str,
    pub timestamp: &'a str,
    pub host: &'a str,
    pub user: &'a str,
}

/// Fields of an `SRS1` local-part. `opaque` starts with the inner separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Form2<'a> {
    pub tag: &'a str,
    pub host: &'a str,
    pub opaque: &'a str,
}

fn has_prefix(local: &str, prefix: &str) -> bool {
    let bytes = local.as_bytes();
    bytes.len() >= PREFIX_LEN
        && bytes[..4].eq_ignore_ascii_case(prefix.as_bytes())
        && Separator::is_separator(bytes[4] as char)
}

/// Classify by the first five characters, ignoring case.
pub fn classify(local: &str) -> Envelope {
    let kind = if has_prefix(local, SRS0_PREFIX) {
        Envelope::Form1
    } else if has_prefix(local, SRS1_PREFIX) {
        Envelope::Form2
    } else {
        Envelope::Unwrapped
    };
    debug!("[envelope] classified {:?} as {:?}", local, kind);
    kind
}

/// The local-part from its first separator onward, e.g. `=HASH=TS=HOST=USER`
/// for an SRS0 local-part. `local` must already classify as `Form1` or `Form2`.
pub(crate) fn opaque_part(local: &str) -> &str {
    // the first five bytes are ASCII
    &local[PREFIX_LEN - 1..]
}

fn body<'a>(local: &'a str, prefix: &str) -> Result<&'a str, SrsError> {
    if !has_prefix(local, prefix) {
        return Err(SrsError::NotAnSrsAddress);
    }
    Ok(&local[PREFIX_LEN..])
}

pub fn parse_form1(local: &str) -> Result<Form1<'_>, SrsError> {
    let body = body(local, SRS0_PREFIX)?;
    if body.is_empty() {
        return Err(SrsError::EnvelopeTooShort);
    }

    let mut fields = body.splitn(4, '=');
    let tag = fields.next().ok_or(SrsError::EnvelopeTooShort)?;
    let timestamp = fields.next().ok_or(SrsError::MissingField("timestamp"))?;
    let host = fields.next().ok_or(SrsError::MissingField("host"))?;
    let user = fields.next().ok_or(SrsError::MissingField("user"))?;

    Ok(Form1 {
        tag,
        timestamp,
        host,
        user,
    })
}

/// Offset of the leftmost `==`, `=+` or `=-` in `s`.
///
/// The first `=` closes the SRS1 host; the second character is the separator
/// of the wrapped envelope. The leftmost match wins, so a host never contains
/// one of these pairs.
pub fn find_double_separator(s: &str) -> Option<usize> {
    s.as_bytes()
        .windows(2)
        .position(|pair| pair[0] == b'=' && Separator::is_separator(pair[1] as char))
}

pub fn parse_form2(local: &str) -> Result<Form2<'_>, SrsError> {
    let body = body(local, SRS1_PREFIX)?;
    if body.is_empty() {
        return Err(SrsError::EnvelopeTooShort);
    }

    let split_at = find_double_separator(body).ok_or(SrsError::MissingField("opaque part"))?;
    let head = &body[..split_at];
    if head.len() <= MIN_SRS1_HASH_SEGMENT {
        return Err(SrsError::TagTooShort);
    }
    let (tag, host) = head.split_once('=').ok_or(SrsError::MissingField("host"))?;

    Ok(Form2 {
        tag,
        host,
        opaque: &body[split_at + 1..],
    })
}

pub fn format_form1(
    separator: Separator,
    tag: &str,
    timestamp: &str,
    host: &str,
    user: &str,
    domain: &str,
) -> String {
    format!(
        "{}{}{}={}={}={}@{}",
        SRS0_PREFIX, separator, tag, timestamp, host, user, domain
    )
}

/// Build an SRS1 address, refusing any that [`parse_form2`] would not read
/// back as the same host and opaque part.
pub fn format_form2(
    separator: Separator,
    tag: &str,
    host: &str,
    opaque: &str,
    domain: &str,
) -> Result<String, SrsError> {
    if tag.len() + 1 + host.len() <= MIN_SRS1_HASH_SEGMENT {
        debug!("[envelope] SRS1 segment {}={} below length floor", tag, host);
        return Err(SrsError::TagTooShort);
    }

    let local = format!("{}{}{}={}={}", SRS1_PREFIX, separator, tag, host, opaque);
    match parse_form2(&local) {
        Ok(parsed) if parsed.host == host && parsed.opaque == opaque => {
            Ok(format!("{}@{}", local, domain))
        }
        _ => {
            debug!("[envelope] host {:?} is ambiguous in SRS1 local-part {:?}", host, local);
            Err(SrsError::BadAddressFormat)
        }
    }
}

/// Address handed back to the relay that produced the inner envelope.
pub fn format_unwrapped_form2(opaque: &str, host: &str) -> String {
    format!("{}{}@{}", SRS0_PREFIX, opaque, host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_prefixes() {
        assert_eq!(classify("SRS0=abc"), Envelope::Form1);
        assert_eq!(classify("srs0+abc"), Envelope::Form1);
        assert_eq!(classify("SRS1-abc"), Envelope::Form2);
        assert_eq!(classify("Srs1="), Envelope::Form2);
    }

    #[test]
    fn classify_unwrapped() {
        assert_eq!(classify("test"), Envelope::Unwrapped);
        assert_eq!(classify("SRS0"), Envelope::Unwrapped);
        assert_eq!(classify("SRS0_abc"), Envelope::Unwrapped);
        assert_eq!(classify("SRS2=abc"), Envelope::Unwrapped);
        assert_eq!(classify(""), Envelope::Unwrapped);
        assert_eq!(classify("SRSé=x"), Envelope::Unwrapped);
    }

    #[test]
    fn opaque_part_starts_at_separator() {
        assert_eq!(opaque_part("SRS0=opaque+string"), "=opaque+string");
        assert_eq!(opaque_part("SRS0+a=b=c=d"), "+a=b=c=d");
        assert_eq!(opaque_part("srs1-x=host.org=-y"), "-x=host.org=-y");
    }

    #[test]
    fn parse_form1_fields() {
        let form = parse_form1("SRS0=XjO9=2V=otherdomain.com=test").unwrap();
        assert_eq!(
            form,
            Form1 {
                tag: "XjO9",
                timestamp: "2V",
                host: "otherdomain.com",
                user: "test",
            }
        );
    }

    #[test]
    fn parse_form1_user_keeps_equals() {
        let form = parse_form1("SRS0=h=ts=host=a=b").unwrap();
        assert_eq!(form.user, "a=b");
    }

    #[test]
    fn parse_form1_missing_fields() {
        assert_eq!(parse_form1("SRS0="), Err(SrsError::EnvelopeTooShort));
        assert_eq!(parse_form1("SRS0=XjO9"), Err(SrsError::MissingField("timestamp")));
        assert_eq!(parse_form1("SRS0=XjO9=2V"), Err(SrsError::MissingField("host")));
        assert_eq!(
            parse_form1("SRS0=XjO9=2V=otherdomain.com"),
            Err(SrsError::MissingField("user"))
        );
    }

    #[test]
    fn parse_form1_wrong_prefix() {
        assert_eq!(parse_form1("SRS1=a=b=c=d"), Err(SrsError::NotAnSrsAddress));
    }

    #[test]
    fn double_separator_leftmost_match() {
        assert_eq!(find_double_separator("X=host.com==rest"), Some(10));
        assert_eq!(find_double_separator("X=host.com=+a==b"), Some(10));
        assert_eq!(find_double_separator("X=host.com=-x"), Some(10));
        assert_eq!(find_double_separator("X=host.com=x"), None);
    }

    #[test]
    fn parse_form2_fields() {
        let form = parse_form2("SRS1=X=thirddomain.com==opaque+string").unwrap();
        assert_eq!(
            form,
            Form2 {
                tag: "X",
                host: "thirddomain.com",
                opaque: "=opaque+string",
            }
        );
    }

    #[test]
    fn parse_form2_keeps_inner_separator() {
        let form = parse_form2("SRS1+abcd=relay.org=+HHHH=2W=orig.net=joe").unwrap();
        assert_eq!(form.host, "relay.org");
        assert_eq!(form.opaque, "+HHHH=2W=orig.net=joe");
    }

    #[test]
    fn parse_form2_without_double_separator() {
        assert_eq!(
            parse_form2("SRS1=X=thirddomain.com"),
            Err(SrsError::MissingField("opaque part"))
        );
        assert_eq!(parse_form2("SRS1-"), Err(SrsError::EnvelopeTooShort));
    }

    #[test]
    fn parse_form2_short_hash_segment() {
        assert_eq!(parse_form2("SRS1=AB=c.de==x"), Err(SrsError::TagTooShort));
    }

    #[test]
    fn parse_form2_segment_without_host() {
        assert_eq!(
            parse_form2("SRS1=ABCDEFGHIJ==x"),
            Err(SrsError::MissingField("host"))
        );
    }

    #[test]
    fn format_form2_enforces_length_floor() {
        assert_eq!(
            format_form2(Separator::Equals, "/d", "t.co", "=abcd=2W=orig.org=u", "relay.net"),
            Err(SrsError::TagTooShort)
        );
        assert_eq!(
            format_form2(Separator::Equals, "Qcj0", "x.y", "=abcd", "relay.net"),
            Err(SrsError::TagTooShort)
        );
        assert!(format_form2(Separator::Equals, "Qcj0", "ab.cd", "=abcd", "relay.net").is_ok());
    }

    #[test]
    fn format_form2_rejects_ambiguous_host() {
        assert_eq!(
            format_form2(Separator::Equals, "abcd", "-relay.org", "=x", "relay.net"),
            Err(SrsError::BadAddressFormat)
        );
        assert_eq!(
            format_form2(Separator::Equals, "abcd", "a==b.org", "=x", "relay.net"),
            Err(SrsError::BadAddressFormat)
        );
    }

    #[test]
    fn format_form2_output_parses_back() {
        let address =
            format_form2(Separator::Plus, "JIBX", "thirddomain.com", "-inner=x", "relay.net")
                .unwrap();
        let (local, domain) = address.rsplit_once('@').unwrap();
        assert_eq!(domain, "relay.net");
        assert_eq!(
            parse_form2(local).unwrap(),
            Form2 {
                tag: "JIBX",
                host: "thirddomain.com",
                opaque: "-inner=x",
            }
        );
    }

    #[test]
    fn format_forms() {
        assert_eq!(
            format_form1(Separator::Equals, "vmyz", "2W", "otherdomain.com", "test", "example.com"),
            "SRS0=vmyz=2W=otherdomain.com=test@example.com"
        );
        assert_eq!(
            format_form2(Separator::Minus, "chaI", "otherdomain.com", "=opaque", "example.com")
                .unwrap(),
            "SRS1-chaI=otherdomain.com==opaque@example.com"
        );
        assert_eq!(
            format_unwrapped_form2("=opaque+string", "thirddomain.com"),
            "SRS0=opaque+string@thirddomain.com"
        );
    }
}

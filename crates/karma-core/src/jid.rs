//! Helpers for transport identities of the form `"<org>_<user>@host"`.

use std::sync::LazyLock;

use regex::Regex;

static JID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)_(\d+)@.+$").expect("static regex"));

fn jid_part(jid: &str, index: usize) -> Option<i64> {
    JID_PATTERN
        .captures(jid)?
        .get(index)?
        .as_str()
        .parse()
        .ok()
}

/// Returns the user id carried by a JID, e.g. `67890` for
/// `"12345_67890@chat.example.com"`.
pub fn jid_to_user_id(jid: &str) -> Option<i64> {
    jid_part(jid, 2)
}

/// Returns the organization id carried by a JID, e.g. `12345` for
/// `"12345_67890@chat.example.com"`.
pub fn jid_to_organization_id(jid: &str) -> Option<i64> {
    jid_part(jid, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_both_parts() {
        let jid = "12345_67890@chat.example.com";
        assert_eq!(jid_to_user_id(jid), Some(67890));
        assert_eq!(jid_to_organization_id(jid), Some(12345));
    }

    #[test]
    fn test_rejects_malformed_jid() {
        assert_eq!(jid_to_user_id("alice@chat.example.com"), None);
        assert_eq!(jid_to_user_id("12345_67890"), None);
        assert_eq!(jid_to_organization_id(""), None);
    }
}

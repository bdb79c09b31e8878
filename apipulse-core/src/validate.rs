//! Per-field validation for incoming events.
//!
//! All checks are pure. Fields are truncated to [`MAX_FIELD_CHARS`] before
//! validation; a field that still fails its check afterwards drops the event,
//! never the batch.

/// Maximum stored length for free-form string fields, in characters.
pub const MAX_FIELD_CHARS: usize = 255;

/// Truncate `value` to at most `max` characters, on a char boundary.
pub fn truncate_chars(value: &mut String, max: usize) {
    if let Some((idx, _)) = value.char_indices().nth(max) {
        value.truncate(idx);
    }
}

/// User agents are free text but must stay printable ASCII; control bytes
/// and non-ASCII are rejected.
pub fn valid_user_agent(value: &str) -> bool {
    printable_ascii(value)
}

/// User IDs are caller-chosen opaque identifiers; empty is allowed since the
/// field is optional.
pub fn valid_user_id(value: &str) -> bool {
    printable_ascii(value)
}

/// Host syntax: dot-separated labels of ASCII alphanumerics and hyphens, no
/// empty label, no label starting or ending with a hyphen. Empty passes;
/// not every integration reports a hostname.
pub fn valid_hostname(value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    value.split('.').all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    })
}

/// Path syntax: a non-empty path must be rooted at `/` and contain only
/// ASCII graphic characters (no spaces, no control bytes).
pub fn valid_path(value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    value.starts_with('/') && value.bytes().all(|b| b.is_ascii_graphic())
}

fn printable_ascii(value: &str) -> bool {
    value.bytes().all(|b| (0x20..=0x7e).contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Truncation ───────────────────────────────────────────────

    #[test]
    fn truncate_leaves_short_values_alone() {
        let mut s = "mozilla/5.0".to_string();
        truncate_chars(&mut s, MAX_FIELD_CHARS);
        assert_eq!(s, "mozilla/5.0");
    }

    #[test]
    fn truncate_cuts_to_exactly_max_chars() {
        let mut s = "x".repeat(300);
        truncate_chars(&mut s, MAX_FIELD_CHARS);
        assert_eq!(s.len(), 255);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        // 'é' is two bytes; a byte-oriented cut at 255 would split it
        let mut s = "é".repeat(200);
        truncate_chars(&mut s, MAX_FIELD_CHARS);
        assert_eq!(s.chars().count(), 200); // under the limit, untouched
        let mut s = "é".repeat(300);
        truncate_chars(&mut s, MAX_FIELD_CHARS);
        assert_eq!(s.chars().count(), 255);
    }

    // ── User agent / user id ─────────────────────────────────────

    #[test]
    fn ordinary_user_agent_passes() {
        assert!(valid_user_agent("Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101"));
        assert!(valid_user_agent(""));
    }

    #[test]
    fn user_agent_with_control_bytes_fails() {
        assert!(!valid_user_agent("curl/8.0\r\nX-Injected: 1"));
        assert!(!valid_user_agent("agent\x00"));
        assert!(!valid_user_agent("agent\t"));
    }

    #[test]
    fn non_ascii_user_agent_fails() {
        assert!(!valid_user_agent("навигатор/1.0"));
    }

    #[test]
    fn empty_user_id_passes() {
        assert!(valid_user_id(""));
        assert!(valid_user_id("customer-42"));
        assert!(!valid_user_id("id\n"));
    }

    // ── Hostname ─────────────────────────────────────────────────

    #[test]
    fn well_formed_hostnames_pass() {
        assert!(valid_hostname("api.example.com"));
        assert!(valid_hostname("localhost"));
        assert!(valid_hostname("my-service.internal"));
        assert!(valid_hostname(""));
    }

    #[test]
    fn malformed_hostnames_fail() {
        assert!(!valid_hostname("-leading.example.com"));
        assert!(!valid_hostname("example..com"));
        assert!(!valid_hostname(".example.com"));
        assert!(!valid_hostname("exa mple.com"));
        assert!(!valid_hostname("example.com/path"));
        assert!(!valid_hostname("bad-.com"));
    }

    // ── Path ─────────────────────────────────────────────────────

    #[test]
    fn well_formed_paths_pass() {
        assert!(valid_path("/"));
        assert!(valid_path("/api/v1/users"));
        assert!(valid_path("/search?q=rust&page=2"));
        assert!(valid_path(""));
    }

    #[test]
    fn malformed_paths_fail() {
        assert!(!valid_path("no-leading-slash"));
        assert!(!valid_path("/has space"));
        assert!(!valid_path("/ctrl\x07"));
    }
}

//! Parsers for the string shapes the fediverse hands back: ActivityPub
//! status URIs, profile/actor URLs, and `acct` handles.
//!
//! Instance origins are always canonicalized to `https://` + host, no port
//! normalization, no path, no trailing slash.

/// Canonical instance origin for a bare host.
pub fn origin(host: &str) -> String {
    format!("https://{host}")
}

fn https_parts(url: &str) -> Option<Vec<&str>> {
    let rest = url.strip_prefix("https://")?;
    Some(rest.split('/').collect())
}

/// `https://host/a/b` with exactly three path parts, the shape of seed
/// profile/actor URLs. Returns `(instance_url, a, b)`.
pub fn parse_profile_url(url: &str) -> Option<(String, String, String)> {
    let parts = https_parts(url)?;
    match parts.as_slice() {
        [host, a, b] => Some((origin(host), (*a).to_string(), (*b).to_string())),
        _ => None,
    }
}

/// `https://host/…/id` with at least three path parts. Returns the home
/// instance origin and the last path segment.
pub fn parse_toot_uri(uri: &str) -> Option<(String, String)> {
    let parts = https_parts(uri)?;
    if parts.len() < 3 {
        return None;
    }
    Some((origin(parts[0]), parts[parts.len() - 1].to_string()))
}

/// Splits an `acct` field into the home-relative handle and the host part,
/// if any: `bob@example.org` → `("@bob", Some("example.org"))`, `bob` →
/// `("@bob", None)`.
pub fn split_acct(acct: &str) -> (String, Option<String>) {
    let parts: Vec<&str> = acct.split('@').collect();
    let host = match parts.as_slice() {
        [_, host] if !host.is_empty() => Some((*host).to_string()),
        _ => None,
    };
    (format!("@{}", parts[0]), host)
}

/// Mastodon status ids are decimal; Pleroma flake ids mix hex digits and
/// hyphens.
pub fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_url_needs_exactly_three_parts() {
        assert_eq!(
            parse_profile_url("https://mastodon.social/@alice/109348572"),
            Some((
                "https://mastodon.social".to_string(),
                "@alice".to_string(),
                "109348572".to_string()
            ))
        );
        assert_eq!(parse_profile_url("https://mastodon.social/@alice"), None);
        assert_eq!(parse_profile_url("https://a.example/x/y/z"), None);
        assert_eq!(parse_profile_url("http://a.example/x/y"), None);
    }

    #[test]
    fn toot_uri_takes_last_segment() {
        assert_eq!(
            parse_toot_uri("https://b.example/users/bob/statuses/42"),
            Some(("https://b.example".to_string(), "42".to_string()))
        );
        assert_eq!(
            parse_toot_uri("https://a.example/x/activity"),
            Some(("https://a.example".to_string(), "activity".to_string()))
        );
        assert_eq!(parse_toot_uri("https://a.example/x"), None);
        assert_eq!(parse_toot_uri("ftp://a.example/x/y/z"), None);
    }

    #[test]
    fn acct_splits_on_at() {
        assert_eq!(split_acct("bob"), ("@bob".to_string(), None));
        assert_eq!(
            split_acct("bob@b.example"),
            ("@bob".to_string(), Some("b.example".to_string()))
        );
        // More than one @ is malformed; fall back to the local instance.
        assert_eq!(split_acct("a@b@c"), ("@a".to_string(), None));
        assert_eq!(split_acct("bob@"), ("@bob".to_string(), None));
    }

    #[test]
    fn digit_check() {
        assert!(is_all_digits("109348572"));
        assert!(!is_all_digits(""));
        assert!(!is_all_digits("AbC-123-xyz"));
        assert!(!is_all_digits("42a"));
    }
}

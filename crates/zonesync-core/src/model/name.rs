//! Domain name canonicalisation
//!
//! Every name the core compares is lower-cased and absolute (trailing dot),
//! so provider formatting differences never show up as diffs.

/// Canonical absolute form of `name`: lower-cased with a trailing dot.
///
/// The root (`""` or `"."`) stays `"."`.
pub fn fqdn(name: &str) -> String {
    let trimmed = name.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        return ".".to_string();
    }
    format!("{}.", trimmed.to_ascii_lowercase())
}

/// Qualify a configuration name against `zone`.
///
/// - `@` or an empty name is the zone apex
/// - a name ending in `.` is already absolute
/// - anything else is relative to the zone
pub fn qualify(name: &str, zone: &str) -> String {
    let name = name.trim();
    if name.is_empty() || name == "@" {
        return fqdn(zone);
    }
    if name.ends_with('.') {
        return fqdn(name);
    }
    let zone = fqdn(zone);
    if zone == "." {
        return fqdn(name);
    }
    format!("{}.{}", name.to_ascii_lowercase(), zone)
}

/// Strip the trailing dot for APIs that expect relative-looking FQDNs.
pub fn without_dot(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

/// Whether `name` lies inside `zone` (both in any form).
pub fn in_zone(name: &str, zone: &str) -> bool {
    let name = fqdn(name);
    let zone = fqdn(zone);
    zone == "." || name == zone || name.ends_with(&format!(".{zone}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fqdn() {
        assert_eq!(fqdn("WWW.Example.com"), "www.example.com.");
        assert_eq!(fqdn("www.example.com."), "www.example.com.");
        assert_eq!(fqdn(" mx1.example.com "), "mx1.example.com.");
        assert_eq!(fqdn(""), ".");
        assert_eq!(fqdn("."), ".");
    }

    #[test]
    fn test_qualify() {
        assert_eq!(qualify("@", "example.com"), "example.com.");
        assert_eq!(qualify("", "example.com."), "example.com.");
        assert_eq!(qualify("www", "example.com"), "www.example.com.");
        assert_eq!(qualify("WWW", "Example.COM"), "www.example.com.");
        assert_eq!(qualify("target.other.org.", "example.com"), "target.other.org.");
    }

    #[test]
    fn test_without_dot() {
        assert_eq!(without_dot("www.example.com."), "www.example.com");
        assert_eq!(without_dot("www.example.com"), "www.example.com");
    }

    #[test]
    fn test_in_zone() {
        assert!(in_zone("www.example.com.", "example.com"));
        assert!(in_zone("example.com", "example.com."));
        assert!(!in_zone("www.badexample.com", "example.com"));
        assert!(!in_zone("example.org", "example.com"));
    }
}

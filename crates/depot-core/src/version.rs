//! Simplified dotted version values.
//!
//! Package indexes list versions as free-form strings. For range filtering we
//! only need a total order over the numeric `major.minor.patch` prefix, so
//! anything trailing the digit groups (pre-release or build tags such as
//! `a1`, `rc2`, `.post1`) is carried opaquely and deliberately ignored by
//! comparisons: `1.2.3a1` and `1.2.3` are the same point on the line.

use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;

static VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    // Up to three dot-separated groups of 1-9 digits; the remainder is the
    // modifier, captured verbatim.
    Regex::new(r"^(\d{1,9})(?:\.(\d{1,9}))?(?:\.(\d{1,9}))?(.*)$").expect("version regex")
});

/// A parsed version: numeric triple plus an opaque trailing modifier.
///
/// Missing minor/patch groups default to 0, so `1.2` parses as `1.2.0`.
/// Ordering and equality consider only the triple.
///
/// # Examples
///
/// ```
/// use depot_core::Version;
///
/// let v = Version::parse("1.2.3a1").unwrap();
/// assert_eq!((v.major, v.minor, v.patch), (1, 2, 3));
/// assert_eq!(v.modifier, "a1");
/// assert_eq!(v, Version::parse("1.2.3").unwrap());
/// assert!(Version::parse("not-a-version").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    /// Trailing non-numeric text (pre-release/build tag), kept for display
    /// only.
    pub modifier: String,
}

impl Version {
    /// Parses a dotted version string.
    ///
    /// Returns `None` when the string does not begin with a digit group.
    /// This is the supported mechanism for silently skipping malformed
    /// version strings returned by the index (placeholder or legacy
    /// entries), so it is an `Option`, not a `Result`.
    pub fn parse(s: &str) -> Option<Self> {
        let caps = VERSION_RE.captures(s)?;

        let group = |i: usize| -> u32 {
            caps.get(i)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0)
        };

        Some(Self {
            major: group(1),
            minor: group(2),
            patch: group(3),
            modifier: caps.get(4).map(|m| m.as_str().to_string()).unwrap_or_default(),
        })
    }

    fn triple(&self) -> (u32, u32, u32) {
        (self.major, self.minor, self.patch)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.triple() == other.triple()
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.triple().cmp(&other.triple())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}{}",
            self.major, self.minor, self.patch, self.modifier
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_triple() {
        let v = Version::parse("1.2.3").unwrap();
        assert_eq!((v.major, v.minor, v.patch), (1, 2, 3));
        assert!(v.modifier.is_empty());
    }

    #[test]
    fn test_parse_defaults_missing_groups() {
        let v = Version::parse("2").unwrap();
        assert_eq!((v.major, v.minor, v.patch), (2, 0, 0));

        let v = Version::parse("1.5").unwrap();
        assert_eq!((v.major, v.minor, v.patch), (1, 5, 0));
    }

    #[test]
    fn test_parse_captures_modifier() {
        let v = Version::parse("1.2.3a1").unwrap();
        assert_eq!(v.modifier, "a1");

        let v = Version::parse("4.0.0rc2").unwrap();
        assert_eq!(v.modifier, "rc2");

        // A fourth numeric group is not part of the triple.
        let v = Version::parse("1.2.3.4").unwrap();
        assert_eq!((v.major, v.minor, v.patch), (1, 2, 3));
        assert_eq!(v.modifier, ".4");
    }

    #[test]
    fn test_parse_rejects_non_numeric_start() {
        assert!(Version::parse("not-a-version").is_none());
        assert!(Version::parse("").is_none());
        assert!(Version::parse("v1.0.0").is_none());
    }

    #[test]
    fn test_modifier_ignored_by_comparison() {
        let plain = Version::parse("1.2.3").unwrap();
        let alpha = Version::parse("1.2.3a1").unwrap();
        assert_eq!(plain, alpha);
        assert_eq!(plain.cmp(&alpha), Ordering::Equal);
    }

    #[test]
    fn test_ordering() {
        let a = Version::parse("1.0.0").unwrap();
        let b = Version::parse("1.5.0").unwrap();
        let c = Version::parse("2.0.0").unwrap();
        assert!(a < b);
        assert!(b < c);
        assert!(c > a);

        // Missing groups compare as zero, no panic.
        assert!(Version::parse("1").unwrap() < Version::parse("1.0.1").unwrap());
    }

    #[test]
    fn test_display_keeps_modifier() {
        assert_eq!(Version::parse("1.2.3b2").unwrap().to_string(), "1.2.3b2");
        assert_eq!(Version::parse("1.2").unwrap().to_string(), "1.2.0");
    }
}

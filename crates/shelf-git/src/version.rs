//! Numeric tag versions.
//!
//! Tags look like `v<major>.<minor>` and are ordered by their numeric value,
//! so `v10.0` sorts after `v2.0`.

/// Parse the numeric part of a tag, e.g. `"v2.3"` becomes `2.3`.
///
/// A single leading non-digit character is stripped. Returns `None` when
/// the rest is not a finite number.
pub fn parse_tag_version(tag: &str) -> Option<f64> {
    let tag = tag.trim();
    let numeric = match tag.chars().next() {
        Some(c) if !c.is_ascii_digit() => &tag[c.len_utf8()..],
        _ => tag,
    };
    numeric.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_not_lexicographic() {
        assert!(parse_tag_version("v1.0") < parse_tag_version("v2.0"));
        assert!(parse_tag_version("v10.0") > parse_tag_version("v2.0"));
    }

    #[test]
    fn minor_component_is_fractional() {
        assert_eq!(parse_tag_version("v2.3"), Some(2.3));
    }

    #[test]
    fn only_one_prefix_character_is_stripped() {
        assert_eq!(parse_tag_version("v.5"), Some(0.5));
        assert_eq!(parse_tag_version("3.0"), Some(3.0));
        assert_eq!(parse_tag_version("rev2.0"), None);
    }

    #[test]
    fn garbage_is_none() {
        assert_eq!(parse_tag_version("latest"), None);
        assert_eq!(parse_tag_version(""), None);
        assert_eq!(parse_tag_version("v"), None);
    }
}

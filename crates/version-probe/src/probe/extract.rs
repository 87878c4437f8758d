//! Version token extraction from free-form command output.

use std::sync::LazyLock;

use regex_lite::Regex;

use super::types::VersionLabel;

static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+\.\d+").expect("version pattern is valid"));

/// Return the left-most `digits.digits.digits` token, or `unknown`.
///
/// No plausibility check is made: a date such as `2024.01.01` is as good a
/// match as `3.2.1`, and suffixes like `-rc1` are not captured.
pub fn extract_version(output: Option<&str>) -> VersionLabel {
    let Some(output) = output.filter(|o| !o.is_empty()) else {
        return VersionLabel::unknown();
    };

    VERSION_PATTERN
        .find(output)
        .map(|m| VersionLabel::matched(m.as_str()))
        .unwrap_or_else(VersionLabel::unknown)
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn plain_version_line() {
        assert_eq!(extract_version(Some("cinder-api 21.4.0\n")).as_str(), "21.4.0");
    }

    #[test]
    fn empty_or_missing_output() {
        assert!(extract_version(Some("")).is_unknown());
        assert!(extract_version(None).is_unknown());
    }

    #[test]
    fn shell_error_text() {
        assert!(extract_version(Some("sh: 1: cinder-api: command not found")).is_unknown());
        assert!(extract_version(Some("command not found")).is_unknown());
    }

    #[test]
    fn first_match_wins_even_if_date_like() {
        assert_eq!(
            extract_version(Some("built on 2024.01.01 using 3.2.1")).as_str(),
            "2024.01.01"
        );
    }

    #[test]
    fn only_core_triple_is_captured() {
        assert_eq!(extract_version(Some("HA-Proxy version 2.8.3-1ubuntu1 2023/09/06")).as_str(), "2.8.3");
        assert_eq!(extract_version(Some("v1.2.3.4")).as_str(), "1.2.3");
        assert_eq!(extract_version(Some("Version: 23.1.0rc1")).as_str(), "23.1.0");
    }

    #[test]
    fn two_component_versions_do_not_match() {
        assert!(extract_version(Some("memcached 1.6")).is_unknown());
    }

    #[test]
    fn multiline_pip_output() {
        let output = "Name: horizon\nVersion: 23.1.0\nSummary: OpenStack Dashboard\n";
        assert_eq!(extract_version(Some(output)).as_str(), "23.1.0");
    }
}

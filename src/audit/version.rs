use regex::Regex;
use serde::Serialize;
use serde::Serializer;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

/// Dotted four-part numeric token, e.g. `2.10.0.1`.
static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+\.\d+\.\d+\.\d+\b").expect("Hardcode regex pattern"));

/// A four-part version token, ordered by its numeric components.
///
/// The original text is kept so zero-padded forms such as `1.02.0.0` survive renumbering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionToken {
    text: String,
    parts: [u64; 4],
}

impl VersionToken {
    /// Parses `a.b.c.d`; returns `None` when the text is not four integers that fit in `u64`.
    pub fn parse(text: &str) -> Option<VersionToken> {
        let mut parts = [0u64; 4];
        let mut pieces = text.split('.');
        for part in parts.iter_mut() {
            *part = pieces.next()?.parse().ok()?;
        }
        if pieces.next().is_some() {
            return None;
        }
        Some(VersionToken {
            text: text.to_owned(),
            parts,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn parts(&self) -> [u64; 4] {
        self.parts
    }
}

impl Ord for VersionToken {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parts
            .cmp(&other.parts)
            .then_with(|| self.text.cmp(&other.text))
    }
}

impl PartialOrd for VersionToken {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for VersionToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

/// Finds every distinct version token in `text`, sorted by numeric components.
pub fn extract_versions(text: &str) -> Vec<VersionToken> {
    let mut tokens = BTreeSet::new();
    for matched in VERSION_PATTERN.find_iter(text) {
        match VersionToken::parse(matched.as_str()) {
            Some(token) => {
                tokens.insert(token);
            }
            None => tracing::warn!(token = matched.as_str(), "skipping version token that does not fit in 64-bit components"),
        }
    }
    tokens.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[VersionToken]) -> Vec<&str> {
        tokens.iter().map(VersionToken::as_str).collect()
    }

    #[test]
    fn test_numeric_ordering() {
        let tokens = extract_versions("see 2.10.0.1 then 2.9.0.1 and 10.0.0.0, finally 2.9.0.1 again");
        assert_eq!(texts(&tokens), vec!["2.9.0.1", "2.10.0.1", "10.0.0.0"]);
    }

    #[test]
    fn test_padding_is_preserved() {
        let tokens = extract_versions("1.02.0.0 1.2.0.0 1.1.9.9");
        assert_eq!(texts(&tokens), vec!["1.1.9.9", "1.02.0.0", "1.2.0.0"]);
        assert_eq!(tokens[1].parts(), tokens[2].parts());
    }

    #[test]
    fn test_word_boundaries() {
        let tokens = extract_versions("Step1.2.3.4 x 1.2.3 (4.5.6.7)\n8.8.8.8");
        assert_eq!(texts(&tokens), vec!["4.5.6.7", "8.8.8.8"]);
    }

    #[test]
    fn test_no_matches() {
        assert!(extract_versions("no versions here 1.2").is_empty());
    }

    #[test]
    fn test_overflowing_component_is_skipped() {
        let tokens = extract_versions("1.0.0.99999999999999999999999 1.0.0.1");
        assert_eq!(texts(&tokens), vec!["1.0.0.1"]);
    }

    #[test]
    fn test_parse() {
        assert_eq!(VersionToken::parse("1.2.3.4").map(|token| token.parts()), Some([1, 2, 3, 4]));
        assert!(VersionToken::parse("1.2.3").is_none());
        assert!(VersionToken::parse("1.2.3.4.5").is_none());
        assert!(VersionToken::parse("1.a.3.4").is_none());
    }
}

//! Record identifiers
//!
//! Provides [`RecordId`], the canonical dashless form of the service's
//! UUID-shaped identifiers.

use crate::error::RecordError;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Number of hex digits in a canonical ID
pub const ID_LEN: usize = 32;

/// A record identifier in canonical form
///
/// Always 32 lowercase hex digits without dashes. The service hands out
/// both `246e2166-e2d6-4396-82b5-559c723f57f9` and
/// `246e2166e2d6439682b5559c723f57f9`; both parse to the same `RecordId`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(String);

impl RecordId {
    /// Parse an ID in dashed, dashless or mixed-case form
    ///
    /// # Errors
    /// Returns [`RecordError::InvalidId`] unless the input holds exactly
    /// 32 hex digits once dashes are removed.
    pub fn parse(s: &str) -> Result<Self, RecordError> {
        let canonical: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();

        if canonical.len() != ID_LEN || !canonical.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(RecordError::InvalidId(s.to_string()));
        }
        Ok(Self(canonical))
    }

    /// Extract the ID from a page URL
    ///
    /// Page URLs end in `Some-Title-<32 hex digits>`, optionally followed by
    /// a query string or fragment. A bare ID is accepted too.
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let last = path.trim_end_matches('/').rsplit('/').next()?;

        if let Ok(id) = Self::parse(last) {
            return Some(id);
        }
        if last.len() < ID_LEN {
            return None;
        }
        let tail = last.get(last.len() - ID_LEN..)?;
        let id = Self::parse(tail).ok()?;
        // the tail must be separated from the title
        let head = &last[..last.len() - ID_LEN];
        (head.is_empty() || head.ends_with('-')).then_some(id)
    }

    /// Canonical dashless form
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Dashed 8-4-4-4-12 form, as the API expects in request bodies
    #[must_use]
    pub fn to_dashed(&self) -> String {
        let s = &self.0;
        format!(
            "{}-{}-{}-{}-{}",
            &s[0..8],
            &s[8..12],
            &s[12..16],
            &s[16..20],
            &s[20..32]
        )
    }

    /// First eight digits, for log lines
    #[inline]
    #[must_use]
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RecordId {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for RecordId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DASHED: &str = "246e2166-e2d6-4396-82b5-559c723f57f9";
    const PLAIN: &str = "246e2166e2d6439682b5559c723f57f9";

    #[test]
    fn parse_normalizes_dashes_and_case() {
        let a = RecordId::parse(DASHED).unwrap();
        let b = RecordId::parse(PLAIN).unwrap();
        let c = RecordId::parse(&PLAIN.to_uppercase()).unwrap();

        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.as_str(), PLAIN);
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(RecordId::parse("").is_err());
        assert!(RecordId::parse("246e2166").is_err());
        assert!(RecordId::parse("zz6e2166e2d6439682b5559c723f57f9").is_err());
        assert!(RecordId::parse("246e2166e2d6439682b5559c723f57f900").is_err());
    }

    #[test]
    fn dashed_form() {
        let id = RecordId::parse(PLAIN).unwrap();
        assert_eq!(id.to_dashed(), DASHED);
        assert_eq!(RecordId::parse(&id.to_dashed()).unwrap(), id);
    }

    #[test]
    fn from_url_variants() {
        let expected = RecordId::parse(PLAIN).unwrap();

        let urls = [
            format!("https://www.notion.so/Some-Page-Title-{PLAIN}"),
            format!("https://www.notion.so/{PLAIN}"),
            format!("https://www.notion.so/team/Title-{PLAIN}?v=abc#frag"),
            format!("/previewhtml/{PLAIN}"),
            PLAIN.to_string(),
            DASHED.to_string(),
        ];
        for url in &urls {
            assert_eq!(RecordId::from_url(url).as_ref(), Some(&expected), "{url}");
        }

        assert!(RecordId::from_url("https://www.notion.so/Just-A-Title").is_none());
        assert!(RecordId::from_url(&format!("https://x/Title{PLAIN}")).is_none());
    }

    #[test]
    fn serde_uses_canonical_form() {
        let id: RecordId = serde_json::from_str(&format!("\"{DASHED}\"")).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), format!("\"{PLAIN}\""));

        let bad: Result<RecordId, _> = serde_json::from_str("\"nope\"");
        assert!(bad.is_err());
    }
}

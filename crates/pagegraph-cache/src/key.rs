//! Cache keys
//!
//! A [`CacheKey`] is the Blake3 digest of the route and the serialized
//! request body. Object keys are sorted before hashing, so equal bodies hash
//! equal whatever order their fields were built in.

use serde_json::{Map, Value};
use std::fmt::{self, Display, Formatter};

/// Stable identifier for one (route, body) pair
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Compute the key for a request
    ///
    /// # Errors
    /// Returns error if the body cannot be serialized
    pub fn compute(route: &str, body: &Value) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(&canonical(body))?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(route.as_bytes());
        // separator keeps ("ab", "c") and ("a", "bc") apart
        hasher.update(&[0]);
        hasher.update(&body);
        Ok(Self(hex::encode(hasher.finalize().as_bytes())))
    }

    /// Hex digest
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name used by the disk store
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.json", self.0)
    }

    /// Short form for log lines (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> &str {
        &self.0[..16]
    }
}

/// Copy of `value` with every object's keys in sorted order
fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(object) => {
            let mut entries: Vec<_> = object.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), canonical(v)))
                    .collect::<Map<_, _>>(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

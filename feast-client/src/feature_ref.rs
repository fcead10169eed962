//! # Feature References
//!
//! Parsing of the `table:feature` strings callers use to name servable features.
use crate::proto::FeatureReferenceV2;
use std::fmt;

/// A parsed feature reference.
///
/// The table portion is optional: a reference without a `:` names the feature only and
/// leaves `table` empty, letting the server resolve it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FeatureReference {
    pub table: String,
    pub feature: String,
}

impl FeatureReference {
    /// Splits a reference on its first `:`.
    ///
    /// No other validation is performed: malformed references are forwarded to the
    /// server as they are and rejected there.
    pub fn parse(reference: &str) -> Self {
        match reference.split_once(':') {
            Some((table, feature)) => Self {
                table: table.to_string(),
                feature: feature.to_string(),
            },
            None => Self {
                table: String::new(),
                feature: reference.to_string(),
            },
        }
    }
}

impl fmt::Display for FeatureReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.table.is_empty() {
            write!(f, "{}", self.feature)
        } else {
            write!(f, "{}:{}", self.table, self.feature)
        }
    }
}

impl From<&str> for FeatureReference {
    fn from(reference: &str) -> Self {
        Self::parse(reference)
    }
}

impl From<FeatureReference> for FeatureReferenceV2 {
    fn from(reference: FeatureReference) -> Self {
        FeatureReferenceV2 {
            feature_table: reference.table,
            name: reference.feature,
        }
    }
}

/// Builds the wire references for a request, preserving order.
pub(crate) fn create_feature_refs<R: AsRef<str>>(references: &[R]) -> Vec<FeatureReferenceV2> {
    references
        .iter()
        .map(|r| FeatureReference::parse(r.as_ref()).into())
        .collect()
}

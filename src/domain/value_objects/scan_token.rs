use serde::{Deserialize, Serialize};
use std::fmt;

/// A resolved barcode string emitted by the input disambiguator.
///
/// Source-agnostic: hardware scanner bursts, camera decodes and manual
/// submit buttons all produce the same token type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanToken(String);

impl ScanToken {
    pub fn new(value: String) -> Result<Self, String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err("Scan token cannot be empty".to_string());
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ScanToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ScanToken> for String {
    fn from(token: ScanToken) -> Self {
        token.0
    }
}

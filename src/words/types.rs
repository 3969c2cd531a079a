use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Point-in-time copy of the frequency table.
///
/// This is both the body of `GET /words` and the content of the seed file:
/// `{"wordvalues": {"word": count, ...}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordValues {
    #[serde(rename = "wordvalues", default)]
    pub words: BTreeMap<String, u64>,
}

impl WordValues {
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

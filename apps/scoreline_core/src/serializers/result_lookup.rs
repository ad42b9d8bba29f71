use serde::{Deserialize, Serialize};

use crate::records::CanonicalRecord;

#[derive(Debug, Serialize, Deserialize)]
pub struct ResultOut {
    pub result: Vec<CanonicalRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    /// Raw error message, only present on 500 responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

use serde::{Deserialize, Serialize};

/// A document that can be downloaded and imported.
///
/// Identifiers are opaque and passed through unvalidated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    #[serde(rename = "downloadURL")]
    pub download_url: String,
    #[serde(rename = "documentID")]
    pub document_id: String,
    #[serde(rename = "categoryID")]
    pub category_id: String,
    #[serde(rename = "patientID")]
    pub patient_id: String,
}

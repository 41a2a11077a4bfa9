//! Typed view of catalog payloads.
//!
//! Every struct keeps the JSON fields it does not model in `extra`, so an
//! entry written back to the ledger is the payload the catalog served.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{CatalogError, Result};

/// Catalog identifier. Numeric on the wire today; strings are accepted and
/// written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Number(u64),
    Text(String),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Number(n) => write!(f, "{n}"),
            Identifier::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for Identifier {
    fn from(n: u64) -> Self { Identifier::Number(n) }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self { Identifier::Text(s.to_string()) }
}

/// Catalog category of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModelType {
    Checkpoint,
    Lora,
    TextualInversion,
    Hypernetwork,
    AestheticGradient,
    ControlNet,
    Poses,
    /// A category this build does not know about, kept verbatim.
    Other(String),
}

impl ModelType {
    /// Every category the listing endpoint can filter on.
    pub const ALL: [ModelType; 7] = [
        ModelType::Checkpoint,
        ModelType::Lora,
        ModelType::TextualInversion,
        ModelType::Hypernetwork,
        ModelType::AestheticGradient,
        ModelType::ControlNet,
        ModelType::Poses,
    ];

    /// Wire name, as used by the `types` filter and the `type` field.
    pub fn as_str(&self) -> &str {
        match self {
            ModelType::Checkpoint => "Checkpoint",
            ModelType::Lora => "LORA",
            ModelType::TextualInversion => "TextualInversion",
            ModelType::Hypernetwork => "Hypernetwork",
            ModelType::AestheticGradient => "AestheticGradient",
            ModelType::ControlNet => "Controlnet",
            ModelType::Poses => "Poses",
            ModelType::Other(s) => s,
        }
    }

    /// Whether versions of this category ship the same weights in several
    /// large encodings, making variant selection worthwhile.
    pub fn has_redundant_variants(&self) -> bool { matches!(self, ModelType::Checkpoint) }
}

impl From<String> for ModelType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Checkpoint" => ModelType::Checkpoint,
            "LORA" => ModelType::Lora,
            "TextualInversion" => ModelType::TextualInversion,
            "Hypernetwork" => ModelType::Hypernetwork,
            "AestheticGradient" => ModelType::AestheticGradient,
            "Controlnet" => ModelType::ControlNet,
            "Poses" => ModelType::Poses,
            _ => ModelType::Other(s),
        }
    }
}

impl From<ModelType> for String {
    fn from(t: ModelType) -> Self {
        match t {
            ModelType::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Serialization format of a weights file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FileFormat {
    SafeTensor,
    PickleTensor,
    Other,
    /// Any other declared format (`Diffusers`, `ONNX`, ...).
    Unlisted(String),
}

impl From<String> for FileFormat {
    fn from(s: String) -> Self {
        match s.as_str() {
            "SafeTensor" => FileFormat::SafeTensor,
            "PickleTensor" => FileFormat::PickleTensor,
            "Other" => FileFormat::Other,
            _ => FileFormat::Unlisted(s),
        }
    }
}

impl From<FileFormat> for String {
    fn from(f: FileFormat) -> Self {
        match f {
            FileFormat::SafeTensor => "SafeTensor".to_string(),
            FileFormat::PickleTensor => "PickleTensor".to_string(),
            FileFormat::Other => "Other".to_string(),
            FileFormat::Unlisted(s) => s,
        }
    }
}

/// Whether a weights file carries the full training state or a pruned copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SizeClass {
    Full,
    Pruned,
    Unlisted(String),
}

impl From<String> for SizeClass {
    fn from(s: String) -> Self {
        match s.as_str() {
            "full" => SizeClass::Full,
            "pruned" => SizeClass::Pruned,
            _ => SizeClass::Unlisted(s),
        }
    }
}

impl From<SizeClass> for String {
    fn from(s: SizeClass) -> Self {
        match s {
            SizeClass::Full => "full".to_string(),
            SizeClass::Pruned => "pruned".to_string(),
            SizeClass::Unlisted(s) => s,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<FileFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size:   Option<SizeClass>,
    #[serde(flatten)]
    pub extra:  Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub name:         String,
    pub download_url: String,
    /// Declared size in kilobytes.
    #[serde(rename = "sizeKB", default)]
    pub size_kb:      f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hashes:       BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata:     Option<FileMetadata>,
    #[serde(flatten)]
    pub extra:        Map<String, Value>,
}

impl FileDescriptor {
    pub fn format(&self) -> Option<&FileFormat> {
        self.metadata.as_ref().and_then(|m| m.format.as_ref())
    }

    pub fn size_class(&self) -> Option<&SizeClass> {
        self.metadata.as_ref().and_then(|m| m.size.as_ref())
    }

    /// Unspecified and unlisted sizes count as not full.
    pub fn is_full(&self) -> bool { matches!(self.size_class(), Some(SizeClass::Full)) }

    pub fn sha256(&self) -> Option<&str> {
        self.hashes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("SHA256"))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id:         Identifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name:       Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub files:      Vec<FileDescriptor>,
    #[serde(flatten)]
    pub extra:      Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id:         Identifier,
    pub name:       String,
    #[serde(rename = "type")]
    pub model_type: ModelType,
    #[serde(rename = "modelVersions", default, deserialize_with = "null_as_default")]
    pub versions:   Vec<Version>,
    #[serde(flatten)]
    pub extra:      Map<String, Value>,
}

impl CatalogEntry {
    pub fn from_value(value: Value) -> Result<Self> {
        let hint = value
            .get("id")
            .map(|id| format!("catalog entry {id}"))
            .unwrap_or_else(|| "catalog entry without id".to_string());
        serde_json::from_value(value).map_err(|e| CatalogError::data_shape(hint, e))
    }

    /// Version with the greatest creation time; the earliest listed wins a tie.
    pub fn latest_version(&self) -> Option<&Version> {
        let mut versions = self.versions.iter();
        let first = versions.next()?;
        Some(versions.fold(first, |latest, candidate| {
            if candidate.created_at > latest.created_at { candidate } else { latest }
        }))
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn entry(value: Value) -> CatalogEntry { CatalogEntry::from_value(value).unwrap() }

    #[test]
    fn latest_version_by_creation_time() {
        let e = entry(json!({
            "id": 7,
            "name": "Model",
            "type": "Checkpoint",
            "modelVersions": [
                {"id": "a", "createdAt": "2023-01-01T00:00:00Z", "files": []},
                {"id": "b", "createdAt": "2023-06-01T00:00:00Z", "files": []}
            ]
        }));
        assert_eq!(e.latest_version().unwrap().id, Identifier::from("b"));
    }

    #[test]
    fn latest_version_tie_keeps_first_listed() {
        let e = entry(json!({
            "id": 7,
            "name": "Model",
            "type": "LORA",
            "modelVersions": [
                {"id": 1, "createdAt": "2023-01-01T00:00:00.000Z"},
                {"id": 2, "createdAt": "2023-06-01T00:00:00.000Z"},
                {"id": 3, "createdAt": "2023-06-01T00:00:00.000Z"}
            ]
        }));
        assert_eq!(e.latest_version().unwrap().id, Identifier::Number(2));
    }

    #[test]
    fn no_versions_has_no_latest() {
        let e = entry(json!({"id": 1, "name": "Empty", "type": "Poses", "modelVersions": []}));
        assert!(e.latest_version().is_none());
        let e = entry(json!({"id": 1, "name": "Null", "type": "Poses", "modelVersions": null}));
        assert!(e.versions.is_empty());
    }

    #[test]
    fn wire_names_of_types() {
        let e = entry(json!({"id": 1, "name": "x", "type": "Controlnet"}));
        assert_eq!(e.model_type, ModelType::ControlNet);
        let e = entry(json!({"id": 1, "name": "x", "type": "LoCon"}));
        assert_eq!(e.model_type, ModelType::Other("LoCon".into()));
        assert_eq!(serde_json::to_value(&e.model_type).unwrap(), json!("LoCon"));
        assert_eq!(serde_json::to_value(ModelType::Lora).unwrap(), json!("LORA"));
    }

    #[test]
    fn file_descriptor_fields() {
        let file: FileDescriptor = serde_json::from_value(json!({
            "name": "model.safetensors",
            "downloadUrl": "https://files.example/1",
            "sizeKB": 2048.5,
            "hashes": {"SHA256": "ABCD", "AutoV2": "12"},
            "metadata": {"format": "SafeTensor", "size": "full", "fp": "fp16"},
            "primary": true
        }))
        .unwrap();
        assert_eq!(file.format(), Some(&FileFormat::SafeTensor));
        assert!(file.is_full());
        assert_eq!(file.sha256(), Some("ABCD"));
        assert_eq!(file.extra.get("primary"), Some(&json!(true)));
        assert_eq!(
            file.metadata.as_ref().unwrap().extra.get("fp"),
            Some(&json!("fp16"))
        );
    }

    #[test]
    fn missing_metadata_is_unspecified() {
        let file: FileDescriptor = serde_json::from_value(json!({
            "name": "notes.txt",
            "downloadUrl": "https://files.example/2",
            "hashes": null
        }))
        .unwrap();
        assert_eq!(file.format(), None);
        assert!(!file.is_full());
        assert_eq!(file.sha256(), None);
    }

    #[test]
    fn unknown_fields_survive_roundtrip() {
        let value = json!({
            "id": 11,
            "name": "Model",
            "type": "Checkpoint",
            "nsfw": false,
            "tags": ["a"],
            "modelVersions": [{
                "id": 12,
                "createdAt": "2023-06-01T00:00:00Z",
                "baseModel": "SD 1.5",
                "files": [{
                    "name": "m.ckpt",
                    "downloadUrl": "https://files.example/3",
                    "sizeKB": 1.0,
                    "hashes": {},
                    "metadata": {"format": "Diffusers"}
                }]
            }]
        });
        let e = entry(value);
        let back = serde_json::to_value(&e).unwrap();
        assert_eq!(back["nsfw"], json!(false));
        assert_eq!(back["modelVersions"][0]["baseModel"], json!("SD 1.5"));
        assert_eq!(back["modelVersions"][0]["files"][0]["metadata"]["format"], json!("Diffusers"));
        assert_eq!(
            e.versions[0].files[0].format(),
            Some(&FileFormat::Unlisted("Diffusers".into()))
        );
    }

    #[test]
    fn malformed_entry_is_data_shape() {
        let err = CatalogEntry::from_value(json!({"id": 5, "name": "x", "type": "LORA",
            "modelVersions": [{"id": 1}]}))
        .unwrap_err();
        match err {
            CatalogError::DataShape { context, .. } => assert_eq!(context, "catalog entry 5"),
            other => panic!("expected DataShape, got {other:?}"),
        }
    }
}

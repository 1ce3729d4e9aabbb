use docshift_convert::Summary;
use docshift_storage::{Census, FileEntry};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub libreoffice_available: bool,
    pub raw_dir_exists: bool,
    pub prepared_dir_exists: bool,
}

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub success: bool,
    pub message: String,
    pub stats: Summary,
}
impl From<Summary> for ConvertResponse {
    fn from(stats: Summary) -> Self {
        let message = if stats.is_clean() {
            "Conversion completed successfully".to_string()
        } else {
            format!("Completed with errors: {}", stats.failed())
        };
        Self { success: stats.is_clean(), message, stats }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub recursive: bool,
}

/// Accepts the spellings HTTP clients commonly use for booleans in query
/// strings (`1`, `yes`, `on`, ...), case-insensitively.
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = String::deserialize(deserializer)?;
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        _ => Err(D::Error::custom(format!("invalid boolean for `recursive`: {value:?}"))),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub relative_path: String,
    pub size_bytes: u64,
    pub modified_timestamp: f64,
    pub modified_human: Option<String>,
}
impl From<&FileEntry> for FileInfo {
    fn from(entry: &FileEntry) -> Self {
        Self {
            name: entry.name.clone(),
            relative_path: entry.path.display().to_string(),
            size_bytes: entry.size,
            modified_timestamp: entry.modified_timestamp(),
            modified_human: entry.modified_human(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FileListResponse {
    /// Name of the listed directory (`raw` or `prepared`).
    pub path: String,
    pub files: Vec<FileInfo>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DirStats {
    /// Absolute path of the directory on disk.
    pub path: String,
    pub total: u64,
    pub extensions: BTreeSet<String>,
}
impl DirStats {
    pub fn new(path: String, census: Census) -> Self {
        Self { path, total: census.total, extensions: census.extensions }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub raw_data: DirStats,
    pub prepared_data: DirStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(query: &str) -> Result<ListQuery, serde_json::Error> {
        serde_json::from_value(serde_json::json!({ "recursive": query }))
    }

    #[test]
    fn test_lenient_bool() {
        for truthy in ["true", "TRUE", "1", "yes", "On", "y", "t"] {
            assert!(parse(truthy).unwrap().recursive, "{truthy}");
        }
        for falsy in ["false", "0", "no", "OFF", "n", "f"] {
            assert!(!parse(falsy).unwrap().recursive, "{falsy}");
        }
        assert!(parse("maybe").is_err());
        assert!(!serde_json::from_value::<ListQuery>(serde_json::json!({})).unwrap().recursive);
    }
}

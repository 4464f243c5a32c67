use serde::{Deserialize, Serialize};

/// Severity of a check run annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationLevel {
    Notice,
    Warning,
    Failure,
}

/// A single finding attached to a file location on a check run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Repository-relative file path
    pub path: String,
    /// Start line (1-indexed)
    pub start_line: u64,
    /// End line (inclusive)
    pub end_line: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_column: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_column: Option<u64>,
    pub annotation_level: AnnotationLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Check run as returned by the "list check runs for ref" endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct CheckRun {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub started_at: Option<String>,
}

/// Output object of an "update check run" request
#[derive(Debug, Clone, Serialize)]
pub struct CheckRunOutput {
    pub title: String,
    pub summary: String,
    pub annotations: Vec<Annotation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_json_omits_absent_fields() {
        let annotation = Annotation {
            path: "app.py".into(),
            start_line: 3,
            end_line: 3,
            start_column: None,
            end_column: None,
            annotation_level: AnnotationLevel::Failure,
            message: "[F401] unused".into(),
            title: None,
        };
        let value = serde_json::to_value(&annotation).unwrap();
        assert_eq!(value["annotation_level"], "failure");
        assert!(value.get("title").is_none());
        assert!(value.get("start_column").is_none());
    }

    #[test]
    fn test_check_run_without_started_at() {
        let run: CheckRun = serde_json::from_str(r#"{"id": 7, "name": "lint"}"#).unwrap();
        assert_eq!(run.id, 7);
        assert_eq!(run.started_at, None);
    }
}

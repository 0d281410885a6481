use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use super::types::StrategyConfig;

/// Result type for strategy loading
pub type StrategyResult<T> = Result<T, StrategyError>;

/// Error types for strategy loading
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("cannot read strategy file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid strategy document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("strategy document defines no application types")]
    Empty,
}

impl StrategyConfig {
    /// Parse a strategy document
    pub fn from_json_str(json: &str) -> StrategyResult<Self> {
        let config: StrategyConfig = serde_json::from_str(json)?;
        if config.application_types.is_empty() {
            return Err(StrategyError::Empty);
        }
        Ok(config)
    }

    /// Read and parse a strategy document
    pub fn try_load(path: &Path) -> StrategyResult<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

/// Load the strategy document, substituting the built-in default on any failure
pub fn load_strategies(path: &Path) -> StrategyConfig {
    match StrategyConfig::try_load(path) {
        Ok(config) => {
            info!(
                path = %path.display(),
                strategies = config.application_types.len(),
                "loaded test strategies"
            );
            config
        }
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "failed to load test strategies, using general_interactive default"
            );
            StrategyConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::types::{FALLBACK_STRATEGY, Step};
    use std::io::Write;

    const DOC: &str = r#"{
        "application_types": {
            "bst": {
                "description": "Binary search trees",
                "file_patterns": ["*bst*", "*tree*"],
                "content_keywords": ["binary search tree"],
                "test_sequences": [
                    {"description": "insert", "steps": [
                        {"action": "input", "target": "number_input", "value": 5},
                        {"action": "click", "target": "insert_button"},
                        {"action": "screenshot", "name": "after_insert"}
                    ]}
                ]
            },
            "aardvark": {"file_patterns": ["*aardvark*"]}
        },
        "test_config": {"wait_after_input_ms": 10}
    }"#;

    #[test]
    fn test_parse_preserves_order() {
        let config = StrategyConfig::from_json_str(DOC).unwrap();
        assert_eq!(config.names().collect::<Vec<_>>(), vec!["bst", "aardvark"]);
        let bst = config.strategy("bst").unwrap();
        assert_eq!(bst.test_sequences[0].steps.len(), 3);
        assert_eq!(
            bst.test_sequences[0].steps[1],
            Step::Click {
                target: "insert_button".to_string()
            }
        );
        assert_eq!(config.test_config.wait_after_input_ms, 10);
        assert_eq!(config.test_config.wait_after_click_ms, 500);
    }

    #[test]
    fn test_strategies_alias() {
        let config =
            StrategyConfig::from_json_str(r#"{"strategies": {"x": {"file_patterns": ["*x*"]}}}"#)
                .unwrap();
        assert!(config.strategy("x").is_some());
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_strategies(&dir.path().join("missing.json"));
        assert_eq!(config.names().collect::<Vec<_>>(), vec![FALLBACK_STRATEGY]);
    }

    #[test]
    fn test_load_invalid_json_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let config = load_strategies(file.path());
        assert_eq!(config.names().collect::<Vec<_>>(), vec![FALLBACK_STRATEGY]);
    }

    #[test]
    fn test_load_unknown_action_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"application_types": {{"x": {{"test_sequences": [{{"steps": [{{"action": "teleport"}}]}}]}}}}}}"#
        )
        .unwrap();
        let config = load_strategies(file.path());
        assert!(config.strategy("x").is_none());
    }

    #[test]
    fn test_empty_document_rejected() {
        assert!(matches!(
            StrategyConfig::from_json_str(r#"{"application_types": {}}"#),
            Err(StrategyError::Empty)
        ));
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DOC.as_bytes()).unwrap();
        let config = load_strategies(file.path());
        assert!(config.strategy("bst").is_some());
    }
}

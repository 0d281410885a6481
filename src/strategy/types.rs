use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Name of the strategy used when nothing else matches
pub const FALLBACK_STRATEGY: &str = "general_interactive";

/// Complete strategy document, loaded once per process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Named strategies, in document order (detection is first-match-wins over this order)
    #[serde(alias = "strategies")]
    pub application_types: IndexMap<String, Strategy>,

    /// Per-role selector overrides, merged over the built-in table
    #[serde(default)]
    pub element_selectors: BTreeMap<String, Vec<String>>,

    /// Timing and error-handling knobs
    #[serde(default)]
    pub test_config: TestSettings,
}

impl StrategyConfig {
    /// Look up a strategy by name
    pub fn strategy(&self, name: &str) -> Option<&Strategy> {
        self.application_types.get(name)
    }

    /// Look up a strategy by name, falling back to the generic one (or an empty one)
    pub fn strategy_or_fallback(&self, name: &str) -> Strategy {
        self.strategy(name)
            .or_else(|| self.strategy(FALLBACK_STRATEGY))
            .cloned()
            .unwrap_or_else(Strategy::general_interactive)
    }

    /// Strategy names in detection order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.application_types.keys().map(String::as_str)
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        let mut application_types = IndexMap::new();
        application_types.insert(
            FALLBACK_STRATEGY.to_string(),
            Strategy::general_interactive(),
        );
        Self {
            application_types,
            element_selectors: BTreeMap::new(),
            test_config: TestSettings::default(),
        }
    }
}

/// A named bundle of matching rules plus the UI sequences to replay
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Strategy {
    #[serde(default)]
    pub description: String,

    /// Glob-like file name patterns (`*` and `?` wildcards)
    #[serde(default)]
    pub file_patterns: Vec<String>,

    /// Keywords searched for in the page source when no pattern matches
    #[serde(default)]
    pub content_keywords: Vec<String>,

    #[serde(default)]
    pub test_sequences: Vec<Sequence>,
}

impl Strategy {
    /// The built-in generic strategy: matches nothing, does nothing beyond the baseline captures
    pub fn general_interactive() -> Self {
        Self {
            description: "Generic interactive page".to_string(),
            ..Default::default()
        }
    }
}

/// Ordered list of steps replayed against one page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sequence {
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One atomic UI action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Fill the element resolved from `target` with `value`
    Input { target: String, value: Literal },

    /// Click the element resolved from `target`
    Click { target: String },

    /// Capture the page as `<index>_<name>.png`
    Screenshot { name: String },

    /// Fill `target` with each value in turn, optionally clicking and capturing after each
    InputSequence {
        target: String,
        values: Vec<Literal>,
        #[serde(default)]
        click_after_each: Option<String>,
        #[serde(default)]
        screenshot_each: bool,
        /// Name template; `{value}` and `{index}` are substituted
        #[serde(default)]
        screenshot_name: Option<String>,
    },

    /// Dialogs are accepted by the run-wide handler; this only optionally captures
    HandleAlert {
        #[serde(default)]
        screenshot_name: Option<String>,
    },
}

impl Step {
    /// Action tag as it appears in the strategy document
    pub fn action(&self) -> &'static str {
        match self {
            Step::Input { .. } => "input",
            Step::Click { .. } => "click",
            Step::Screenshot { .. } => "screenshot",
            Step::InputSequence { .. } => "input_sequence",
            Step::HandleAlert { .. } => "handle_alert",
        }
    }
}

/// A literal value typed into an input; JSON strings, numbers and booleans are accepted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Text(s) => f.write_str(s),
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::Text(s.to_string())
    }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self {
        Literal::Number(n.into())
    }
}

/// Timing and error-handling settings carried in the strategy document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestSettings {
    /// Keep going after a failed step (otherwise the remaining steps are skipped)
    pub continue_on_interaction_error: bool,

    /// Capture an `error_*` screenshot when a step fails
    pub screenshot_on_error: bool,

    /// Settle delay after each fill (milliseconds)
    pub wait_after_input_ms: u64,

    /// Settle delay after each click (milliseconds)
    pub wait_after_click_ms: u64,

    /// Settle delay after navigation (milliseconds)
    pub page_load_wait_ms: u64,
}

impl Default for TestSettings {
    fn default() -> Self {
        Self {
            continue_on_interaction_error: true,
            screenshot_on_error: true,
            wait_after_input_ms: 300,
            wait_after_click_ms: 500,
            page_load_wait_ms: 1000,
        }
    }
}

impl TestSettings {
    /// Settings with every delay set to zero, for tests
    pub fn instant() -> Self {
        Self {
            wait_after_input_ms: 0,
            wait_after_click_ms: 0,
            page_load_wait_ms: 0,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_tagged_parse() {
        let step: Step = serde_json::from_str(
            r#"{"action": "input_sequence", "target": "number_input", "values": [1, "b", 3.5], "click_after_each": "insert_button"}"#,
        )
        .unwrap();
        match step {
            Step::InputSequence {
                target,
                values,
                click_after_each,
                screenshot_each,
                ..
            } => {
                assert_eq!(target, "number_input");
                let rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
                assert_eq!(rendered, vec!["1", "b", "3.5"]);
                assert_eq!(click_after_each.as_deref(), Some("insert_button"));
                assert!(!screenshot_each);
            }
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn test_unknown_action_rejected() {
        let result: Result<Step, _> = serde_json::from_str(r#"{"action": "hover", "target": "x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_defaults_when_partial() {
        let settings: TestSettings =
            serde_json::from_str(r#"{"continue_on_interaction_error": false}"#).unwrap();
        assert!(!settings.continue_on_interaction_error);
        assert_eq!(settings.wait_after_click_ms, 500);
    }

    #[test]
    fn test_default_config_has_fallback() {
        let config = StrategyConfig::default();
        assert_eq!(config.names().collect::<Vec<_>>(), vec![FALLBACK_STRATEGY]);
        assert!(config.strategy_or_fallback("nope").test_sequences.is_empty());
    }
}

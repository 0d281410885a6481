//! Extraction of the FSM description some demo pages embed.
//!
//! The description is informational: it is logged and copied into the run
//! report, never used to drive steps.

use regex::Regex;
use std::sync::OnceLock;

fn script_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script>").expect("valid script regex"))
}

fn fsm_attr_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?i)(?:^|\s)(?:id\s*=\s*["']?[^"'\s>]*fsm|type\s*=\s*["']?application/fsm\+json)"#,
        )
        .expect("valid fsm attribute regex")
    })
}

fn is_fsm_script(attrs: &str) -> bool {
    fsm_attr_regex().is_match(attrs)
}

/// Find and parse the first embedded FSM description
pub fn extract_fsm(html: &str) -> Option<serde_json::Value> {
    script_regex()
        .captures_iter(html)
        .filter(|caps| is_fsm_script(&caps[1]))
        .find_map(|caps| serde_json::from_str(caps[2].trim()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_by_id() {
        let html = r#"<html><script src="app.js"></script>
<script id="fsm-config" type="application/json">
  {"states": ["idle", "inserting"], "initial": "idle"}
</script></html>"#;
        assert_eq!(
            extract_fsm(html),
            Some(json!({"states": ["idle", "inserting"], "initial": "idle"}))
        );
    }

    #[test]
    fn test_extract_by_type() {
        let html = r#"<SCRIPT type="application/fsm+json">{"initial": "a"}</SCRIPT>"#;
        assert_eq!(extract_fsm(html), Some(json!({"initial": "a"})));
    }

    #[test]
    fn test_attribute_spacing_and_case() {
        assert!(is_fsm_script(r#" id = "fsm""#));
        assert!(is_fsm_script(r#" ID='FSM-x'"#));
        assert!(is_fsm_script(r#" TYPE = "Application/FSM+JSON""#));
        assert!(!is_fsm_script(r#" data-id="fsm""#));
        assert!(!is_fsm_script(r#" id="app" src="fsm.js""#));
        assert_eq!(
            extract_fsm(r#"<script  id = "fsm" >{"initial": "idle"}</script>"#),
            Some(json!({"initial": "idle"}))
        );
    }

    #[test]
    fn test_absent_or_invalid() {
        assert_eq!(extract_fsm("<script>var fsm = 1;</script>"), None);
        assert_eq!(extract_fsm(r#"<script id="fsm">not json</script>"#), None);
    }
}

//! Application-type detection.
//!
//! Strategies are tried strictly in document order: first by file name pattern,
//! then (if page content is available) by keyword. The first hit wins.

use regex::Regex;
use tracing::debug;

use super::types::{FALLBACK_STRATEGY, StrategyConfig};

/// Translate a glob-like pattern into an anchored, case-insensitive regex source
pub fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push_str("(?i)^");
    for ch in pattern.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            c => out.push_str(&regex::escape(&c.to_string())),
        }
    }
    out.push('$');
    out
}

/// Test a file name against one glob-like pattern; invalid patterns never match
pub fn pattern_matches(pattern: &str, file_name: &str) -> bool {
    match Regex::new(&glob_to_regex(pattern)) {
        Ok(re) => re.is_match(&file_name.to_lowercase()),
        Err(e) => {
            debug!(pattern, error = %e, "ignoring invalid file pattern");
            false
        }
    }
}

/// Pick the strategy for a file. Always returns a configured name or `general_interactive`.
pub fn detect_application_type(
    config: &StrategyConfig,
    file_name: &str,
    content: Option<&str>,
) -> String {
    for (name, strategy) in &config.application_types {
        if let Some(pattern) = strategy
            .file_patterns
            .iter()
            .find(|p| pattern_matches(p, file_name))
        {
            debug!(file_name, strategy = %name, pattern = %pattern, "matched file pattern");
            return name.clone();
        }
    }

    if let Some(content) = content {
        let haystack = content.to_lowercase();
        for (name, strategy) in &config.application_types {
            if let Some(keyword) = strategy
                .content_keywords
                .iter()
                .find(|k| !k.is_empty() && haystack.contains(&k.to_lowercase()))
            {
                debug!(file_name, strategy = %name, keyword = %keyword, "matched content keyword");
                return name.clone();
            }
        }
    }

    FALLBACK_STRATEGY.to_string()
}

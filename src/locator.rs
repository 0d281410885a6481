//! Semantic element roles resolved to concrete CSS selectors.

use std::collections::BTreeMap;
use tracing::debug;

use crate::driver::PageDriver;

/// Ordered candidate selectors per role
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorTable {
    roles: BTreeMap<String, Vec<String>>,
}

const DEFAULT_ROLES: &[(&str, &[&str])] = &[
    (
        "number_input",
        &[
            "#insert-input",
            "#valueInput",
            "#value-input",
            "#numberInput",
            "input[type=\"number\"]",
            "#input",
            "input[type=\"text\"]",
        ],
    ),
    (
        "text_input",
        &["#text-input", "#textInput", "input[type=\"text\"]", "textarea"],
    ),
    (
        "insert_button",
        &[
            "#insert-btn",
            "#insertBtn",
            "#add-btn",
            "#addBtn",
            "button[data-action=\"insert\"]",
            "button[onclick*=\"insert\"]",
        ],
    ),
    (
        "delete_button",
        &["#delete-btn", "#deleteBtn", "#remove-btn", "button[onclick*=\"delete\"]"],
    ),
    (
        "search_button",
        &["#search-btn", "#searchBtn", "#find-btn", "button[onclick*=\"search\"]"],
    ),
    (
        "reset_button",
        &["#reset-btn", "#resetBtn", "#clear-btn", "#clearBtn", "button[type=\"reset\"]"],
    ),
    ("push_button", &["#push-btn", "#pushBtn", "button[onclick*=\"push\"]"]),
    ("pop_button", &["#pop-btn", "#popBtn", "button[onclick*=\"pop\"]"]),
    (
        "enqueue_button",
        &["#enqueue-btn", "#enqueueBtn", "button[onclick*=\"enqueue\"]"],
    ),
    (
        "dequeue_button",
        &["#dequeue-btn", "#dequeueBtn", "button[onclick*=\"dequeue\"]"],
    ),
    (
        "start_button",
        &["#start-btn", "#startBtn", "#run-btn", "#play-btn", "button[onclick*=\"start\"]"],
    ),
    ("step_button", &["#step-btn", "#stepBtn", "#next-btn", "#nextBtn"]),
    (
        "random_button",
        &["#random-btn", "#randomBtn", "#generate-btn", "#generateBtn"],
    ),
    ("sort_button", &["#sort-btn", "#sortBtn", "button[onclick*=\"sort\"]"]),
    ("canvas", &["canvas", "#canvas", "svg"]),
];

impl SelectorTable {
    /// The built-in table
    pub fn builtin() -> Self {
        let roles = DEFAULT_ROLES
            .iter()
            .map(|(role, selectors)| {
                (
                    role.to_string(),
                    selectors.iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect();
        Self { roles }
    }

    /// An empty table
    pub fn empty() -> Self {
        Self {
            roles: BTreeMap::new(),
        }
    }

    /// The built-in table with the given roles replaced
    pub fn with_overrides(overrides: &BTreeMap<String, Vec<String>>) -> Self {
        let mut table = Self::builtin();
        for (role, selectors) in overrides {
            table.roles.insert(role.clone(), selectors.clone());
        }
        table
    }

    pub fn set(&mut self, role: impl Into<String>, selectors: Vec<String>) {
        self.roles.insert(role.into(), selectors);
    }

    /// Candidates for a role. Unknown roles are probed as a literal selector.
    pub fn candidates(&self, role: &str) -> Vec<String> {
        match self.roles.get(role) {
            Some(list) => list.clone(),
            None => vec![role.to_string()],
        }
    }

    pub fn roles(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.roles.iter()
    }
}

impl Default for SelectorTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Return the first candidate selector for `role` that is present and visible.
///
/// Probe failures count as "not visible".
pub async fn find_element(
    page: &dyn PageDriver,
    table: &SelectorTable,
    role: &str,
) -> Option<String> {
    for selector in table.candidates(role) {
        match page.is_visible(&selector).await {
            Ok(true) => {
                debug!(role, selector = %selector, "resolved element");
                return Some(selector);
            }
            Ok(false) => {}
            Err(e) => debug!(role, selector = %selector, error = %e, "probe failed"),
        }
    }
    debug!(role, "no visible element");
    None
}

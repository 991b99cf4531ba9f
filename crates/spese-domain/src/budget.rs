use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Monthly spending caps. A figure of `0` means "unset".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Budgets {
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub categories: BTreeMap<String, f64>,
}

impl Budgets {
    /// Cap configured for `category`, or `0` when none is set.
    pub fn cap_for(&self, category: &str) -> f64 {
        self.categories.get(category).copied().unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0.0 && self.categories.values().all(|cap| *cap == 0.0)
    }
}

//! Domain types representing the category/subcategory taxonomy.

use serde::{Deserialize, Serialize};

use crate::common::*;

/// Fallback category; it can never be renamed or removed.
pub const DEFAULT_CATEGORY: &str = "Altro";
/// Category that triggers the compound cash-withdrawal path.
pub const WITHDRAWAL_CATEGORY: &str = "Prelievo";
/// Category assigned to the cash side of a withdrawal.
pub const TRANSFER_CATEGORY: &str = "Trasferimento";

/// Built-in category names in their declared order.
pub const BUILTIN_CATEGORY_NAMES: &[&str] = &[
    "Cibo",
    "Auto",
    "Viaggi",
    "Vacanze",
    "Trasporti",
    "Casa",
    "Uscite",
    "Salute",
    "Spese Mediche",
    "Abbigliamento",
    "Giardinaggio",
    "Lavoro",
    "Regali",
    "Tempo Libero",
    "Sport",
    "Assicurazione",
    WITHDRAWAL_CATEGORY,
    TRANSFER_CATEGORY,
    DEFAULT_CATEGORY,
];

/// Categorises ledger activity for budgeting and reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub subcategories: Vec<String>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subcategories: Vec::new(),
        }
    }

    pub fn with_subcategories<I, S>(mut self, subcategories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subcategories = subcategories.into_iter().map(Into::into).collect();
        self
    }

    /// Exact membership test used for reference validation.
    pub fn has_subcategory(&self, name: &str) -> bool {
        self.subcategories.iter().any(|sub| sub == name)
    }

    /// Case-insensitive membership test used for duplicate detection.
    pub fn has_subcategory_like(&self, name: &str) -> bool {
        let needle = normalize_name(name);
        self.subcategories
            .iter()
            .any(|sub| normalize_name(sub) == needle)
    }

    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_CATEGORY
    }
}

impl NamedEntity for Category {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Displayable for Category {
    fn display_label(&self) -> String {
        if self.subcategories.is_empty() {
            self.name.clone()
        } else {
            format!("{} [{}]", self.name, self.subcategories.join(", "))
        }
    }
}

/// Category entry as found on disk: either a legacy bare name or a full record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PersistedCategory {
    Legacy(String),
    Current(Category),
}

impl PersistedCategory {
    pub fn is_legacy(&self) -> bool {
        matches!(self, PersistedCategory::Legacy(_))
    }

    /// Lifts the entry into the current representation.
    pub fn into_category(self) -> Category {
        match self {
            PersistedCategory::Legacy(name) => Category::new(name),
            PersistedCategory::Current(category) => category,
        }
    }
}

impl From<Category> for PersistedCategory {
    fn from(category: Category) -> Self {
        PersistedCategory::Current(category)
    }
}

/// The built-in taxonomy, all with empty subcategory sets.
pub fn builtin_categories() -> Vec<Category> {
    BUILTIN_CATEGORY_NAMES
        .iter()
        .map(|name| Category::new(*name))
        .collect()
}

/// Canonical form used for case-insensitive name comparisons.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

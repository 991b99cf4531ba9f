use std::collections::BTreeMap;

use spese_domain::{Budgets, Document};

use crate::CoreError;

pub struct BudgetService;

impl BudgetService {
    /// Replaces every budget figure. Unknown category keys are rejected.
    pub fn save(
        document: &mut Document,
        total: f64,
        per_category: BTreeMap<String, f64>,
    ) -> Result<(), CoreError> {
        if let Some(unknown) = per_category
            .keys()
            .find(|name| document.category(name).is_none())
        {
            return Err(CoreError::CategoryNotFound(unknown.clone()));
        }
        document.budgets = Budgets {
            total: Self::coerce(total),
            categories: per_category
                .into_iter()
                .map(|(name, cap)| (name, Self::coerce(cap)))
                .collect(),
        };
        Ok(())
    }

    /// Negative and non-finite figures become `0`, i.e. unset.
    pub fn coerce(value: f64) -> f64 {
        if value.is_finite() && value > 0.0 {
            value
        } else {
            0.0
        }
    }

    /// Reads a user-typed figure, accepting either `,` or `.` as decimal separator.
    pub fn parse_input(raw: &str) -> f64 {
        raw.trim()
            .replace(',', ".")
            .parse::<f64>()
            .map(Self::coerce)
            .unwrap_or(0.0)
    }
}

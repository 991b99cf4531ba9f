//! Merging of persisted categories with the built-in taxonomy.

use std::collections::HashSet;

use spese_domain::{normalize_name, Category, PersistedCategory};

pub struct TaxonomyReconciler;

impl TaxonomyReconciler {
    /// Lifts legacy entries, keeps every persisted category in order and
    /// appends the built-ins that are not already present.
    ///
    /// Presence is decided case-insensitively, matching the uniqueness rule
    /// enforced when categories are created. Duplicate persisted entries
    /// (same name up to case) keep only the first occurrence.
    pub fn reconcile(persisted: Vec<PersistedCategory>, builtins: &[Category]) -> Vec<Category> {
        let mut seen = HashSet::new();
        let mut merged = Vec::with_capacity(persisted.len() + builtins.len());

        for entry in persisted {
            let category = entry.into_category();
            if seen.insert(normalize_name(&category.name)) {
                merged.push(category);
            }
        }
        for builtin in builtins {
            if seen.insert(normalize_name(&builtin.name)) {
                merged.push(builtin.clone());
            }
        }
        merged
    }

    /// Convenience wrapper for already-lifted categories.
    pub fn reconcile_categories(current: &[Category], builtins: &[Category]) -> Vec<Category> {
        Self::reconcile(
            current.iter().cloned().map(PersistedCategory::from).collect(),
            builtins,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(categories: &[Category]) -> Vec<&str> {
        categories.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn appends_missing_builtins_after_persisted_entries() {
        let builtins = vec![Category::new("Cibo"), Category::new("Altro")];
        let persisted = vec![PersistedCategory::Current(Category::new("Cibo"))];

        let merged = TaxonomyReconciler::reconcile(persisted, &builtins);
        assert_eq!(names(&merged), vec!["Cibo", "Altro"]);

        let again = TaxonomyReconciler::reconcile_categories(&merged, &builtins);
        assert_eq!(again, merged);
    }

    #[test]
    fn lifts_legacy_names_and_keeps_user_order() {
        let builtins = vec![Category::new("Cibo"), Category::new("Casa"), Category::new("Altro")];
        let persisted = vec![
            PersistedCategory::Legacy("Hobby".into()),
            PersistedCategory::Legacy("Casa".into()),
        ];

        let merged = TaxonomyReconciler::reconcile(persisted, &builtins);
        assert_eq!(names(&merged), vec!["Hobby", "Casa", "Cibo", "Altro"]);
        assert!(merged.iter().all(|c| c.subcategories.is_empty()));
    }

    #[test]
    fn keeps_user_subcategories_and_case() {
        let builtins = vec![Category::new("Cibo"), Category::new("Altro")];
        let persisted = vec![PersistedCategory::Current(
            Category::new("cibo").with_subcategories(["Ristorante", "Spesa"]),
        )];

        let merged = TaxonomyReconciler::reconcile(persisted, &builtins);
        assert_eq!(names(&merged), vec!["cibo", "Altro"]);
        assert_eq!(merged[0].subcategories, vec!["Ristorante", "Spesa"]);
    }

    #[test]
    fn empty_persisted_list_yields_builtins() {
        let builtins = spese_domain::builtin_categories();
        let merged = TaxonomyReconciler::reconcile(Vec::new(), &builtins);
        assert_eq!(merged, builtins);
    }
}

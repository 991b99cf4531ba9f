use serde::{Deserialize, Serialize};
use tracing::info;

use spese_domain::{normalize_name, Category, Document, DEFAULT_CATEGORY};

use crate::{validation, CoreError};

/// What happens to subcategory values on transactions when their category is renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenamePolicy {
    /// Clear the subcategory of every affected transaction and template.
    #[default]
    ClearSubcategories,
    /// Keep subcategory values; they remain valid since the set moves with the category.
    KeepSubcategories,
}

impl RenamePolicy {
    pub fn from_clear_flag(clear: bool) -> Self {
        if clear {
            RenamePolicy::ClearSubcategories
        } else {
            RenamePolicy::KeepSubcategories
        }
    }
}

/// Maintains the taxonomy and cascades changes to every reference.
pub struct CategoryService;

impl CategoryService {
    pub fn create(document: &mut Document, name: &str) -> Result<(), CoreError> {
        let name = Self::available_name(document, name, None)?;
        document.categories.push(Category::new(name));
        Ok(())
    }

    /// Creates a category, or renames `editing` when supplied.
    pub fn save(
        document: &mut Document,
        name: &str,
        editing: Option<&str>,
        policy: RenamePolicy,
    ) -> Result<(), CoreError> {
        match editing {
            Some(current) => Self::rename(document, current, name, policy),
            None => Self::create(document, name),
        }
    }

    pub fn rename(
        document: &mut Document,
        current: &str,
        new_name: &str,
        policy: RenamePolicy,
    ) -> Result<(), CoreError> {
        if current == DEFAULT_CATEGORY {
            return Err(CoreError::ReservedCategory(current.to_string()));
        }
        if document.category(current).is_none() {
            return Err(CoreError::CategoryNotFound(current.to_string()));
        }
        let new_name = Self::available_name(document, new_name, Some(current))?;
        let clear = policy == RenamePolicy::ClearSubcategories;

        if let Some(category) = document.category_mut(current) {
            category.name = new_name.clone();
        }
        let mut touched = 0usize;
        for txn in document.transactions.iter_mut().filter(|txn| txn.category == current) {
            txn.category = new_name.clone();
            if clear {
                txn.subcategory.clear();
            }
            touched += 1;
        }
        for template in document
            .recurring_transactions
            .iter_mut()
            .filter(|template| template.category == current)
        {
            template.category = new_name.clone();
            if clear {
                template.subcategory.clear();
            }
        }
        if let Some(cap) = document.budgets.categories.remove(current) {
            document.budgets.categories.insert(new_name.clone(), cap);
        }

        info!(from = current, to = %new_name, transactions = touched, ?policy, "category renamed");
        Ok(())
    }

    /// Removes a category, moving its references to the fallback category.
    pub fn delete(document: &mut Document, name: &str) -> Result<Category, CoreError> {
        if name == DEFAULT_CATEGORY {
            return Err(CoreError::ReservedCategory(name.to_string()));
        }
        let position = document
            .categories
            .iter()
            .position(|category| category.name == name)
            .ok_or_else(|| CoreError::CategoryNotFound(name.to_string()))?;
        if document.category(DEFAULT_CATEGORY).is_none() {
            return Err(CoreError::Integrity(format!(
                "fallback category `{DEFAULT_CATEGORY}` is missing"
            )));
        }

        let removed = document.categories.remove(position);
        let mut reassigned = 0usize;
        for txn in document.transactions.iter_mut().filter(|txn| txn.category == name) {
            txn.category = DEFAULT_CATEGORY.into();
            txn.subcategory.clear();
            reassigned += 1;
        }
        for template in document
            .recurring_transactions
            .iter_mut()
            .filter(|template| template.category == name)
        {
            template.category = DEFAULT_CATEGORY.into();
            template.subcategory.clear();
        }
        document.budgets.categories.remove(name);

        info!(category = name, reassigned, "category deleted");
        Ok(removed)
    }

    pub fn create_subcategory(document: &mut Document, category: &str, name: &str) -> Result<(), CoreError> {
        validation::require_text("subcategory name", name)?;
        let name = name.trim();
        let entry = document
            .category_mut(category)
            .ok_or_else(|| CoreError::CategoryNotFound(category.to_string()))?;
        if entry.has_subcategory_like(name) {
            return Err(CoreError::Duplicate(format!("{category} / {name}")));
        }
        entry.subcategories.push(name.to_string());
        Ok(())
    }

    pub fn rename_subcategory(
        document: &mut Document,
        category: &str,
        current: &str,
        new_name: &str,
    ) -> Result<(), CoreError> {
        validation::require_text("subcategory name", new_name)?;
        let new_name = new_name.trim().to_string();
        let entry = document
            .category_mut(category)
            .ok_or_else(|| CoreError::CategoryNotFound(category.to_string()))?;
        let position = entry
            .subcategories
            .iter()
            .position(|sub| sub == current)
            .ok_or_else(|| CoreError::SubcategoryNotFound(format!("{category} / {current}")))?;
        let wanted = normalize_name(&new_name);
        let clash = entry
            .subcategories
            .iter()
            .enumerate()
            .any(|(index, sub)| index != position && normalize_name(sub) == wanted);
        if clash {
            return Err(CoreError::Duplicate(format!("{category} / {new_name}")));
        }
        entry.subcategories[position] = new_name.clone();

        for txn in document
            .transactions
            .iter_mut()
            .filter(|txn| txn.category == category && txn.subcategory == current)
        {
            txn.subcategory = new_name.clone();
        }
        for template in document
            .recurring_transactions
            .iter_mut()
            .filter(|template| template.category == category && template.subcategory == current)
        {
            template.subcategory = new_name.clone();
        }
        Ok(())
    }

    /// Removes a subcategory and clears it wherever `(category, name)` was referenced.
    pub fn delete_subcategory(document: &mut Document, category: &str, name: &str) -> Result<(), CoreError> {
        let entry = document
            .category_mut(category)
            .ok_or_else(|| CoreError::CategoryNotFound(category.to_string()))?;
        let position = entry
            .subcategories
            .iter()
            .position(|sub| sub == name)
            .ok_or_else(|| CoreError::SubcategoryNotFound(format!("{category} / {name}")))?;
        entry.subcategories.remove(position);

        for txn in document
            .transactions
            .iter_mut()
            .filter(|txn| txn.category == category && txn.subcategory == name)
        {
            txn.subcategory.clear();
        }
        for template in document
            .recurring_transactions
            .iter_mut()
            .filter(|template| template.category == category && template.subcategory == name)
        {
            template.subcategory.clear();
        }
        Ok(())
    }

    /// Trims `name` and checks that no other category already uses it, ignoring case.
    fn available_name(document: &Document, name: &str, renaming: Option<&str>) -> Result<String, CoreError> {
        validation::require_text("category name", name)?;
        let trimmed = name.trim();
        let wanted = normalize_name(trimmed);
        let taken = document
            .categories
            .iter()
            .filter(|category| Some(category.name.as_str()) != renaming)
            .any(|category| normalize_name(&category.name) == wanted);
        if taken {
            Err(CoreError::Duplicate(trimmed.to_string()))
        } else {
            Ok(trimmed.to_string())
        }
    }
}

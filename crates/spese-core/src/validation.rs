//! Field and reference checks shared by the mutation services.

use spese_domain::{Document, TransactionDraft};

use crate::CoreError;

pub(crate) fn require_text(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        Err(CoreError::Validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}

pub(crate) fn require_positive_amount(amount: f64) -> Result<(), CoreError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(CoreError::Validation(
            "amount must be a number greater than zero".into(),
        ))
    }
}

pub(crate) fn require_account(document: &Document, account_id: &str) -> Result<(), CoreError> {
    if account_id.trim().is_empty() {
        return Err(CoreError::Validation("account is required".into()));
    }
    if document.account(account_id).is_some() {
        Ok(())
    } else {
        Err(CoreError::AccountNotFound(account_id.to_string()))
    }
}

/// Checks that `category` exists and that a non-empty `subcategory` belongs to it.
pub(crate) fn require_category_reference(
    document: &Document,
    category: &str,
    subcategory: &str,
) -> Result<(), CoreError> {
    let entry = document
        .category(category)
        .ok_or_else(|| CoreError::CategoryNotFound(category.to_string()))?;
    if subcategory.is_empty() || entry.has_subcategory(subcategory) {
        Ok(())
    } else {
        Err(CoreError::SubcategoryNotFound(format!(
            "{category} / {subcategory}"
        )))
    }
}

/// Runs every field rule a transaction-shaped draft has to satisfy.
pub(crate) fn validate_draft(document: &Document, draft: &TransactionDraft) -> Result<(), CoreError> {
    require_positive_amount(draft.amount)?;
    require_text("description", &draft.description)?;
    require_account(document, &draft.account_id)?;
    require_category_reference(document, &draft.category, &draft.subcategory)
}

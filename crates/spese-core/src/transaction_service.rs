use tracing::debug;

use spese_domain::{
    new_id, Document, Transaction, TransactionDraft, TransactionKind, CASH_ACCOUNT_ID,
    TRANSFER_CATEGORY, WITHDRAWAL_CATEGORY,
};

use crate::{validation, CoreError};

/// Suffix appended to the base id of the cash-side entry of a withdrawal.
pub const WITHDRAWAL_COUNTERPART_SUFFIX: &str = "-c";

/// Creates, edits and removes individual transactions.
pub struct TransactionService;

impl TransactionService {
    /// Creates a transaction, or edits `editing` in place, returning the ids written.
    ///
    /// Creating an expense in the withdrawal category from a non-cash account
    /// writes a linked pair: the expense on the source account and an income
    /// of the same amount on the cash account.
    pub fn save(
        document: &mut Document,
        draft: &TransactionDraft,
        editing: Option<&str>,
    ) -> Result<Vec<String>, CoreError> {
        validation::validate_draft(document, draft)?;
        match editing {
            Some(id) => Self::update(document, id, draft).map(|id| vec![id]),
            None if Self::is_withdrawal(draft) => Self::withdraw(document, draft),
            None => {
                let txn = Transaction::from_draft(new_id(), draft);
                let id = txn.id.clone();
                document.transactions.push(txn);
                document.sort_transactions();
                Ok(vec![id])
            }
        }
    }

    pub fn is_withdrawal(draft: &TransactionDraft) -> bool {
        draft.kind == TransactionKind::Expense && draft.category == WITHDRAWAL_CATEGORY
    }

    fn withdraw(document: &mut Document, draft: &TransactionDraft) -> Result<Vec<String>, CoreError> {
        if draft.account_id == CASH_ACCOUNT_ID {
            return Err(CoreError::Validation(
                "cannot withdraw cash from the cash account".into(),
            ));
        }
        if document.category(TRANSFER_CATEGORY).is_none() {
            return Err(CoreError::CategoryNotFound(TRANSFER_CATEGORY.into()));
        }

        let base_id = new_id();
        let source = Transaction::from_draft(base_id.clone(), draft);
        let mut deposit = Transaction::from_draft(
            format!("{base_id}{WITHDRAWAL_COUNTERPART_SUFFIX}"),
            draft,
        );
        deposit.kind = TransactionKind::Income;
        deposit.category = TRANSFER_CATEGORY.into();
        deposit.subcategory = String::new();
        deposit.account_id = CASH_ACCOUNT_ID.into();

        let ids = vec![source.id.clone(), deposit.id.clone()];
        debug!(from = %draft.account_id, amount = draft.amount, "recording cash withdrawal");
        document.transactions.push(source);
        document.transactions.push(deposit);
        document.sort_transactions();
        Ok(ids)
    }

    fn update(document: &mut Document, id: &str, draft: &TransactionDraft) -> Result<String, CoreError> {
        let existing = document
            .transaction_mut(id)
            .ok_or_else(|| CoreError::TransactionNotFound(id.to_string()))?;
        if existing.is_recurring {
            return Err(CoreError::InvalidOperation(
                "transactions generated by a recurring series cannot be edited".into(),
            ));
        }
        let calendar_event_id = existing.calendar_event_id.take();
        *existing = Transaction::from_draft(id, draft);
        existing.calendar_event_id = calendar_event_id;
        document.sort_transactions();
        Ok(id.to_string())
    }

    /// Removes exactly one transaction. Withdrawal counterparts are left alone.
    pub fn delete(document: &mut Document, id: &str) -> Result<Transaction, CoreError> {
        let position = document
            .transactions
            .iter()
            .position(|txn| txn.id == id)
            .ok_or_else(|| CoreError::TransactionNotFound(id.to_string()))?;
        Ok(document.transactions.remove(position))
    }

    /// Records (or clears) the external calendar event linked to a transaction.
    pub fn set_calendar_event(
        document: &mut Document,
        id: &str,
        event_id: Option<String>,
    ) -> Result<(), CoreError> {
        let txn = document
            .transaction_mut(id)
            .ok_or_else(|| CoreError::TransactionNotFound(id.to_string()))?;
        txn.calendar_event_id = event_id;
        Ok(())
    }
}

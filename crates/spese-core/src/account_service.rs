use tracing::info;

use spese_domain::{new_id, Account, AccountDraft, Document, RecurringTemplate, Transaction};

use crate::{validation, CoreError};

/// Everything removed by an account deletion.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountRemoval {
    pub account: Account,
    pub transactions: Vec<Transaction>,
    pub templates: Vec<RecurringTemplate>,
}

impl AccountRemoval {
    /// Calendar events that belonged to the removed transactions.
    pub fn calendar_event_ids(&self) -> Vec<String> {
        self.transactions
            .iter()
            .filter_map(|txn| txn.calendar_event_id.clone())
            .collect()
    }
}

pub struct AccountService;

impl AccountService {
    /// Creates an account, or edits `editing` in place. Returns the account id.
    pub fn save(
        document: &mut Document,
        draft: &AccountDraft,
        editing: Option<&str>,
    ) -> Result<String, CoreError> {
        validation::require_text("bank", &draft.bank)?;
        validation::require_text("account number", &draft.number)?;
        validation::require_text("description", &draft.description)?;

        match editing {
            Some(id) => {
                let account = document
                    .account_mut(id)
                    .ok_or_else(|| CoreError::AccountNotFound(id.to_string()))?;
                if account.is_cash() {
                    return Err(CoreError::ReservedAccount(id.to_string()));
                }
                account.bank = draft.bank.trim().to_string();
                account.number = draft.number.trim().to_string();
                account.description = draft.description.trim().to_string();
                Ok(id.to_string())
            }
            None => {
                let account = Account {
                    id: new_id(),
                    bank: draft.bank.trim().to_string(),
                    number: draft.number.trim().to_string(),
                    description: draft.description.trim().to_string(),
                };
                let id = account.id.clone();
                document.accounts.push(account);
                Ok(id)
            }
        }
    }

    /// Removes an account together with its transactions and recurring templates.
    pub fn delete(document: &mut Document, id: &str) -> Result<AccountRemoval, CoreError> {
        let position = document
            .accounts
            .iter()
            .position(|account| account.id == id)
            .ok_or_else(|| CoreError::AccountNotFound(id.to_string()))?;
        if document.accounts[position].is_cash() {
            return Err(CoreError::ReservedAccount(id.to_string()));
        }

        let account = document.accounts.remove(position);
        let (transactions, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut document.transactions)
            .into_iter()
            .partition(|txn| txn.account_id == id);
        document.transactions = kept;
        let (templates, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut document.recurring_transactions)
                .into_iter()
                .partition(|template| template.account_id == id);
        document.recurring_transactions = kept;

        info!(
            account = %account.id,
            transactions = transactions.len(),
            templates = templates.len(),
            "account deleted"
        );
        Ok(AccountRemoval {
            account,
            transactions,
            templates,
        })
    }
}

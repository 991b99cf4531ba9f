use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use spese_core::{AggregateFilter, BudgetService, CoreError, PeriodFilter, SummaryService};
use spese_domain::{
    AccountDraft, Displayable, Frequency, RecurringDraft, TransactionDraft, TransactionKind,
    CASH_ACCOUNT_ID, DEFAULT_CATEGORY, WITHDRAWAL_CATEGORY,
};

use crate::cli::context::{
    CommandEntry, CommandError, CommandRegistry, CommandResult, ShellContext,
};
use crate::cli::output;
use crate::utils::build_info;
use crate::utils::persistence::FileBackupTarget;

const DEFAULT_LISTING_LIMIT: usize = 20;
const DATE_FLAG: &str = "--date";
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

pub fn registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new(vec![
        CommandEntry::new("help", "Show available commands", "help [command]", cmd_help),
        CommandEntry::new("version", "Show build metadata", "version", cmd_version),
        CommandEntry::new(
            "summary",
            "Income, expenses and balances for a period",
            "summary [total|month <m> <y>|year <y>] [account <id>]",
            cmd_summary,
        ),
        CommandEntry::new("accounts", "List accounts", "accounts", cmd_accounts),
        CommandEntry::new(
            "add-account",
            "Create a bank account",
            "add-account <bank> <number> <description>",
            cmd_add_account,
        ),
        CommandEntry::new(
            "edit-account",
            "Change an account's bank, number or description",
            "edit-account <id> <field>=<value> ...  (fields: bank, number, description)",
            cmd_edit_account,
        ),
        CommandEntry::new(
            "delete-account",
            "Delete an account with its transactions and series",
            "delete-account <id>",
            cmd_delete_account,
        ),
        CommandEntry::new("categories", "List categories", "categories", cmd_categories),
        CommandEntry::new(
            "add-category",
            "Create a category",
            "add-category <name>",
            cmd_add_category,
        ),
        CommandEntry::new(
            "rename-category",
            "Rename a category and everything that references it",
            "rename-category <old> <new>",
            cmd_rename_category,
        ),
        CommandEntry::new(
            "delete-category",
            "Delete a category, moving its transactions to Altro",
            "delete-category <name>",
            cmd_delete_category,
        ),
        CommandEntry::new(
            "add-subcategory",
            "Create a subcategory",
            "add-subcategory <category> <name>",
            cmd_add_subcategory,
        ),
        CommandEntry::new(
            "rename-subcategory",
            "Rename a subcategory",
            "rename-subcategory <category> <old> <new>",
            cmd_rename_subcategory,
        ),
        CommandEntry::new(
            "delete-subcategory",
            "Delete a subcategory",
            "delete-subcategory <category> <name>",
            cmd_delete_subcategory,
        ),
        CommandEntry::new(
            "add-expense",
            "Record an expense",
            "add-expense <amount> <description> <category> [account] [subcategory] [--date <day>]",
            cmd_add_expense,
        ),
        CommandEntry::new(
            "add-income",
            "Record an income",
            "add-income <amount> <description> [category] [account] [--date <day>]",
            cmd_add_income,
        ),
        CommandEntry::new(
            "withdraw",
            "Move cash from an account to CASH",
            "withdraw <amount> <account> [--date <day>]",
            cmd_withdraw,
        ),
        CommandEntry::new(
            "edit",
            "Change fields of a transaction",
            "edit <transaction-id> <field>=<value> ...  (fields: amount, description, category, subcategory, account, date, type)",
            cmd_edit,
        ),
        CommandEntry::new(
            "delete",
            "Delete a transaction",
            "delete <transaction-id>",
            cmd_delete,
        ),
        CommandEntry::new(
            "transactions",
            "List the newest transactions",
            "transactions [limit]",
            cmd_transactions,
        ),
        CommandEntry::new(
            "recurring",
            "Create a recurring series",
            "recurring <expense|income> <amount> <description> <category> <frequency> <interval> <count> [account] [--date <start>]",
            cmd_recurring,
        ),
        CommandEntry::new(
            "series",
            "List active recurring series",
            "series",
            cmd_series,
        ),
        CommandEntry::new(
            "stop-series",
            "Stop a recurring series, keeping generated transactions",
            "stop-series <id>",
            cmd_stop_series,
        ),
        CommandEntry::new(
            "budget",
            "Set the monthly budget caps",
            "budget <total> [<category>=<amount> ...]",
            cmd_budget,
        ),
        CommandEntry::new(
            "budget-status",
            "Show budget progress for a month",
            "budget-status <month> <year>",
            cmd_budget_status,
        ),
        CommandEntry::new("backup", "Write a local backup", "backup [note]", cmd_backup),
        CommandEntry::new("backups", "List local backups", "backups", cmd_backups),
        CommandEntry::new(
            "restore",
            "Replace the document with a local backup",
            "restore <backup-id>",
            cmd_restore,
        ),
        CommandEntry::new(
            "delete-backup",
            "Delete a local backup",
            "delete-backup <backup-id>",
            cmd_delete_backup,
        ),
        CommandEntry::new(
            "export",
            "Upload the document to a backup file",
            "export <path>",
            cmd_export,
        ),
        CommandEntry::new(
            "import",
            "Replace the document with an exported file",
            "import <path>",
            cmd_import,
        ),
        CommandEntry::new(
            "config",
            "Show or change settings",
            "config [<key> <value>]",
            cmd_config,
        ),
        CommandEntry::new(
            "reset",
            "Back up, then reset the document to a fresh state",
            "reset",
            cmd_reset,
        ),
        CommandEntry::new("exit", "Leave the shell", "exit", cmd_exit),
    ]);
    registry.alias("quit", "exit");
    registry
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first() {
        let entry = context
            .registry
            .get(&name.to_ascii_lowercase())
            .ok_or_else(|| CommandError::InvalidArguments(format!("unknown command `{name}`")))?;
        output::info(format!("{} - {}", entry.usage, entry.description));
        return Ok(());
    }
    output::section("Commands");
    for entry in context.registry.list() {
        output::info(format!("  {:<20} {}", entry.name, entry.description));
    }
    Ok(())
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let info = build_info::current();
    output::section(info.short());
    output::info(format!("  Built at : {}", info.built_at));
    output::info(format!("  Target   : {}", info.target));
    output::info(format!("  Profile  : {}", info.profile));
    output::info(format!("  Rustc    : {}", info.rustc));
    Ok(())
}

fn cmd_summary(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let filter = parse_summary_filter(args).map_err(|_| context.usage_error("summary"))?;
    let view = context.workspace.documents.aggregate(&filter);
    let currency = context.currency().to_string();

    output::section("Summary");
    output::info(format!("  Transactions : {}", view.transaction_count));
    output::info(format!("  Income       : {}", output::money(view.total_income, &currency)));
    output::info(format!("  Expenses     : {}", output::money(view.total_expenses, &currency)));
    output::info(format!("  Balance      : {}", output::signed_money(view.balance, &currency)));

    if !view.expenses_by_category.is_empty() {
        output::section("Expenses by category");
        for (category, amount) in &view.expenses_by_category {
            output::info(format!("  {:<20} {}", category, output::money(*amount, &currency)));
        }
    }
    if !view.income_by_category.is_empty() {
        output::section("Income by category");
        for (category, amount) in &view.income_by_category {
            output::info(format!("  {:<20} {}", category, output::money(*amount, &currency)));
        }
    }
    output::section("Account balances");
    for account in &view.account_balances {
        output::info(format!(
            "  {:<30} {}",
            account.label,
            output::signed_money(account.balance, &currency)
        ));
    }
    Ok(())
}

pub(crate) fn parse_summary_filter(args: &[&str]) -> Result<AggregateFilter, String> {
    let mut filter = AggregateFilter::total();
    let mut tokens = args.iter().copied();
    while let Some(token) = tokens.next() {
        match token.to_ascii_lowercase().as_str() {
            "total" => filter.period = PeriodFilter::Total,
            "month" => {
                let month = parse_month(tokens.next())?;
                let year = parse_year(tokens.next())?;
                filter.period = PeriodFilter::Month { year, month };
            }
            "year" => filter.period = PeriodFilter::Year {
                year: parse_year(tokens.next())?,
            },
            "account" => {
                let id = tokens.next().ok_or("missing account id")?;
                filter = filter.for_account(normalize_account_id(id));
            }
            other => return Err(format!("unexpected `{other}`")),
        }
    }
    Ok(filter)
}

fn cmd_accounts(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let accounts = context.workspace.documents.read(|doc| doc.accounts.clone());
    output::section("Accounts");
    for account in accounts {
        output::info(format!("  {:<38} {}", account.id, account.display_label()));
    }
    Ok(())
}

fn cmd_add_account(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [bank, number, description] = args else {
        return Err(context.usage_error("add-account"));
    };
    let draft = AccountDraft::new(*bank, *number, *description);
    let committed = context.workspace.documents.save_account(&draft, None)?;
    context.report_commit(&committed);
    output::success(format!("Account created: {}", committed.value));
    Ok(())
}

fn cmd_edit_account(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((id, fields)) = args.split_first().filter(|(_, fields)| !fields.is_empty()) else {
        return Err(context.usage_error("edit-account"));
    };
    let id = normalize_account_id(id);
    let mut draft = context
        .workspace
        .documents
        .read(|doc| {
            doc.account(&id)
                .map(|account| AccountDraft::new(&account.bank, &account.number, &account.description))
        })
        .ok_or_else(|| CoreError::AccountNotFound(id.clone()))?;
    for (field, value) in parse_assignments(fields)? {
        match field {
            "bank" => draft.bank = value.to_string(),
            "number" => draft.number = value.to_string(),
            "description" => draft.description = value.to_string(),
            other => {
                return Err(CommandError::InvalidArguments(format!(
                    "unknown account field `{other}`"
                )))
            }
        }
    }
    let committed = context.workspace.documents.save_account(&draft, Some(id.as_str()))?;
    context.report_commit(&committed);
    output::success(format!("Account updated: {}", committed.value));
    Ok(())
}

fn cmd_delete_account(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [id] = args else {
        return Err(context.usage_error("delete-account"));
    };
    let committed = context.workspace.documents.delete_account(id)?;
    context.report_commit(&committed);
    let removal = &committed.value;
    output::success(format!(
        "Deleted {} with {} transaction(s) and {} series",
        removal.account.display_label(),
        removal.transactions.len(),
        removal.templates.len()
    ));
    Ok(())
}

fn cmd_categories(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let categories = context.workspace.documents.read(|doc| doc.categories.clone());
    output::section("Categories");
    for category in categories {
        if category.subcategories.is_empty() {
            output::info(format!("  {}", category.name));
        } else {
            output::info(format!(
                "  {} ({})",
                category.name,
                category.subcategories.join(", ")
            ));
        }
    }
    Ok(())
}

fn cmd_add_category(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [name] = args else {
        return Err(context.usage_error("add-category"));
    };
    let committed = context.workspace.documents.create_category(name)?;
    context.report_commit(&committed);
    output::success(format!("Category created: {}", name.trim()));
    Ok(())
}

fn cmd_rename_category(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [current, new_name] = args else {
        return Err(context.usage_error("rename-category"));
    };
    let committed = context.workspace.documents.rename_category(current, new_name)?;
    context.report_commit(&committed);
    output::success(format!("Category renamed: {current} -> {}", new_name.trim()));
    Ok(())
}

fn cmd_delete_category(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [name] = args else {
        return Err(context.usage_error("delete-category"));
    };
    let committed = context.workspace.documents.delete_category(name)?;
    context.report_commit(&committed);
    output::success(format!(
        "Category deleted: {} (references moved to {DEFAULT_CATEGORY})",
        committed.value.name
    ));
    Ok(())
}

fn cmd_add_subcategory(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [category, name] = args else {
        return Err(context.usage_error("add-subcategory"));
    };
    let committed = context.workspace.documents.create_subcategory(category, name)?;
    context.report_commit(&committed);
    output::success(format!("Subcategory created: {category} / {}", name.trim()));
    Ok(())
}

fn cmd_rename_subcategory(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [category, current, new_name] = args else {
        return Err(context.usage_error("rename-subcategory"));
    };
    let committed = context
        .workspace
        .documents
        .rename_subcategory(category, current, new_name)?;
    context.report_commit(&committed);
    output::success(format!(
        "Subcategory renamed: {category} / {current} -> {}",
        new_name.trim()
    ));
    Ok(())
}

fn cmd_delete_subcategory(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [category, name] = args else {
        return Err(context.usage_error("delete-subcategory"));
    };
    let committed = context.workspace.documents.delete_subcategory(category, name)?;
    context.report_commit(&committed);
    output::success(format!("Subcategory deleted: {category} / {name}"));
    Ok(())
}

fn cmd_add_expense(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (args, date) = split_date_flag(args)?;
    let (amount, description, category, account, subcategory) = match args.as_slice() {
        [amount, description, category] => (amount, description, category, None, None),
        [amount, description, category, account] => {
            (amount, description, category, Some(*account), None)
        }
        [amount, description, category, account, subcategory] => (
            amount,
            description,
            category,
            Some(*account),
            Some(*subcategory),
        ),
        _ => return Err(context.usage_error("add-expense")),
    };
    let draft = TransactionDraft::expense(
        parse_amount(amount)?,
        *description,
        *category,
        normalize_account_id(account.unwrap_or(CASH_ACCOUNT_ID)),
        date.unwrap_or_else(|| context.workspace.documents.clock().now()),
    )
    .with_subcategory(subcategory.unwrap_or_default());
    save_transaction(context, &draft)
}

fn cmd_add_income(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (args, date) = split_date_flag(args)?;
    let (amount, description, category, account) = match args.as_slice() {
        [amount, description] => (amount, description, DEFAULT_CATEGORY, CASH_ACCOUNT_ID),
        [amount, description, category] => (amount, description, *category, CASH_ACCOUNT_ID),
        [amount, description, category, account] => (amount, description, *category, *account),
        _ => return Err(context.usage_error("add-income")),
    };
    let draft = TransactionDraft::income(
        parse_amount(amount)?,
        *description,
        category,
        normalize_account_id(account),
        date.unwrap_or_else(|| context.workspace.documents.clock().now()),
    );
    save_transaction(context, &draft)
}

fn cmd_withdraw(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (args, date) = split_date_flag(args)?;
    let [amount, account] = args.as_slice() else {
        return Err(context.usage_error("withdraw"));
    };
    let draft = TransactionDraft::expense(
        parse_amount(amount)?,
        "Prelievo contanti",
        WITHDRAWAL_CATEGORY,
        normalize_account_id(account),
        date.unwrap_or_else(|| context.workspace.documents.clock().now()),
    );
    save_transaction(context, &draft)
}

/// Applies `field=value` changes on top of the stored transaction.
fn cmd_edit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((id, fields)) = args.split_first().filter(|(_, fields)| !fields.is_empty()) else {
        return Err(context.usage_error("edit"));
    };
    let mut draft = context
        .workspace
        .documents
        .read(|doc| doc.transaction(id).map(TransactionDraft::from))
        .ok_or_else(|| CoreError::TransactionNotFound(id.to_string()))?;

    let mut subcategory_given = false;
    let mut category_changed = false;
    for (field, value) in parse_assignments(fields)? {
        match field {
            "amount" => draft.amount = parse_amount(value)?,
            "description" => draft.description = value.to_string(),
            "category" => {
                category_changed |= value != draft.category;
                draft.category = value.to_string();
            }
            "subcategory" => {
                subcategory_given = true;
                draft.subcategory = value.to_string();
            }
            "account" => draft.account_id = normalize_account_id(value),
            "date" => draft.timestamp = parse_date(value)?,
            "type" => {
                draft.kind = value
                    .parse::<TransactionKind>()
                    .map_err(CommandError::InvalidArguments)?
            }
            other => {
                return Err(CommandError::InvalidArguments(format!(
                    "unknown transaction field `{other}`"
                )))
            }
        }
    }
    if category_changed && !subcategory_given {
        draft.subcategory.clear();
    }

    let committed = context.workspace.documents.save_transaction(&draft, Some(*id))?;
    context.report_commit(&committed);
    output::success(format!("Transaction updated: {id}"));
    Ok(())
}

fn save_transaction(context: &mut ShellContext, draft: &TransactionDraft) -> CommandResult {
    let committed = context.workspace.documents.save_transaction(draft, None)?;
    context.report_commit(&committed);
    for id in &committed.value {
        output::success(format!("Transaction recorded: {id}"));
    }
    Ok(())
}

fn cmd_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [id] = args else {
        return Err(context.usage_error("delete"));
    };
    let committed = context.workspace.documents.delete_transaction(id)?;
    context.report_commit(&committed);
    output::success(format!("Transaction deleted: {}", committed.value.id));
    Ok(())
}

fn cmd_transactions(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let limit = match args {
        [] => DEFAULT_LISTING_LIMIT,
        [raw] => raw
            .parse::<usize>()
            .map_err(|_| context.usage_error("transactions"))?,
        _ => return Err(context.usage_error("transactions")),
    };
    let currency = context.currency().to_string();
    let rows = context.workspace.documents.read(|doc| {
        doc.transactions
            .iter()
            .take(limit)
            .cloned()
            .collect::<Vec<_>>()
    });
    output::section("Transactions");
    if rows.is_empty() {
        output::info("  (none)");
    }
    for txn in rows {
        let category = if txn.subcategory.is_empty() {
            txn.category.clone()
        } else {
            format!("{} / {}", txn.category, txn.subcategory)
        };
        let marker = if txn.is_recurring { " [R]" } else { "" };
        output::info(format!(
            "  {}  {}  {:<7} {:>14}  {:<24} {:<10} {}{}",
            txn.id,
            txn.timestamp.format("%Y-%m-%d"),
            txn.kind,
            output::money(txn.amount, &currency),
            category,
            txn.account_id,
            txn.description,
            marker
        ));
    }
    Ok(())
}

fn cmd_recurring(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (args, date) = split_date_flag(args)?;
    let (kind, amount, description, category, frequency, interval, count, account) =
        match args.as_slice() {
            [kind, amount, description, category, frequency, interval, count] => (
                kind, amount, description, category, frequency, interval, count, CASH_ACCOUNT_ID,
            ),
            [kind, amount, description, category, frequency, interval, count, account] => {
                (kind, amount, description, category, frequency, interval, count, *account)
            }
            _ => return Err(context.usage_error("recurring")),
        };
    let kind: TransactionKind = kind.parse().map_err(CommandError::InvalidArguments)?;
    let frequency: Frequency = frequency
        .parse()
        .map_err(CommandError::InvalidArguments)?;
    let interval = parse_count("interval", interval)?;
    let count = parse_count("count", count)?;
    let mut base = TransactionDraft::expense(
        parse_amount(amount)?,
        *description,
        *category,
        normalize_account_id(account),
        date.unwrap_or_else(|| context.workspace.documents.clock().now()),
    );
    base.kind = kind;
    let draft = RecurringDraft::new(base, frequency, interval, count);
    let committed = context.workspace.documents.create_recurring(&draft)?;
    context.report_commit(&committed);
    let (id, materialized) = &committed.value;
    output::success(format!(
        "Series created: {id} ({}, {materialized} occurrence(s) recorded)",
        frequency.label(interval)
    ));
    Ok(())
}

fn cmd_series(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let currency = context.currency().to_string();
    let templates = context
        .workspace
        .documents
        .read(|doc| doc.recurring_transactions.clone());
    output::section("Recurring series");
    if templates.is_empty() {
        output::info("  (none)");
    }
    for template in templates {
        output::info(format!(
            "  {}  {:>14}  {:<20} {:<18} next {}  {}/{}",
            template.id,
            output::money(template.amount, &currency),
            template.category,
            template.frequency.label(template.interval),
            template.next_due_date.format("%Y-%m-%d"),
            template.generated_count,
            template.count
        ));
    }
    Ok(())
}

fn cmd_stop_series(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [id] = args else {
        return Err(context.usage_error("stop-series"));
    };
    let committed = context.workspace.documents.delete_recurring(id)?;
    context.report_commit(&committed);
    output::success(format!(
        "Series stopped: {} ({} occurrence(s) kept)",
        committed.value.id, committed.value.generated_count
    ));
    Ok(())
}

fn cmd_budget(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((total, rest)) = args.split_first() else {
        return Err(context.usage_error("budget"));
    };
    let mut per_category = BTreeMap::new();
    for pair in rest {
        let (name, amount) = pair
            .split_once('=')
            .ok_or_else(|| context.usage_error("budget"))?;
        per_category.insert(name.trim().to_string(), BudgetService::parse_input(amount));
    }
    let committed = context
        .workspace
        .documents
        .save_budgets(BudgetService::parse_input(total), per_category)?;
    context.report_commit(&committed);
    output::success("Budgets saved");
    Ok(())
}

fn cmd_budget_status(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [month, year] = args else {
        return Err(context.usage_error("budget-status"));
    };
    let month = parse_month(Some(*month)).map_err(CommandError::InvalidArguments)?;
    let year = parse_year(Some(*year)).map_err(CommandError::InvalidArguments)?;
    let currency = context.currency().to_string();

    let total = context.workspace.documents.total_budget_progress(month, year);
    let categories = context.workspace.documents.read(|doc| {
        SummaryService::budgeted_categories(&doc.transactions, &doc.budgets, month, year)
    });

    output::section(format!("Budget {month:02}/{year}"));
    for progress in std::iter::once(&total).chain(categories.iter()) {
        let label = progress.category.as_deref().unwrap_or("Total");
        let percentage = progress
            .percentage
            .map(|pct| format!("{pct:.0}%"))
            .unwrap_or_else(|| "-".into());
        output::info(format!(
            "  {:<20} {:>14} / {:<14} {:>5}  {}",
            label,
            output::money(progress.spent, &currency),
            output::money(progress.cap, &currency),
            percentage,
            output::band_label(progress.band)
        ));
    }
    Ok(())
}

fn cmd_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let note = (!args.is_empty()).then(|| args.join(" "));
    let backup = context.workspace.documents.backup_local(note.as_deref())?;
    output::success(format!("Backup written: {}", backup.id));
    Ok(())
}

fn cmd_backups(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let backups = context.workspace.documents.list_local_backups()?;
    output::section("Backups");
    if backups.is_empty() {
        output::info("  (none)");
    }
    for backup in backups {
        let kept = if backup.is_automatic() { "" } else { "  [kept]" };
        output::info(format!("  {}  {}{kept}", backup.created_at, backup.id));
    }
    Ok(())
}

fn cmd_restore(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [id] = args else {
        return Err(context.usage_error("restore"));
    };
    let backup = find_backup(context, id)?;
    let committed = context.workspace.documents.restore_local(&backup)?;
    context.report_commit(&committed);
    for migration in &committed.value.migrations {
        output::info(format!("  migrated: {migration}"));
    }
    for warning in &committed.value.warnings {
        output::warning(warning);
    }
    output::success(format!("Restored {}", backup.id));
    Ok(())
}

fn cmd_delete_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [id] = args else {
        return Err(context.usage_error("delete-backup"));
    };
    let backup = find_backup(context, id)?;
    context.workspace.documents.delete_local_backup(&backup)?;
    output::success(format!("Backup deleted: {}", backup.id));
    Ok(())
}

fn find_backup(context: &ShellContext, id: &str) -> Result<spese_core::BackupInfo, CommandError> {
    context
        .workspace
        .documents
        .list_local_backups()?
        .into_iter()
        .find(|backup| backup.id == id)
        .ok_or_else(|| CommandError::InvalidArguments(format!("no backup named `{id}`")))
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [path] = args else {
        return Err(context.usage_error("export"));
    };
    let target = FileBackupTarget::new(*path);
    let bytes = context.workspace.documents.upload_backup(&target)?;
    output::success(format!("Exported {bytes} bytes to {}", target.path().display()));
    Ok(())
}

fn cmd_import(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [path] = args else {
        return Err(context.usage_error("import"));
    };
    let target = FileBackupTarget::new(*path);
    let committed = context.workspace.documents.restore_from(&target)?;
    context.report_commit(&committed);
    for warning in &committed.value.warnings {
        output::warning(warning);
    }
    output::success(format!("Imported {}", target.path().display()));
    Ok(())
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] => {
            let config = &context.workspace.config;
            output::section("Configuration");
            output::info(format!("  currency                      : {}", config.currency));
            output::info(format!("  ui_color_enabled              : {}", config.ui_color_enabled));
            output::info(format!("  backup_retention              : {}", config.backup_retention));
            output::info(format!(
                "  clear_subcategories_on_rename : {}",
                config.clear_subcategories_on_rename
            ));
            output::info(format!(
                "  data_root                     : {}",
                config.resolve_data_root(&context.workspace.home).display()
            ));
            output::info(format!(
                "  backup_root                   : {}",
                config.resolve_backup_root(&context.workspace.home).display()
            ));
            Ok(())
        }
        [key, value] => {
            context.workspace.config.set(key, value)?;
            context.workspace.save_config()?;
            if *key == "ui_color_enabled" {
                output::set_color_enabled(context.workspace.config.ui_color_enabled);
            }
            output::success(format!("{key} updated (storage settings apply on next start)"));
            Ok(())
        }
        _ => Err(context.usage_error("config")),
    }
}

fn cmd_reset(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let backup = context.workspace.documents.backup_local(Some("before-reset"))?;
    let committed = context.workspace.documents.reset()?;
    context.report_commit(&committed);
    output::success(format!("Document reset (previous state saved as {})", backup.id));
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}

/// Parses a user-typed amount, accepting `,` as decimal separator.
pub(crate) fn parse_amount(raw: &str) -> Result<f64, CommandError> {
    raw.trim()
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| CommandError::InvalidArguments(format!("`{raw}` is not an amount")))
}

fn parse_count(label: &str, raw: &str) -> Result<u32, CommandError> {
    raw.parse::<u32>()
        .map_err(|_| CommandError::InvalidArguments(format!("{label} must be a whole number, got `{raw}`")))
}

fn parse_month(raw: Option<&str>) -> Result<u32, String> {
    raw.and_then(|value| value.parse::<u32>().ok())
        .filter(|month| (1..=12).contains(month))
        .ok_or_else(|| "month must be between 1 and 12".to_string())
}

fn parse_year(raw: Option<&str>) -> Result<i32, String> {
    raw.and_then(|value| value.parse::<i32>().ok())
        .ok_or_else(|| "year must be a number".to_string())
}

/// Parses `YYYY-MM-DD` or `DD/MM/YYYY` as noon UTC of that day.
pub(crate) fn parse_date(raw: &str) -> Result<DateTime<Utc>, CommandError> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw.trim(), format).ok())
        .map(|day| day.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default()).and_utc())
        .ok_or_else(|| {
            CommandError::InvalidArguments(format!("`{raw}` is not a date (use YYYY-MM-DD)"))
        })
}

/// Removes `--date <day>` (or `--date=<day>`) from `args`.
fn split_date_flag<'a>(
    args: &[&'a str],
) -> Result<(Vec<&'a str>, Option<DateTime<Utc>>), CommandError> {
    let mut rest = Vec::with_capacity(args.len());
    let mut date = None;
    let mut tokens = args.iter().copied();
    while let Some(token) = tokens.next() {
        let value = if token == DATE_FLAG {
            Some(tokens.next().ok_or_else(|| {
                CommandError::InvalidArguments(format!("{DATE_FLAG} needs a value"))
            })?)
        } else {
            token.strip_prefix(DATE_FLAG).and_then(|tail| tail.strip_prefix('='))
        };
        match value {
            Some(value) => date = Some(parse_date(value)?),
            None => rest.push(token),
        }
    }
    Ok((rest, date))
}

fn parse_assignments<'a>(fields: &[&'a str]) -> Result<Vec<(&'a str, &'a str)>, CommandError> {
    fields
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(field, value)| (field.trim(), value.trim()))
                .ok_or_else(|| {
                    CommandError::InvalidArguments(format!("expected <field>=<value>, got `{pair}`"))
                })
        })
        .collect()
}

/// `cash` is accepted for the reserved cash account.
fn normalize_account_id(raw: &str) -> String {
    if raw.eq_ignore_ascii_case(CASH_ACCOUNT_ID) {
        CASH_ACCOUNT_ID.to_string()
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use spese_core::AccountFilter;

    #[test]
    fn summary_filter_defaults_to_total() {
        let filter = parse_summary_filter(&[]).unwrap();
        assert_eq!(filter, AggregateFilter::total());
    }

    #[test]
    fn summary_filter_reads_period_and_account() {
        let filter = parse_summary_filter(&["month", "3", "2024", "account", "Acc-1"]).unwrap();
        assert_eq!(filter.period, PeriodFilter::Month { year: 2024, month: 3 });
        assert_eq!(filter.account, AccountFilter::Account("Acc-1".into()));

        let filter = parse_summary_filter(&["year", "2023", "account", "cash"]).unwrap();
        assert_eq!(filter.period, PeriodFilter::Year { year: 2023 });
        assert_eq!(filter.account, AccountFilter::Account(CASH_ACCOUNT_ID.into()));
    }

    #[test]
    fn summary_filter_rejects_bad_input() {
        assert!(parse_summary_filter(&["month", "13", "2024"]).is_err());
        assert!(parse_summary_filter(&["week"]).is_err());
        assert!(parse_summary_filter(&["account"]).is_err());
    }

    #[test]
    fn amounts_accept_comma_decimals() {
        assert_eq!(parse_amount("12,50").unwrap(), 12.5);
        assert_eq!(parse_amount(" 7 ").unwrap(), 7.0);
        assert!(parse_amount("abc").is_err());
    }

    #[test]
    fn dates_accept_iso_and_italian_order() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
        assert_eq!(parse_date("2024-03-05").unwrap(), expected);
        assert_eq!(parse_date("05/03/2024").unwrap(), expected);
        assert!(parse_date("2024-13-01").is_err());
    }

    #[test]
    fn date_flag_is_removed_from_positional_arguments() {
        let (rest, date) = split_date_flag(&["10", "Pizza", "--date", "2024-01-02", "Cibo"]).unwrap();
        assert_eq!(rest, vec!["10", "Pizza", "Cibo"]);
        assert_eq!(date, Some(Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap()));

        let (rest, date) = split_date_flag(&["--date=01/02/2024", "5"]).unwrap();
        assert_eq!(rest, vec!["5"]);
        assert_eq!(date, Some(Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap()));

        assert!(split_date_flag(&["5", "--date"]).is_err());
        assert_eq!(split_date_flag(&["5"]).unwrap(), (vec!["5"], None));
    }

    #[test]
    fn assignments_split_on_first_equals() {
        let pairs = parse_assignments(&["description=a=b", " amount = 3 "]).unwrap();
        assert_eq!(pairs, vec![("description", "a=b"), ("amount", "3")]);
        assert!(parse_assignments(&["amount"]).is_err());
    }

    #[test]
    fn registry_knows_every_command() {
        let registry = registry();
        for name in [
            "help", "version", "summary", "accounts", "add-account", "delete-account",
            "categories", "add-category", "rename-category", "delete-category",
            "add-subcategory", "delete-subcategory", "add-expense", "add-income", "withdraw",
            "delete", "transactions", "recurring", "budget", "budget-status", "backup", "reset",
            "exit", "quit", "edit", "edit-account", "delete-backup",
        ] {
            assert!(registry.get(name).is_some(), "missing command {name}");
        }
    }
}

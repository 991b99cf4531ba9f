use std::collections::HashMap;

use strsim::levenshtein;
use thiserror::Error;
use tracing::warn;

use spese_config::ConfigError;
use spese_core::{Committed, CoreError, SyncOutcome};

use crate::cli::output;
use crate::errors::AppError;
use crate::utils::persistence::Workspace;

const MAX_SUGGESTION_DISTANCE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    App(#[from] AppError),
    #[error("exit requested")]
    ExitRequested,
}

impl From<CoreError> for CommandError {
    fn from(err: CoreError) -> Self {
        CommandError::App(err.into())
    }
}

impl From<ConfigError> for CommandError {
    fn from(err: ConfigError) -> Self {
        CommandError::App(err.into())
    }
}

pub type CommandResult = Result<(), CommandError>;

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

pub struct CommandEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
}

impl CommandEntry {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            handler,
        }
    }
}

/// Commands in registration order, looked up by name or alias.
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<CommandEntry>,
    index: HashMap<&'static str, usize>,
}

impl CommandRegistry {
    pub fn new(entries: Vec<CommandEntry>) -> Self {
        let mut registry = Self::default();
        for entry in entries {
            registry.register(entry);
        }
        registry
    }

    pub fn register(&mut self, entry: CommandEntry) {
        if let Some(slot) = self.index.get(entry.name) {
            self.commands[*slot] = entry;
            return;
        }
        self.index.insert(entry.name, self.commands.len());
        self.commands.push(entry);
    }

    pub fn alias(&mut self, alias: &'static str, target: &str) {
        if let Some(slot) = self.index.get(target).copied() {
            self.index.insert(alias, slot);
        }
    }

    pub fn get(&self, name: &str) -> Option<&CommandEntry> {
        self.index.get(name).map(|slot| &self.commands[*slot])
    }

    pub fn list(&self) -> &[CommandEntry] {
        &self.commands
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.index.keys().copied().collect()
    }

    /// Closest known name within an edit distance of 3.
    pub fn suggest(&self, input: &str) -> Option<&'static str> {
        self.index
            .keys()
            .map(|name| (levenshtein(name, input), *name))
            .filter(|(distance, _)| *distance <= MAX_SUGGESTION_DISTANCE)
            .min()
            .map(|(_, name)| name)
    }
}

pub struct ShellContext {
    pub mode: CliMode,
    pub workspace: Workspace,
    pub registry: CommandRegistry,
    pub running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode, workspace: Workspace) -> Self {
        output::set_color_enabled(workspace.config.ui_color_enabled);
        Self {
            mode,
            workspace,
            registry: crate::cli::commands::registry(),
            running: true,
        }
    }

    pub fn prompt(&self) -> String {
        "spese> ".to_string()
    }

    pub fn currency(&self) -> &str {
        &self.workspace.config.currency
    }

    pub(crate) fn dispatch(&mut self, command: &str, args: &[&str]) -> Result<LoopControl, CommandError> {
        let Some(handler) = self.registry.get(command).map(|entry| entry.handler) else {
            output::warning(format!("Unknown command `{command}`. Type `help` for a list."));
            if let Some(best) = self.registry.suggest(command) {
                output::info(format!("Did you mean `{best}`?"));
            }
            return Ok(LoopControl::Continue);
        };
        match handler(self, args) {
            Ok(()) => Ok(LoopControl::Continue),
            Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
            Err(err) => Err(err),
        }
    }

    /// Prints the usage line of `command` as an argument error.
    pub fn usage_error(&self, command: &str) -> CommandError {
        let usage = self
            .registry
            .get(command)
            .map(|entry| entry.usage)
            .unwrap_or(command);
        CommandError::InvalidArguments(format!("usage: {usage}"))
    }

    pub fn report_error(&self, err: &CommandError) {
        output::error(err);
    }

    /// Surfaces the non-fatal parts of a commit: persistence and calendar failures.
    pub fn report_commit<T>(&self, committed: &Committed<T>) {
        if let Some(reason) = &committed.persist_error {
            warn!(%reason, "change kept in memory only");
            output::warning(format!("Change not saved to disk: {reason}"));
        }
        for failure in committed.sync_failures() {
            if let SyncOutcome::Failed {
                transaction_id,
                reason,
            } = failure
            {
                let subject = transaction_id.as_deref().unwrap_or("event");
                output::warning(format!("Calendar sync failed for {subject}: {reason}"));
            }
        }
    }
}

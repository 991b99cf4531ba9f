use std::{
    borrow::Cow,
    io::{self, BufRead, IsTerminal},
};

use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::Validator,
    Context as ReadlineContext, Editor, Helper,
};
use tracing::debug;

use spese_config::ConfigManager;

use crate::cli::context::{CliMode, CommandError, LoopControl, ShellContext};
use crate::cli::output;
use crate::errors::AppError;
use crate::utils::persistence::{resolve_home, Workspace};

/// Forces script mode (commands read from stdin) when set.
pub const SCRIPT_ENV: &str = "SPESE_CLI_SCRIPT";

pub fn run_cli() -> Result<(), AppError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() || !io::stdin().is_terminal() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };

    let home = resolve_home();
    let config = ConfigManager::with_base_dir(home.clone())?.load()?;
    crate::init_with_filter(config.log_filter.as_deref());
    let workspace = Workspace::open(&home)?;
    debug!(home = %home.display(), ?mode, "shell starting");

    let mut context = ShellContext::new(mode, workspace);
    let materialized = context.workspace.documents.load_report().materialized;
    if materialized > 0 {
        output::info(format!("{materialized} recurring occurrence(s) recorded since last run."));
    }

    match mode {
        CliMode::Interactive => run_interactive(&mut context),
        CliMode::Script => run_script(&mut context),
    }
}

fn run_interactive(context: &mut ShellContext) -> Result<(), AppError> {
    let mut editor = Editor::<CommandHelper, DefaultHistory>::new()?;
    editor.set_helper(Some(CommandHelper::new(context.registry.names())));
    output::info("Type `help` for the list of commands; Tab completes command names.");

    while context.running {
        match editor.readline(&context.prompt()) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                editor.add_history_entry(trimmed).ok();
                if handle_line(context, trimmed) == LoopControl::Exit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

fn run_script(context: &mut ShellContext) -> Result<(), AppError> {
    for line in io::stdin().lock().lines() {
        let line = line?;
        if handle_line(context, &line) == LoopControl::Exit {
            break;
        }
    }
    Ok(())
}

/// Runs one input line; command failures are reported, never fatal.
pub(crate) fn handle_line(context: &mut ShellContext, line: &str) -> LoopControl {
    let tokens = match shell_words::split(line) {
        Ok(tokens) => tokens,
        Err(err) => {
            output::warning(format!("Could not parse input: {err}"));
            return LoopControl::Continue;
        }
    };
    let Some((command, rest)) = tokens.split_first() else {
        return LoopControl::Continue;
    };
    if command.starts_with('#') {
        return LoopControl::Continue;
    }
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();

    match context.dispatch(&command.to_ascii_lowercase(), &args) {
        Ok(LoopControl::Exit) => {
            context.running = false;
            LoopControl::Exit
        }
        Ok(LoopControl::Continue) => LoopControl::Continue,
        Err(err) => {
            report(context, &err);
            LoopControl::Continue
        }
    }
}

fn report(context: &ShellContext, err: &CommandError) {
    debug!(error = %err, "command failed");
    context.report_error(err);
}

struct CommandHelper {
    commands: Vec<String>,
}

impl CommandHelper {
    fn new(names: Vec<&'static str>) -> Self {
        let mut commands: Vec<String> = names.into_iter().map(str::to_string).collect();
        commands.sort();
        commands.dedup();
        Self { commands }
    }
}

impl Helper for CommandHelper {}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];
        // Only the first word is completed.
        if prefix.trim_start().contains(char::is_whitespace) {
            return Ok((pos, Vec::new()));
        }
        let start = prefix.len() - prefix.trim_start().len();
        let needle = prefix[start..].to_ascii_lowercase();
        let candidates = self
            .commands
            .iter()
            .filter(|name| name.starts_with(&needle))
            .map(|name| Pair {
                display: name.clone(),
                replacement: name.clone(),
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Hinter for CommandHelper {
    type Hint = String;
}

impl Highlighter for CommandHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Borrowed(line)
    }
}

impl Validator for CommandHelper {}

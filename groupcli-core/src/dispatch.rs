//! Dispatch: parse tokens, resolve one command, run its hook and handler,
//! and map the result to an [`Outcome`].

use std::collections::HashSet;
use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{ArgGroup, ArgMatches, Command};
use tracing::debug;

use crate::handler::HandlerError;
use crate::namespace::Namespace;
use crate::options::{self, DispatchOptions};
use crate::registry::{CommandDef, GroupBuilder, GroupHandle, Registry};
use crate::report::{self, Verbosity};

/// Exit status of a failed handler or hook.
pub const EXIT_FAILURE: i32 = 1;

/// Exit status when no runnable command was selected.
pub const EXIT_USAGE: i32 = 2;

/// Result of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The handler returned normally.
    Completed,
    /// Help or version text was requested and printed.
    HelpDisplayed,
    /// The parser rejected the tokens; its message went to the error stream.
    UsageError { code: i32 },
    /// A group (or nothing) was named without a command; usage was printed.
    NoCommandSelected { group: Option<String> },
    /// The hook or the handler failed and the failure was reported.
    HandlerFailed { kind: String },
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Completed | Outcome::HelpDisplayed => 0,
            Outcome::UsageError { code } => *code,
            Outcome::NoCommandSelected { .. } => EXIT_USAGE,
            Outcome::HandlerFailed { .. } => EXIT_FAILURE,
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code() == 0
    }

    /// Terminate the process with this outcome's exit status.
    pub fn exit(self) -> ! {
        std::process::exit(self.exit_code())
    }
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        ExitCode::from(u8::try_from(outcome.exit_code()).unwrap_or(1))
    }
}

/// Owns the registry and runs dispatches against it.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    registry: Registry,
    options: DispatchOptions,
}

impl Dispatcher {
    pub fn new(options: DispatchOptions) -> Self {
        Self {
            registry: Registry::new(),
            options,
        }
    }

    pub fn with_registry(registry: Registry, options: DispatchOptions) -> Self {
        Self { registry, options }
    }

    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Start declaring a group. See [`Registry::group`].
    pub fn group(&mut self, name: impl Into<String>) -> GroupBuilder<'_> {
        self.registry.group(name)
    }

    /// Reopen a declared group. See [`Registry::handle`].
    pub fn handle(&mut self, name: &str) -> Option<GroupHandle<'_>> {
        self.registry.handle(name)
    }

    /// The parser for everything declared so far.
    pub fn build_parser(&self) -> Command {
        let mut parser = Command::new(self.options.prog.clone()).disable_help_subcommand(true);
        if let Some(about) = &self.options.about {
            parser = parser.about(about.clone());
        }
        if let Some(version) = &self.options.version {
            parser = parser.version(version.clone());
        }

        for group in self.registry.groups() {
            let mut sub = Command::new(group.name().to_string()).disable_help_subcommand(true);
            if let Some(help) = group.help() {
                sub = sub.about(help.to_string());
            }
            for command in group.commands() {
                sub = sub.subcommand(command_parser(command));
            }
            parser = parser.subcommand(sub);
        }
        parser
    }

    /// Dispatch the process arguments, writing to stdout and stderr.
    pub fn run(&self) -> Outcome {
        self.run_from(std::env::args_os().skip(1))
    }

    /// Dispatch `tokens` (without the program name), writing to stdout and stderr.
    pub fn run_from<I, T>(&self, tokens: I) -> Outcome
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let stdout = io::stdout();
        let stderr = io::stderr();
        self.run_with(tokens, &mut stdout.lock(), &mut stderr.lock())
    }

    /// Dispatch `tokens` (without the program name). Help and usage text go
    /// to `out`; parser errors and failure reports go to `err`.
    pub fn run_with<I, T>(&self, tokens: I, out: &mut dyn Write, err: &mut dyn Write) -> Outcome
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        if self.options.init_tracing {
            options::init_tracing(self.options.log_level);
        }

        let parser = self.build_parser();
        let argv = std::iter::once(OsString::from(&self.options.prog))
            .chain(tokens.into_iter().map(Into::into));

        let matches = match parser.clone().try_get_matches_from(argv) {
            Ok(matches) => matches,
            Err(e) => return parse_failure(e, out, err),
        };

        let Some((group_name, group_matches)) = matches.subcommand() else {
            return self.no_command_selected(parser, None, out);
        };
        let Some((command_name, command_matches)) = group_matches.subcommand() else {
            return self.no_command_selected(parser, Some(group_name), out);
        };
        let Some(command) = self.registry.command(group_name, command_name) else {
            return self.no_command_selected(parser, Some(group_name), out);
        };

        debug!(group = group_name, command = command_name, "dispatching");
        let mut args = namespace_from(command, command_matches);
        if let Some(processor) = command.arg_processor() {
            args = match processor.apply(args) {
                Ok(args) => args,
                Err(e) => return self.failure(e, err),
            };
        }

        match command.handler().call(&args) {
            Ok(()) => {
                debug!(group = group_name, command = command_name, "completed");
                Outcome::Completed
            }
            Err(e) => self.failure(e, err),
        }
    }

    /// Nothing runnable was named: print usage for the deepest scope that
    /// was, by asking the parser for help on it.
    fn no_command_selected(
        &self,
        parser: Command,
        group: Option<&str>,
        out: &mut dyn Write,
    ) -> Outcome {
        debug!(group, "no command selected");
        let mut argv = vec![self.options.prog.clone()];
        argv.extend(group.map(str::to_string));
        argv.push("--help".to_string());

        let mut help_parser = parser.clone();
        let text = match parser.try_get_matches_from(argv) {
            Err(e) => e.render().to_string(),
            Ok(_) => help_parser.render_help().to_string(),
        };
        emit(out, &text);
        Outcome::NoCommandSelected {
            group: group.map(str::to_string),
        }
    }

    fn failure(&self, error: HandlerError, err: &mut dyn Write) -> Outcome {
        debug!(kind = error.kind(), "command failed");
        if let Err(e) = report::report(&error, Verbosity::from_debug(self.options.debug), err) {
            debug!(error = %e, "could not write failure report");
        }
        Outcome::HandlerFailed {
            kind: error.kind().to_string(),
        }
    }
}

fn parse_failure(e: clap::Error, out: &mut dyn Write, err: &mut dyn Write) -> Outcome {
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            emit(out, &e.render().to_string());
            Outcome::HelpDisplayed
        }
        _ => {
            emit(err, &e.render().to_string());
            Outcome::UsageError {
                code: e.exit_code(),
            }
        }
    }
}

fn command_parser(command: &CommandDef) -> Command {
    let exclusive: HashSet<&str> = command
        .mutually_exclusive()
        .iter()
        .map(String::as_str)
        .collect();

    let mut parser = Command::new(command.name().to_string());
    if let Some(about) = command.about() {
        parser = parser.about(about.to_string());
    }
    for decl in command.arguments().iter() {
        parser = parser.arg(decl.to_arg(exclusive.contains(decl.name())));
    }

    if !exclusive.is_empty() {
        let ids: Vec<String> = command
            .mutually_exclusive()
            .iter()
            .filter_map(|name| command.arguments().get(name))
            .map(|decl| decl.dest().to_string())
            .collect();
        parser = parser.group(
            ArgGroup::new("exclusive-set")
                .args(ids)
                .required(true)
                .multiple(false),
        );
    }
    parser
}

fn namespace_from(command: &CommandDef, matches: &ArgMatches) -> Namespace {
    let mut args = Namespace::new(command.group(), command.name());
    for decl in command.arguments().iter() {
        args.set(decl.dest(), decl.extract(matches));
    }
    args
}

/// Write parser output. A closed stream does not change the outcome.
fn emit(w: &mut dyn Write, text: &str) {
    if let Err(e) = w.write_all(text.as_bytes()).and_then(|()| w.flush()) {
        debug!(error = %e, "could not write parser output");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::ArgSpec;

    #[test]
    fn exit_codes() {
        assert_eq!(Outcome::Completed.exit_code(), 0);
        assert_eq!(Outcome::HelpDisplayed.exit_code(), 0);
        assert_eq!(Outcome::UsageError { code: 2 }.exit_code(), 2);
        assert_eq!(Outcome::NoCommandSelected { group: None }.exit_code(), EXIT_USAGE);
        assert_eq!(
            Outcome::HandlerFailed {
                kind: "ValueError".into()
            }
            .exit_code(),
            EXIT_FAILURE
        );
    }

    #[test]
    fn parser_mirrors_the_registry() {
        let mut dispatcher = Dispatcher::new(DispatchOptions::new("prog"));
        let mut group = dispatcher
            .group("files")
            .help("File operations")
            .argument("path", ArgSpec::path())
            .declare()
            .unwrap();
        group.command("show").about("Show a file").register(|_| Ok(())).unwrap();
        group
            .command("stat")
            .argument("--all", ArgSpec::flag())
            .argument("--one", ArgSpec::flag())
            .mutually_exclusive(["--all", "--one"])
            .register(|_| Ok(()))
            .unwrap();

        let parser = dispatcher.build_parser();
        parser.clone().debug_assert();

        let files = parser.find_subcommand("files").unwrap();
        assert_eq!(files.get_about().map(ToString::to_string).as_deref(), Some("File operations"));
        let names: Vec<_> = files.get_subcommands().map(|c| c.get_name().to_string()).collect();
        assert_eq!(names, ["show", "stat"]);

        let stat = files.find_subcommand("stat").unwrap();
        assert_eq!(stat.get_groups().count(), 1);
        assert!(stat.get_arguments().any(|a| a.get_id() == "path" && a.is_required_set()));
    }
}

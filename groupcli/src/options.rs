//! Launcher options.
//!
//! Options that configure the dispatcher itself are parsed before the group
//! token; everything from the group on is handed to the dispatcher as is.

use clap::builder::FalseyValueParser;
use clap::Parser;

use groupcli_core::{DispatchOptions, LogLevel};

/// Command-line arguments for the launcher.
#[derive(Parser, Debug)]
#[command(
    name = "groupcli",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Launcher {
    /// Report failures with their cause chain and stack trace
    #[arg(long, env = "GROUPCLI_DEBUG", value_parser = FalseyValueParser::new())]
    pub debug: bool,

    /// Suppress all log output except errors
    #[arg(long, env = "GROUPCLI_QUIET", value_parser = FalseyValueParser::new())]
    pub quiet: bool,

    /// Group, command and their arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub tokens: Vec<String>,
}

impl Launcher {
    /// Convert launcher flags to dispatcher options
    pub fn dispatch_options(&self) -> DispatchOptions {
        let log_level = if self.debug {
            LogLevel::Debug
        } else if self.quiet {
            LogLevel::Quiet
        } else {
            LogLevel::Normal
        };

        DispatchOptions::new("groupcli")
            .about("Text and number utilities organised in command groups")
            .version(env!("CARGO_PKG_VERSION"))
            .debug(self.debug)
            .init_tracing(log_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launcher_flags_stop_at_the_group() {
        let launcher =
            Launcher::try_parse_from(["groupcli", "--debug", "math", "add", "1", "--precision", "3"])
                .unwrap();
        assert!(launcher.debug);
        assert_eq!(launcher.tokens, ["math", "add", "1", "--precision", "3"]);

        let options = launcher.dispatch_options();
        assert!(options.debug);
        assert_eq!(options.log_level, LogLevel::Debug);
    }

    #[test]
    fn help_passes_through() {
        let launcher = Launcher::try_parse_from(["groupcli", "--help"]).unwrap();
        assert_eq!(launcher.tokens, ["--help"]);
        assert!(!launcher.dispatch_options().debug);
    }
}

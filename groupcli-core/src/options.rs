//! Dispatcher configuration.

use tracing_subscriber::EnvFilter;

/// Log level used when the dispatcher installs its own subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    #[default]
    Normal,
    Quiet,
}

impl LogLevel {
    fn filter(self) -> &'static str {
        match self {
            LogLevel::Debug => "groupcli_core=debug,groupcli=debug",
            LogLevel::Normal => "groupcli_core=warn,groupcli=warn",
            LogLevel::Quiet => "groupcli_core=error,groupcli=error",
        }
    }
}

/// Configuration options for a [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// Program name shown in usage lines
    pub prog: String,

    /// Top-level description
    pub about: Option<String>,

    /// Version reported by `--version`, if any
    pub version: Option<String>,

    /// Report handler failures with their cause chain and stack trace
    pub debug: bool,

    /// Whether to install a tracing subscriber on first dispatch
    pub init_tracing: bool,

    /// Level for the installed subscriber; `RUST_LOG` takes precedence
    pub log_level: LogLevel,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            prog: env!("CARGO_PKG_NAME").to_string(),
            about: None,
            version: None,
            debug: false,
            init_tracing: false,
            log_level: LogLevel::Normal,
        }
    }
}

impl DispatchOptions {
    pub fn new(prog: impl Into<String>) -> Self {
        Self {
            prog: prog.into(),
            ..Self::default()
        }
    }

    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn init_tracing(mut self, log_level: LogLevel) -> Self {
        self.init_tracing = true;
        self.log_level = log_level;
        self
    }
}

/// Install a stderr subscriber. A subscriber that is already installed
/// stays in place.
pub(crate) fn init_tracing(log_level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.filter()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

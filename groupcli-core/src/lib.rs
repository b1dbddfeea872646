//! Declarative command groups over clap.
//!
//! Callers declare named groups, each with arguments shared by all of its
//! commands, then declare commands inside a group with their own arguments
//! and a handler. At dispatch time the tokens are parsed, exactly one command
//! is resolved, the group's argument hook runs, the handler is invoked and
//! the result becomes an exit status.
//!
//! ```no_run
//! use groupcli_core::prelude::*;
//!
//! fn main() -> std::process::ExitCode {
//!     let mut dispatcher = Dispatcher::new(DispatchOptions::new("tool"));
//!     let mut vcf = dispatcher
//!         .group("vcf")
//!         .argument("path", ArgSpec::new().help("location of the VCF"))
//!         .argument("--billing-project", ArgSpec::new().required(false))
//!         .declare()
//!         .expect("valid declaration");
//!
//!     vcf.command("stat")
//!         .register(|args: &Namespace| {
//!             println!("{}", args.get_str("path").unwrap_or_default());
//!             Ok(())
//!         })
//!         .expect("valid declaration");
//!
//!     dispatcher.run().into()
//! }
//! ```

mod dispatch;
mod error;
mod handler;
mod namespace;
mod options;
mod registry;
mod report;
mod spec;

pub use dispatch::{Dispatcher, Outcome, EXIT_FAILURE, EXIT_USAGE};
pub use error::{ConfigError, Result};
pub use handler::{ArgProcessor, Handler, HandlerError, HandlerResult};
pub use namespace::Namespace;
pub use options::{DispatchOptions, LogLevel};
pub use registry::{CommandBuilder, CommandDef, GroupBuilder, GroupDef, GroupHandle, Registry};
pub use report::{render, report, Verbosity};
pub use spec::{ArgAction, ArgDecl, ArgKind, ArgSpec, ArgTable, ArgType};

/// Re-export for handlers building values.
pub use serde_json::Value;

/// Prelude module for commonly used types
pub mod prelude {
    pub use crate::{
        ArgAction, ArgSpec, ArgType, ConfigError, DispatchOptions, Dispatcher, HandlerError,
        HandlerResult, LogLevel, Namespace, Outcome, Value,
    };
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

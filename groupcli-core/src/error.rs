use thiserror::Error;

/// Declaration-time errors. These surface from the `declare`/`register`
/// calls themselves and never reach dispatch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Group already declared: {0}")]
    DuplicateGroup(String),

    #[error("Command already declared in group {group}: {command}")]
    DuplicateCommand { group: String, command: String },

    #[error("Unknown group: {0}")]
    UnknownGroup(String),

    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    #[error("Invalid argument name: {0:?}")]
    InvalidArgumentName(String),

    #[error("Argument name is reserved: {0}")]
    ReservedArgument(String),

    #[error("Arguments {first} and {second} of command {command} share the destination {dest}")]
    DuplicateDestination {
        command: String,
        dest: String,
        first: String,
        second: String,
    },

    #[error("Mutually exclusive argument {argument} is not declared for command {command}")]
    UnknownExclusiveArgument { command: String, argument: String },

    #[error("Mutually exclusive argument must be an optional flag or option: {0}")]
    ExclusiveNotOptional(String),

    #[error("Invalid specification for argument {name}: {reason}")]
    InvalidSpec { name: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

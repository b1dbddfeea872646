//! Argument specifications.
//!
//! An argument is declared by name plus an [`ArgSpec`] record. The name
//! decides the shape on the command line: `"path"` is positional,
//! `"--dry-run"` is a long option and `"-v"` a short one. Every field of the
//! record is optional; `ArgSpec::default()` accepts the argument with the
//! parser's defaults.

use std::path::PathBuf;

use clap::builder::{BoolishValueParser, PossibleValuesParser, TypedValueParser};
use clap::{value_parser, Arg, ArgMatches};
use serde_json::{json, Value};

use crate::error::{ConfigError, Result};

/// Coercion applied to the raw token by the parser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArgType {
    #[default]
    Str,
    Int,
    Float,
    Bool,
    Path,
}

/// What the parser does when it meets the argument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArgAction {
    /// Take one value.
    #[default]
    Store,
    /// Flag; `true` when present.
    StoreTrue,
    /// Flag; `false` when present.
    StoreFalse,
    /// Take one value per occurrence, collected into an array.
    Append,
    /// Flag counted per occurrence.
    Count,
}

impl ArgAction {
    fn takes_value(self) -> bool {
        matches!(self, ArgAction::Store | ArgAction::Append)
    }
}

/// Configuration record for one argument.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgSpec {
    pub value_type: Option<ArgType>,
    pub default: Option<String>,
    pub required: Option<bool>,
    pub help: Option<String>,
    pub action: Option<ArgAction>,
    pub choices: Option<Vec<String>>,
    pub metavar: Option<String>,
    pub short: Option<char>,
}

impl ArgSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn typed(value_type: ArgType) -> Self {
        Self::new().value_type(value_type)
    }

    pub fn int() -> Self {
        Self::typed(ArgType::Int)
    }

    pub fn float() -> Self {
        Self::typed(ArgType::Float)
    }

    pub fn path() -> Self {
        Self::typed(ArgType::Path)
    }

    /// Boolean switch, `false` unless given.
    pub fn flag() -> Self {
        Self::new().action(ArgAction::StoreTrue)
    }

    pub fn value_type(mut self, value_type: ArgType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    /// Default applied when the argument is not supplied. The string is
    /// coerced exactly like a command-line value.
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn action(mut self, action: ArgAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar = Some(metavar.into());
        self
    }

    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    fn effective_type(&self) -> ArgType {
        self.value_type.unwrap_or_default()
    }

    fn effective_action(&self) -> ArgAction {
        self.action.unwrap_or_default()
    }
}

/// Command-line shape of an argument, derived from its declared name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgKind {
    Positional,
    Long(String),
    Short(char),
}

/// A declared argument: its name as written by the caller plus its spec.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgDecl {
    name: String,
    kind: ArgKind,
    dest: String,
    spec: ArgSpec,
}

impl ArgDecl {
    /// Parse the name and check the spec for combinations the parser
    /// cannot express.
    pub fn new(name: impl Into<String>, spec: ArgSpec) -> Result<Self> {
        let name = name.into();
        let kind = parse_kind(&name)?;
        let dest = match &kind {
            ArgKind::Positional => name.replace('-', "_"),
            ArgKind::Long(long) => long.replace('-', "_"),
            ArgKind::Short(c) => c.to_string(),
        };

        if dest == "help" || matches!(kind, ArgKind::Short('h')) || spec.short == Some('h') {
            return Err(ConfigError::ReservedArgument(name));
        }

        let invalid = |reason: &str| ConfigError::InvalidSpec {
            name: name.clone(),
            reason: reason.to_string(),
        };
        let action = spec.effective_action();
        if kind == ArgKind::Positional {
            if !action.takes_value() {
                return Err(invalid("positional arguments must take a value"));
            }
            if spec.short.is_some() {
                return Err(invalid("positional arguments cannot have a short alias"));
            }
        }
        if matches!(kind, ArgKind::Short(_)) && spec.short.is_some() {
            return Err(invalid("short option already names its short alias"));
        }
        if spec.choices.is_some() {
            if !action.takes_value() {
                return Err(invalid("choices require an argument that takes a value"));
            }
            if matches!(spec.effective_type(), ArgType::Bool | ArgType::Path) {
                return Err(invalid("choices are only supported for str, int and float"));
            }
        }
        if spec.default.is_some() && !action.takes_value() {
            return Err(invalid("flags cannot carry a default"));
        }

        Ok(Self {
            name,
            kind,
            dest,
            spec,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ArgKind {
        &self.kind
    }

    /// Key under which the parsed value is stored.
    pub fn dest(&self) -> &str {
        &self.dest
    }

    pub fn spec(&self) -> &ArgSpec {
        &self.spec
    }

    pub fn is_positional(&self) -> bool {
        self.kind == ArgKind::Positional
    }

    /// Build the parser-side argument. `in_exclusive_set` drops any
    /// `required` marker: the enclosing group carries that constraint.
    pub(crate) fn to_arg(&self, in_exclusive_set: bool) -> Arg {
        let spec = &self.spec;
        let action = spec.effective_action();
        let mut arg = Arg::new(self.dest.clone());

        match &self.kind {
            ArgKind::Positional => {}
            ArgKind::Long(long) => arg = arg.long(long.clone()),
            ArgKind::Short(c) => arg = arg.short(*c),
        }
        if let Some(short) = spec.short {
            arg = arg.short(short);
        }

        arg = arg.action(match action {
            ArgAction::Store => clap::ArgAction::Set,
            ArgAction::StoreTrue => clap::ArgAction::SetTrue,
            ArgAction::StoreFalse => clap::ArgAction::SetFalse,
            ArgAction::Append => clap::ArgAction::Append,
            ArgAction::Count => clap::ArgAction::Count,
        });

        if action.takes_value() {
            arg = self.with_value_parser(arg);
            if let Some(metavar) = &spec.metavar {
                arg = arg.value_name(metavar.clone());
            }
            if self.is_positional() && action == ArgAction::Append {
                arg = arg.num_args(1..);
            }
        }

        if let Some(help) = &spec.help {
            arg = arg.help(help.clone());
        }

        let required = !in_exclusive_set && spec.required.unwrap_or(self.is_positional());
        arg = arg.required(required);
        // A required argument is always supplied; its default would never apply.
        if !required {
            if let Some(default) = &spec.default {
                arg = arg.default_value(default.clone());
            }
        }
        arg
    }

    fn with_value_parser(&self, arg: Arg) -> Arg {
        let choices = self.spec.choices.clone();
        match (self.spec.effective_type(), choices) {
            (ArgType::Str, None) => arg.value_parser(value_parser!(String)),
            (ArgType::Str, Some(choices)) => arg.value_parser(PossibleValuesParser::new(choices)),
            (ArgType::Int, None) => arg.value_parser(value_parser!(i64)),
            (ArgType::Int, Some(choices)) => arg.value_parser(
                PossibleValuesParser::new(choices).try_map(|s| s.parse::<i64>()),
            ),
            (ArgType::Float, None) => arg.value_parser(value_parser!(f64)),
            (ArgType::Float, Some(choices)) => arg.value_parser(
                PossibleValuesParser::new(choices).try_map(|s| s.parse::<f64>()),
            ),
            (ArgType::Bool, _) => arg.value_parser(BoolishValueParser::new()),
            (ArgType::Path, _) => arg.value_parser(value_parser!(PathBuf)),
        }
    }

    /// Read the parsed value back out of the matches as JSON. Optional
    /// arguments that were neither supplied nor defaulted become `null`.
    pub(crate) fn extract(&self, matches: &ArgMatches) -> Value {
        let id = self.dest.as_str();
        match self.spec.effective_action() {
            ArgAction::StoreTrue | ArgAction::StoreFalse => {
                Value::Bool(matches.try_get_one::<bool>(id).ok().flatten().copied().unwrap_or(false))
            }
            ArgAction::Count => json!(matches.try_get_one::<u8>(id).ok().flatten().copied().unwrap_or(0)),
            ArgAction::Store => self.extract_one(matches, id).unwrap_or(Value::Null),
            ArgAction::Append => self.extract_many(matches, id).unwrap_or(Value::Null),
        }
    }

    fn extract_one(&self, matches: &ArgMatches, id: &str) -> Option<Value> {
        match self.spec.effective_type() {
            ArgType::Str => matches.try_get_one::<String>(id).ok()?.map(|v| json!(v)),
            ArgType::Int => matches.try_get_one::<i64>(id).ok()?.map(|v| json!(v)),
            ArgType::Float => matches.try_get_one::<f64>(id).ok()?.map(|v| json!(v)),
            ArgType::Bool => matches.try_get_one::<bool>(id).ok()?.map(|v| json!(v)),
            ArgType::Path => matches
                .try_get_one::<PathBuf>(id)
                .ok()?
                .map(|v| json!(v.to_string_lossy())),
        }
    }

    fn extract_many(&self, matches: &ArgMatches, id: &str) -> Option<Value> {
        let values: Vec<Value> = match self.spec.effective_type() {
            ArgType::Str => matches.try_get_many::<String>(id).ok()??.map(|v| json!(v)).collect(),
            ArgType::Int => matches.try_get_many::<i64>(id).ok()??.map(|v| json!(v)).collect(),
            ArgType::Float => matches.try_get_many::<f64>(id).ok()??.map(|v| json!(v)).collect(),
            ArgType::Bool => matches.try_get_many::<bool>(id).ok()??.map(|v| json!(v)).collect(),
            ArgType::Path => matches
                .try_get_many::<PathBuf>(id)
                .ok()??
                .map(|v| json!(v.to_string_lossy()))
                .collect(),
        };
        Some(Value::Array(values))
    }
}

fn parse_kind(name: &str) -> Result<ArgKind> {
    let invalid = || ConfigError::InvalidArgumentName(name.to_string());
    let valid_body = |body: &str| {
        !body.is_empty()
            && !body.starts_with('-')
            && body
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    };

    if let Some(long) = name.strip_prefix("--") {
        return if valid_body(long) {
            Ok(ArgKind::Long(long.to_string()))
        } else {
            Err(invalid())
        };
    }
    if let Some(short) = name.strip_prefix('-') {
        let mut chars = short.chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphanumeric() => Ok(ArgKind::Short(c)),
            _ => Err(invalid()),
        };
    }
    if valid_body(name) {
        Ok(ArgKind::Positional)
    } else {
        Err(invalid())
    }
}

/// Ordered argument table. Overriding an existing name replaces its spec in
/// place so positional order follows first declaration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgTable {
    entries: Vec<ArgDecl>,
}

impl ArgTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, decl: ArgDecl) {
        match self.entries.iter_mut().find(|e| e.name == decl.name) {
            Some(existing) => *existing = decl,
            None => self.entries.push(decl),
        }
    }

    /// `self` overridden key-by-key by `overrides`.
    pub fn merged(&self, overrides: &ArgTable) -> ArgTable {
        let mut merged = self.clone();
        for decl in &overrides.entries {
            merged.insert(decl.clone());
        }
        merged
    }

    pub fn get(&self, name: &str) -> Option<&ArgDecl> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArgDecl> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(name: &str, spec: ArgSpec) -> ArgDecl {
        ArgDecl::new(name, spec).unwrap()
    }

    #[test]
    fn names_map_to_kind_and_destination() {
        let positional = decl("foo", ArgSpec::default());
        assert_eq!(positional.kind(), &ArgKind::Positional);
        assert_eq!(positional.dest(), "foo");

        let long = decl("--argument-b", ArgSpec::default());
        assert_eq!(long.kind(), &ArgKind::Long("argument-b".to_string()));
        assert_eq!(long.dest(), "argument_b");

        let short = decl("-v", ArgSpec::flag());
        assert_eq!(short.kind(), &ArgKind::Short('v'));
        assert_eq!(short.dest(), "v");
    }

    #[test]
    fn rejects_malformed_names() {
        for name in ["", "--", "---x", "-vv", "-", "has space", "--a=b"] {
            assert!(
                matches!(ArgDecl::new(name, ArgSpec::default()), Err(ConfigError::InvalidArgumentName(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn help_is_reserved() {
        assert_eq!(
            ArgDecl::new("--help", ArgSpec::flag()),
            Err(ConfigError::ReservedArgument("--help".to_string()))
        );
        assert!(ArgDecl::new("-h", ArgSpec::flag()).is_err());
        assert!(ArgDecl::new("--host", ArgSpec::new().short('h')).is_err());
    }

    #[test]
    fn rejects_inconsistent_specs() {
        assert!(ArgDecl::new("foo", ArgSpec::flag()).is_err());
        assert!(ArgDecl::new("--on", ArgSpec::flag().default_value("x")).is_err());
        assert!(ArgDecl::new("--b", ArgSpec::typed(ArgType::Bool).choices(["true"])).is_err());
        assert!(ArgDecl::new("--level", ArgSpec::int().choices(["1", "2"])).is_ok());
    }

    #[test]
    fn merge_overrides_in_place_and_appends_new() {
        let mut group = ArgTable::new();
        group.insert(decl("foo", ArgSpec::int()));
        group.insert(decl("--argument-b", ArgSpec::new().default_value("bar")));

        let mut command = ArgTable::new();
        command.insert(decl("foo", ArgSpec::default()));
        command.insert(decl("--bar", ArgSpec::new().default_value("bars")));

        let merged = group.merged(&command);
        let names: Vec<_> = merged.iter().map(ArgDecl::name).collect();
        assert_eq!(names, ["foo", "--argument-b", "--bar"]);
        assert_eq!(merged.get("foo").unwrap().spec(), &ArgSpec::default());
        // The group table itself is untouched.
        assert_eq!(group.get("foo").unwrap().spec(), &ArgSpec::int());
    }
}

//! Group and command declaration.
//!
//! Declarations accumulate in a [`Registry`] before any dispatch happens.
//! A group is declared through [`GroupBuilder::declare`], which hands back a
//! [`GroupHandle`]; commands are then declared against the handle and bound
//! to their handler with [`CommandBuilder::register`]. Every consistency
//! check runs at that point, so a bad declaration fails where it is written.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::handler::{ArgProcessor, Handler, HandlerResult};
use crate::namespace::Namespace;
use crate::spec::{ArgAction, ArgDecl, ArgKind, ArgSpec, ArgTable};

/// A declared group and the commands attached to it.
#[derive(Debug, Clone)]
pub struct GroupDef {
    name: String,
    help: Option<String>,
    arguments: ArgTable,
    mutually_exclusive: Option<Vec<String>>,
    arg_processor: Option<ArgProcessor>,
    commands: Vec<CommandDef>,
}

impl GroupDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn arguments(&self) -> &ArgTable {
        &self.arguments
    }

    pub fn mutually_exclusive(&self) -> Option<&[String]> {
        self.mutually_exclusive.as_deref()
    }

    pub fn arg_processor(&self) -> Option<&ArgProcessor> {
        self.arg_processor.as_ref()
    }

    pub fn commands(&self) -> &[CommandDef] {
        &self.commands
    }

    pub fn command(&self, name: &str) -> Option<&CommandDef> {
        self.commands.iter().find(|c| c.name == name)
    }
}

/// A command with everything dispatch needs: the effective arguments
/// (group's overridden by the command's own), the resolved exclusive set,
/// the handler and the owning group's hook.
#[derive(Debug, Clone)]
pub struct CommandDef {
    name: String,
    group: String,
    about: Option<String>,
    arguments: ArgTable,
    mutually_exclusive: Vec<String>,
    handler: Handler,
    arg_processor: Option<ArgProcessor>,
}

impl CommandDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn about(&self) -> Option<&str> {
        self.about.as_deref()
    }

    pub fn arguments(&self) -> &ArgTable {
        &self.arguments
    }

    pub fn mutually_exclusive(&self) -> &[String] {
        &self.mutually_exclusive
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn arg_processor(&self) -> Option<&ArgProcessor> {
        self.arg_processor.as_ref()
    }
}

/// Every declared group, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    groups: Vec<GroupDef>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start declaring a group.
    pub fn group(&mut self, name: impl Into<String>) -> GroupBuilder<'_> {
        GroupBuilder {
            registry: self,
            name: name.into(),
            help: None,
            arguments: Vec::new(),
            mutually_exclusive: None,
            arg_processor: None,
        }
    }

    /// Reopen an already declared group to attach more commands.
    pub fn handle(&mut self, name: &str) -> Option<GroupHandle<'_>> {
        let index = self.groups.iter().position(|g| g.name == name)?;
        Some(GroupHandle {
            registry: self,
            index,
        })
    }

    pub fn groups(&self) -> &[GroupDef] {
        &self.groups
    }

    pub fn get_group(&self, name: &str) -> Option<&GroupDef> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn command(&self, group: &str, command: &str) -> Option<&CommandDef> {
        self.get_group(group)?.command(command)
    }
}

/// Pending group declaration.
pub struct GroupBuilder<'r> {
    registry: &'r mut Registry,
    name: String,
    help: Option<String>,
    arguments: Vec<(String, ArgSpec)>,
    mutually_exclusive: Option<Vec<String>>,
    arg_processor: Option<ArgProcessor>,
}

impl<'r> GroupBuilder<'r> {
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Argument shared by every command of the group.
    pub fn argument(mut self, name: impl Into<String>, spec: ArgSpec) -> Self {
        self.arguments.push((name.into(), spec));
        self
    }

    pub fn arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = (S, ArgSpec)>,
        S: Into<String>,
    {
        self.arguments
            .extend(arguments.into_iter().map(|(name, spec)| (name.into(), spec)));
        self
    }

    /// Exclusive set inherited by commands that do not declare their own.
    pub fn mutually_exclusive<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mutually_exclusive = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Hook run over the parsed arguments of every command in the group.
    pub fn arg_processor<F>(mut self, f: F) -> Self
    where
        F: Fn(Namespace) -> HandlerResult<Namespace> + 'static,
    {
        self.arg_processor = Some(ArgProcessor::new(f));
        self
    }

    /// Record the group. Re-declaring a name is an error.
    pub fn declare(self) -> Result<GroupHandle<'r>> {
        validate_name(&self.name)?;
        if self.registry.get_group(&self.name).is_some() {
            return Err(ConfigError::DuplicateGroup(self.name));
        }

        let mut arguments = ArgTable::new();
        for (name, spec) in self.arguments {
            arguments.insert(ArgDecl::new(name, spec)?);
        }
        check_table(&self.name, &arguments)?;

        debug!(group = %self.name, arguments = arguments.len(), "declared group");
        self.registry.groups.push(GroupDef {
            name: self.name,
            help: self.help,
            arguments,
            mutually_exclusive: self.mutually_exclusive,
            arg_processor: self.arg_processor,
            commands: Vec::new(),
        });

        let index = self.registry.groups.len() - 1;
        Ok(GroupHandle {
            registry: self.registry,
            index,
        })
    }
}

/// A declared group, ready to take commands.
pub struct GroupHandle<'r> {
    registry: &'r mut Registry,
    index: usize,
}

impl GroupHandle<'_> {
    pub fn name(&self) -> &str {
        &self.registry.groups[self.index].name
    }

    pub fn def(&self) -> &GroupDef {
        &self.registry.groups[self.index]
    }

    /// Start declaring a command in this group.
    pub fn command(&mut self, name: impl Into<String>) -> CommandBuilder<'_> {
        CommandBuilder {
            group: &mut self.registry.groups[self.index],
            name: name.into(),
            about: None,
            arguments: Vec::new(),
            mutually_exclusive: None,
        }
    }
}

/// Pending command declaration.
pub struct CommandBuilder<'g> {
    group: &'g mut GroupDef,
    name: String,
    about: Option<String>,
    arguments: Vec<(String, ArgSpec)>,
    mutually_exclusive: Option<Vec<String>>,
}

impl CommandBuilder<'_> {
    /// Description shown in the command's help.
    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    /// Command-specific argument; replaces a group argument of the same name.
    pub fn argument(mut self, name: impl Into<String>, spec: ArgSpec) -> Self {
        self.arguments.push((name.into(), spec));
        self
    }

    pub fn arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = (S, ArgSpec)>,
        S: Into<String>,
    {
        self.arguments
            .extend(arguments.into_iter().map(|(name, spec)| (name.into(), spec)));
        self
    }

    /// Replace the group's exclusive set for this command. An empty set
    /// turns exclusivity off.
    pub fn mutually_exclusive<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mutually_exclusive = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Bind the command to `f`. The returned [`Handler`] wraps the same
    /// function and can be called directly.
    pub fn register<F>(self, f: F) -> Result<Handler>
    where
        F: Fn(&Namespace) -> HandlerResult + 'static,
    {
        self.register_handler(Handler::new(f))
    }

    pub fn register_handler(self, handler: Handler) -> Result<Handler> {
        validate_name(&self.name)?;
        let group = self.group;
        if group.command(&self.name).is_some() {
            return Err(ConfigError::DuplicateCommand {
                group: group.name.clone(),
                command: self.name,
            });
        }

        let mut own = ArgTable::new();
        for (name, spec) in self.arguments {
            own.insert(ArgDecl::new(name, spec)?);
        }
        let arguments = group.arguments.merged(&own);
        let label = format!("{} {}", group.name, self.name);
        check_table(&label, &arguments)?;

        let mut mutually_exclusive = self
            .mutually_exclusive
            .or_else(|| group.mutually_exclusive.clone())
            .unwrap_or_default();
        dedup_in_order(&mut mutually_exclusive);
        for name in &mutually_exclusive {
            let decl = arguments
                .get(name)
                .ok_or_else(|| ConfigError::UnknownExclusiveArgument {
                    command: label.clone(),
                    argument: name.clone(),
                })?;
            if decl.is_positional() || decl.spec().required == Some(true) {
                return Err(ConfigError::ExclusiveNotOptional(name.clone()));
            }
        }

        debug!(
            group = %group.name,
            command = %self.name,
            arguments = arguments.len(),
            exclusive = mutually_exclusive.len(),
            "registered command"
        );
        group.commands.push(CommandDef {
            name: self.name,
            group: group.name.clone(),
            about: self.about,
            arguments,
            mutually_exclusive,
            handler: handler.clone(),
            arg_processor: group.arg_processor.clone(),
        });
        Ok(handler)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.starts_with('-') || name.chars().any(char::is_whitespace) {
        return Err(ConfigError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Destinations and short aliases must be unique within one parser.
fn check_table(label: &str, table: &ArgTable) -> Result<()> {
    let mut dests: HashMap<&str, &str> = HashMap::new();
    let mut shorts: HashMap<char, &str> = HashMap::new();
    for decl in table.iter() {
        if let Some(first) = dests.insert(decl.dest(), decl.name()) {
            return Err(ConfigError::DuplicateDestination {
                command: label.to_string(),
                dest: decl.dest().to_string(),
                first: first.to_string(),
                second: decl.name().to_string(),
            });
        }
        let short = match decl.kind() {
            ArgKind::Short(c) => Some(*c),
            _ => decl.spec().short,
        };
        if let Some(c) = short {
            if let Some(first) = shorts.insert(c, decl.name()) {
                return Err(ConfigError::InvalidSpec {
                    name: decl.name().to_string(),
                    reason: format!("short option -{c} already used by {first}"),
                });
            }
        }
    }
    check_positional_order(table)
}

/// Positionals are matched by index: an optional one may only be followed
/// by optional ones, and a multi-value one must come last.
fn check_positional_order(table: &ArgTable) -> Result<()> {
    let mut optional: Option<&str> = None;
    let mut multiple: Option<&str> = None;
    for decl in table.iter().filter(|d| d.is_positional()) {
        if let Some(first) = multiple {
            return Err(ConfigError::InvalidSpec {
                name: decl.name().to_string(),
                reason: format!("positional follows multi-value positional {first}"),
            });
        }
        let required = decl.spec().required.unwrap_or(true);
        match optional {
            Some(first) if required => {
                return Err(ConfigError::InvalidSpec {
                    name: decl.name().to_string(),
                    reason: format!("required positional follows optional positional {first}"),
                });
            }
            None if !required => optional = Some(decl.name()),
            _ => {}
        }
        if decl.spec().action == Some(ArgAction::Append) {
            multiple = Some(decl.name());
        }
    }
    Ok(())
}

fn dedup_in_order(names: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    names.retain(|n| seen.insert(n.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_group(registry: &mut Registry) -> GroupHandle<'_> {
        registry
            .group("my_group")
            .argument("foo", ArgSpec::int().default_value("george"))
            .argument("--argument-a", ArgSpec::default())
            .argument("--argument-b", ArgSpec::new().default_value("bar"))
            .declare()
            .unwrap()
    }

    #[test]
    fn command_merges_group_arguments() {
        let mut registry = Registry::new();
        let mut group = example_group(&mut registry);
        group
            .command("my_command")
            .argument("foo", ArgSpec::default())
            .argument("--bar", ArgSpec::new().default_value("bars"))
            .register(|_| Ok(()))
            .unwrap();

        let command = registry.command("my_group", "my_command").unwrap();
        let names: Vec<_> = command.arguments().iter().map(ArgDecl::name).collect();
        assert_eq!(names, ["foo", "--argument-a", "--argument-b", "--bar"]);
        assert_eq!(command.arguments().get("foo").unwrap().spec(), &ArgSpec::default());
        assert_eq!(command.group(), "my_group");
    }

    #[test]
    fn redeclaring_a_group_fails() {
        let mut registry = Registry::new();
        example_group(&mut registry);
        let err = registry.group("my_group").declare().err().unwrap();
        assert_eq!(err, ConfigError::DuplicateGroup("my_group".to_string()));
        assert_eq!(registry.groups().len(), 1);
    }

    #[test]
    fn redeclaring_a_command_fails() {
        let mut registry = Registry::new();
        let mut group = example_group(&mut registry);
        group.command("run").register(|_| Ok(())).unwrap();
        let err = group.command("run").register(|_| Ok(())).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateCommand { .. }));
    }

    #[test]
    fn exclusive_names_must_be_declared() {
        let mut registry = Registry::new();
        let mut group = registry
            .group("g")
            .argument("--a", ArgSpec::flag())
            .mutually_exclusive(["--a", "--missing"])
            .declare()
            .unwrap();

        let err = group.command("c").register(|_| Ok(())).unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownExclusiveArgument {
                command: "g c".to_string(),
                argument: "--missing".to_string(),
            }
        );

        // A command can supply the missing name itself.
        group
            .command("d")
            .argument("--missing", ArgSpec::flag())
            .register(|_| Ok(()))
            .unwrap();
    }

    #[test]
    fn exclusive_set_defaults_to_group_and_can_be_overridden() {
        let mut registry = Registry::new();
        let mut group = registry
            .group("g")
            .argument("--a", ArgSpec::flag())
            .argument("--b", ArgSpec::flag())
            .mutually_exclusive(["--a", "--b"])
            .declare()
            .unwrap();
        group.command("inherit").register(|_| Ok(())).unwrap();
        group
            .command("none")
            .mutually_exclusive(Vec::<String>::new())
            .register(|_| Ok(()))
            .unwrap();

        assert_eq!(
            registry.command("g", "inherit").unwrap().mutually_exclusive(),
            ["--a", "--b"]
        );
        assert!(registry.command("g", "none").unwrap().mutually_exclusive().is_empty());
    }

    #[test]
    fn positional_cannot_be_exclusive() {
        let mut registry = Registry::new();
        let mut group = registry
            .group("g")
            .argument("path", ArgSpec::default())
            .argument("--all", ArgSpec::flag())
            .declare()
            .unwrap();
        let err = group
            .command("c")
            .mutually_exclusive(["path", "--all"])
            .register(|_| Ok(()))
            .unwrap_err();
        assert_eq!(err, ConfigError::ExclusiveNotOptional("path".to_string()));
    }

    #[test]
    fn clashing_destinations_fail() {
        let mut registry = Registry::new();
        let err = registry
            .group("g")
            .argument("foo", ArgSpec::default())
            .argument("--foo", ArgSpec::default())
            .declare()
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::DuplicateDestination { .. }));

        let err = registry
            .group("h")
            .argument("-v", ArgSpec::flag())
            .argument("--verbose", ArgSpec::flag().short('v'))
            .declare()
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::InvalidSpec { .. }));
    }

    #[test]
    fn positional_order_is_checked_after_merge() {
        let mut registry = Registry::new();
        let mut group = registry
            .group("g")
            .argument("src", ArgSpec::new().required(false))
            .declare()
            .unwrap();
        let err = group
            .command("c")
            .argument("dst", ArgSpec::default())
            .register(|_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSpec { ref name, .. } if name == "dst"));
        // Optional after optional is fine.
        group
            .command("d")
            .argument("dst", ArgSpec::new().required(false))
            .register(|_| Ok(()))
            .unwrap();

        let mut group = registry
            .group("h")
            .argument("files", ArgSpec::new().action(ArgAction::Append))
            .declare()
            .unwrap();
        let err = group
            .command("c")
            .argument("dst", ArgSpec::default())
            .register(|_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSpec { ref name, .. } if name == "dst"));
        group.command("d").register(|_| Ok(())).unwrap();
        assert!(registry.command("g", "c").is_none());
        assert!(registry.command("h", "d").is_some());
    }

    #[test]
    fn names_are_validated() {
        let mut registry = Registry::new();
        assert!(matches!(
            registry.group("").declare().err().unwrap(),
            ConfigError::InvalidName(_)
        ));
        let mut group = registry.group("g").declare().unwrap();
        assert!(group.command("--oops").register(|_| Ok(())).is_err());
    }

    #[test]
    fn commands_inherit_the_group_hook() {
        let mut registry = Registry::new();
        let mut group = registry
            .group("g")
            .arg_processor(|args| Ok(args))
            .declare()
            .unwrap();
        group.command("c").register(|_| Ok(())).unwrap();

        let reopened = registry.handle("g").unwrap();
        assert_eq!(reopened.def().commands().len(), 1);
        assert!(registry.command("g", "c").unwrap().arg_processor().is_some());
        assert!(registry.handle("nope").is_none());
    }
}

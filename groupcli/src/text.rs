//! `text` group: read a file and report on it.

use std::fs;

use groupcli_core::prelude::*;
use serde::Deserialize;
use tracing::debug;

pub fn declare(dispatcher: &mut Dispatcher) -> groupcli_core::Result<()> {
    let mut text = dispatcher
        .group("text")
        .help("Inspect text files")
        .argument(
            "path",
            ArgSpec::new()
                .metavar("PATH")
                .help("File to read; `~` and `$VARS` are expanded"),
        )
        .argument(
            "--limit",
            ArgSpec::int()
                .short('n')
                .default_value("10")
                .help("Maximum number of lines to print"),
        )
        .arg_processor(expand_path)
        .declare()?;

    text.command("head")
        .about("Print the first lines of a file")
        .register(head)?;

    text.command("count")
        .about("Count the lines, words or bytes of a file")
        .argument("--lines", ArgSpec::flag().short('l').help("Count lines"))
        .argument("--words", ArgSpec::flag().short('w').help("Count words"))
        .argument("--bytes", ArgSpec::flag().short('c').help("Count bytes"))
        .mutually_exclusive(["--lines", "--words", "--bytes"])
        .register(count)?;

    Ok(())
}

fn expand_path(mut args: Namespace) -> HandlerResult<Namespace> {
    if let Some(raw) = args.get_str("path") {
        let expanded = shellexpand::full(raw)?.into_owned();
        debug!(raw, expanded = %expanded, "expanded path");
        args.set("path", expanded);
    }
    Ok(args)
}

fn read(path: &str) -> HandlerResult<String> {
    fs::read_to_string(path).map_err(|e| HandlerError::from(e).context(format!("cannot read {path}")))
}

#[derive(Deserialize)]
struct HeadArgs {
    path: String,
    limit: i64,
}

fn head(args: &Namespace) -> HandlerResult {
    let HeadArgs { path, limit } = args.parse()?;
    let limit = usize::try_from(limit)
        .map_err(|_| HandlerError::new("ValueError", format!("limit must not be negative: {limit}")))?;

    for line in read(&path)?.lines().take(limit) {
        println!("{line}");
    }
    Ok(())
}

fn count(args: &Namespace) -> HandlerResult {
    let content = read(args.get_str("path").unwrap_or_default())?;
    let n = if args.get_bool("lines") == Some(true) {
        content.lines().count()
    } else if args.get_bool("words") == Some(true) {
        content.split_whitespace().count()
    } else {
        content.len()
    };
    println!("{n}");
    Ok(())
}

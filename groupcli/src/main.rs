use std::process::ExitCode;

use clap::Parser;
use groupcli_core::Dispatcher;

mod math;
mod options;
mod text;

use options::Launcher;

fn main() -> ExitCode {
    let launcher = Launcher::parse();
    let mut dispatcher = Dispatcher::new(launcher.dispatch_options());

    if let Err(e) = declare(&mut dispatcher) {
        eprintln!("Invalid command declarations: {}", e);
        return ExitCode::FAILURE;
    }

    dispatcher.run_from(&launcher.tokens).into()
}

fn declare(dispatcher: &mut Dispatcher) -> groupcli_core::Result<()> {
    text::declare(dispatcher)?;
    math::declare(dispatcher)?;
    Ok(())
}

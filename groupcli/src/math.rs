//! `math` group: arithmetic on two operands.

use groupcli_core::prelude::*;
use serde::Deserialize;

pub fn declare(dispatcher: &mut Dispatcher) -> groupcli_core::Result<()> {
    let mut math = dispatcher
        .group("math")
        .help("Arithmetic on two numbers")
        .argument("a", ArgSpec::float().help("Left operand"))
        .argument("b", ArgSpec::float().help("Right operand"))
        .argument(
            "--precision",
            ArgSpec::int()
                .short('p')
                .default_value("2")
                .help("Digits after the decimal point"),
        )
        .declare()?;

    math.command("add").about("Add a and b").register(add)?;
    math.command("div").about("Divide a by b").register(div)?;
    // Same position as the group's `b`, but an integer.
    math.command("pow")
        .about("Raise a to an integer power")
        .argument("b", ArgSpec::int().metavar("EXPONENT").help("Integer exponent"))
        .register(pow)?;

    Ok(())
}

#[derive(Deserialize)]
struct Operands {
    a: f64,
    b: f64,
    precision: i64,
}

#[derive(Deserialize)]
struct PowOperands {
    a: f64,
    b: i64,
    precision: i64,
}

fn print_number(value: f64, precision: i64) -> HandlerResult {
    let precision = usize::try_from(precision).map_err(|_| {
        HandlerError::new("ValueError", format!("precision must not be negative: {precision}"))
    })?;
    println!("{:.*}", precision, value);
    Ok(())
}

fn add(args: &Namespace) -> HandlerResult {
    let Operands { a, b, precision } = args.parse()?;
    print_number(a + b, precision)
}

fn div(args: &Namespace) -> HandlerResult {
    let Operands { a, b, precision } = args.parse()?;
    if b == 0.0 {
        return Err(HandlerError::new("ZeroDivisionError", "division by zero"));
    }
    print_number(a / b, precision)
}

fn pow(args: &Namespace) -> HandlerResult {
    let PowOperands { a, b, precision } = args.parse()?;
    let exponent = i32::try_from(b)?;
    print_number(a.powi(exponent), precision)
}

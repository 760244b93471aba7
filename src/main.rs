#![allow(non_snake_case)]
use RustedSymCalc::Utils::logger::init_logging;
use RustedSymCalc::calculator::config::CalculatorConfig;
use RustedSymCalc::calculator::operation::{OperationKind, render, run_fields};
use log::info;
use std::process::ExitCode;
use std::str::FromStr;
use strum::IntoEnumIterator;
use tabled::{builder::Builder, settings::Style};

const USAGE: &str = "usage: symcalc [--config <file.toml>] [--list | <operation> [fields...]]
with no operation the built-in self-check is run";

/// the cases of the self-check table: operation and raw form fields
const SELF_CHECK: &[(OperationKind, &[&str])] = &[
    (OperationKind::Derivative, &["x**2 + 2*x + 1", "x"]),
    (OperationKind::Derivative, &["sin(x)", "x"]),
    (OperationKind::Derivative, &["invalid expr", "x"]),
    (OperationKind::Derivative, &["x**2", "y"]),
    (OperationKind::Evaluate, &["2 + 3*4"]),
    (OperationKind::Evaluate, &["sqrt(16)"]),
    (OperationKind::Evaluate, &["x + 1", "x=3"]),
    (OperationKind::Evaluate, &["invalid + expr"]),
    (OperationKind::Integral, &["x**2", "x"]),
    (OperationKind::Integral, &["x**2", "x", "0", "1"]),
    (OperationKind::Integral, &["x**2", "x", "0", ""]),
    (OperationKind::Integral, &["invalid expr", "x"]),
    (OperationKind::Simplify, &["sin(x)**2 + cos(x)**2"]),
    (OperationKind::Series, &["exp(x)", "x", "6", "0"]),
    (OperationKind::Series, &["log(1 + x)", "x", "6", "1"]),
];

fn self_check(config: &CalculatorConfig) -> String {
    let mut builder = Builder::default();
    builder.push_record(["operation", "fields", "result"]);
    for (kind, fields) in SELF_CHECK {
        let result = run_fields(*kind, fields, config);
        builder.push_record([kind.to_string(), fields.join(" | "), render(&result)]);
    }
    let mut table = builder.build();
    table.with(Style::modern_rounded());
    table.to_string()
}

fn list_operations() -> String {
    let mut builder = Builder::default();
    builder.push_record(["operation", "fields", "description"]);
    for kind in OperationKind::iter() {
        builder.push_record([
            kind.to_string(),
            kind.field_labels().join("\n"),
            kind.description().to_string(),
        ]);
    }
    let mut table = builder.build();
    table.with(Style::modern_rounded());
    table.to_string()
}

fn main() -> ExitCode {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    let mut config = CalculatorConfig::default();
    if let Some(pos) = args.iter().position(|a| a == "--config") {
        let Some(path) = args.get(pos + 1).cloned() else {
            eprintln!("--config needs a file name\n{}", USAGE);
            return ExitCode::FAILURE;
        };
        config = match CalculatorConfig::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}: {}", path, e);
                return ExitCode::FAILURE;
            }
        };
        args.drain(pos..pos + 2);
    }
    if let Err(e) = init_logging(&config.logging) {
        eprintln!("cannot open log file: {}", e);
    }

    match args.first().map(String::as_str) {
        None => {
            info!("running self-check");
            println!("{}", self_check(&config));
            ExitCode::SUCCESS
        }
        Some("--list") => {
            println!("{}", list_operations());
            ExitCode::SUCCESS
        }
        Some("--help") | Some("-h") => {
            println!("{}", USAGE);
            ExitCode::SUCCESS
        }
        Some(name) => {
            let Ok(kind) = OperationKind::from_str(name) else {
                eprintln!("unknown operation '{}'\n{}", name, USAGE);
                return ExitCode::FAILURE;
            };
            let fields: Vec<&str> = args[1..].iter().map(String::as_str).collect();
            let result = run_fields(kind, &fields, &config);
            println!("{}", render(&result));
            if result.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

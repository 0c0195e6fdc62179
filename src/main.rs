//! Command-line driver: parse, type-check, and evaluate style expressions
//! from the shell.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{bail, IntoDiagnostic, Result};
use serde_json::Value as Json;

use mapexpr::registry::Registry;
use mapexpr::{parse_expression, stringify, EvaluationContext, Expression, JsonFeature};

#[derive(Debug, Parser)]
#[command(
    name = "mapexpr",
    version,
    about = "A typed, JSON-encoded expression language for data-driven map styling."
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse an expression and evaluate it against an optional zoom level
    /// and feature.
    Eval {
        /// Inline expression JSON; reads stdin when omitted.
        expression: Option<String>,
        /// Read the expression from a file instead.
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,
        /// Zoom level to evaluate at.
        #[arg(long, short = 'z')]
        zoom: Option<f64>,
        /// GeoJSON-like feature document: inline JSON or a file path.
        #[arg(long)]
        feature: Option<String>,
    },
    /// Parse and type-check an expression, printing its output type.
    Check {
        /// Inline expression JSON; reads stdin when omitted.
        expression: Option<String>,
        /// Read the expression from a file instead.
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,
    },
    /// List the registered operator names.
    Ops,
}

fn main() -> Result<()> {
    match Args::parse().command {
        Command::Eval {
            expression,
            file,
            zoom,
            feature,
        } => run_eval(expression, file, zoom, feature),
        Command::Check { expression, file } => {
            let expression = parse_source(&read_source(expression, file)?)?;
            println!("{}", expression.ty());
            Ok(())
        }
        Command::Ops => {
            for name in Registry::global().names() {
                println!("{name}");
            }
            Ok(())
        }
    }
}

fn run_eval(
    expression: Option<String>,
    file: Option<PathBuf>,
    zoom: Option<f64>,
    feature: Option<String>,
) -> Result<()> {
    let expression = parse_source(&read_source(expression, file)?)?;

    let feature = feature.map(read_feature).transpose()?;

    let mut ctx = EvaluationContext::new();
    ctx.zoom = zoom;
    if let Some(feature) = &feature {
        ctx.feature = Some(feature);
    }

    match expression.evaluate(&ctx) {
        Ok(value) => {
            println!("{}", stringify(&value));
            Ok(())
        }
        Err(error) => bail!("evaluation failed: {error}"),
    }
}

fn read_source(expression: Option<String>, file: Option<PathBuf>) -> Result<String> {
    match (expression, file) {
        (Some(text), _) => Ok(text),
        (None, Some(path)) => fs::read_to_string(path).into_diagnostic(),
        (None, None) => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .into_diagnostic()?;
            Ok(buffer)
        }
    }
}

fn parse_source(source: &str) -> Result<Expression> {
    let document: Json = serde_json::from_str(source).into_diagnostic()?;
    match parse_expression(&document) {
        Ok(expression) => Ok(expression),
        Err(errors) => {
            let rendered = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n");
            bail!("expression failed to parse:\n{rendered}");
        }
    }
}

fn read_feature(raw: String) -> Result<JsonFeature> {
    let doc: Json = if Path::new(&raw).exists() {
        serde_json::from_str(&fs::read_to_string(&raw).into_diagnostic()?).into_diagnostic()?
    } else {
        serde_json::from_str(&raw).into_diagnostic()?
    };
    Ok(JsonFeature::new(doc))
}

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use serde_json::Value as JsonValue;

use rusty_sieve::{load_file, FilterError, FilterSpec, PredicateRegistry, RecordFilter};

/// Filter a record dataset with a JSON column filter and print the matches.
#[derive(Debug, Parser)]
#[command(name = "rusty-sieve", version, about)]
struct Cli {
    /// Dataset to filter (.json, .csv or .parquet).
    #[arg(long, env = "RUSTY_SIEVE_DATA")]
    data: PathBuf,

    /// Filter specification as inline JSON.
    #[arg(long, conflicts_with = "filter_file")]
    filter: Option<String>,

    /// Read the filter specification from a file.
    #[arg(long)]
    filter_file: Option<PathBuf>,

    /// Pretty-print the output.
    #[arg(long)]
    pretty: bool,
}

fn main() -> ExitCode {
    env_logger::init();

    let registry = PredicateRegistry::standard();
    match run(Cli::parse(), &registry) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", describe_failure(&err, &registry));
            ExitCode::from(exit_code(&err))
        }
    }
}

/// 2 when the request itself was bad, 1 for everything else.
fn exit_code(err: &anyhow::Error) -> u8 {
    let client_fault = err
        .downcast_ref::<FilterError>()
        .is_some_and(FilterError::is_client_fault);
    if client_fault {
        2
    } else {
        1
    }
}

fn describe_failure(err: &anyhow::Error, registry: &PredicateRegistry) -> String {
    match err.downcast_ref::<FilterError>() {
        Some(FilterError::Unknown(_)) => {
            let supported: Vec<&str> = registry.operators().collect();
            format!("error: {err:#}\nsupported operators: {}", supported.join(", "))
        }
        _ => format!("error: {err:#}"),
    }
}

fn run(cli: Cli, registry: &PredicateRegistry) -> Result<()> {
    let spec = match (&cli.filter, &cli.filter_file) {
        (Some(text), _) => FilterSpec::from_json_str(text)?,
        (None, Some(path)) => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening filter file {}", path.display()))?;
            FilterSpec::from_reader(std::io::BufReader::new(file))?
        }
        (None, None) => bail!("one of --filter or --filter-file is required"),
    };

    let dataset = load_file(&cli.data)
        .with_context(|| format!("loading dataset {}", cli.data.display()))?;
    let filter = RecordFilter::new(&dataset, registry);

    let result = filter.filter_columns(&spec)?;
    info!("{} of {} records matched", result.len(), dataset.len());

    let output = JsonValue::Array(
        filter
            .records(&result)
            .into_iter()
            .map(|rec| rec.to_json())
            .collect(),
    );
    let text = if cli.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{text}");
    Ok(())
}

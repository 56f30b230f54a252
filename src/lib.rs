pub mod cli;
pub mod config;
pub mod filter;
pub mod input;
pub mod options;
pub mod query;
pub mod record;
pub mod strategy;

pub use cli::{Cli, Commands, OutputFormat, TimeoutPolicy, cli_parse};
pub use filter::{EvalError, Expr, FilterCompiler, FilterError, Predicate, compile};
pub use options::Options;
pub use query::{FilterExt, Filtered};
pub use record::{Record, RecordType, Schema};

use crate::config::{FilterConfig, load_config};
use crate::input::{JsonRecord, parse_records, schema_for};
use anyhow::{Context, bail};
use colored::Colorize;
use comfy_table::{Cell, Table};
use std::io::Read;
use std::path::Path;

/// Route `log` output to stderr; `RUST_LOG` wins over `-v`
pub fn init_logger(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let env = env_logger::Env::default().default_filter_or(default_level);
    let _ = env_logger::Builder::from_env(env).try_init();
}

fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file '{}'", path.display())),
        None => {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read records from stdin")?;
            Ok(content)
        }
    }
}

fn render_table(records: &[&JsonRecord], schema: &Schema) -> String {
    let columns = schema.names();
    let mut table = Table::new();
    table.set_header(columns.clone());
    for record in records {
        let row: Vec<Cell> = columns
            .iter()
            .map(|name| Cell::new(record.field(name).unwrap_or_default()))
            .collect();
        table.add_row(row);
    }
    table.to_string()
}

fn filter_records(
    filter: &str,
    file: Option<&Path>,
    fields: &[String],
    format: OutputFormat,
    on_timeout: TimeoutPolicy,
) -> anyhow::Result<()> {
    let content = read_input(file)?;
    let records = parse_records(&content)?;
    let schema = schema_for(&records, fields);

    let predicate = FilterCompiler::new()
        .compile_with_schema::<JsonRecord>(filter, &schema)
        .with_context(|| format!("Invalid filter expression: {filter}"))?;
    log::debug!("predicate: {}", predicate.render());

    let mut selected = Vec::new();
    for (index, record) in records.iter().enumerate() {
        match predicate.evaluate(record) {
            Ok(true) => selected.push(record),
            Ok(false) => {}
            Err(err) if err.is_timeout() && on_timeout == TimeoutPolicy::Skip => {
                log::warn!("record {index} skipped: {err}");
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to evaluate record {index}"));
            }
        }
    }

    match format {
        OutputFormat::Json => {
            for record in &selected {
                println!("{}", serde_json::to_string(record)?);
            }
        }
        OutputFormat::Table => println!("{}", render_table(&selected, &schema)),
    }

    eprintln!(
        "{} of {} record{} matched",
        selected.len().to_string().green(),
        records.len(),
        if records.len() == 1 { "" } else { "s" }
    );
    Ok(())
}

fn check_filter(filter: &str, fields: &[String]) -> anyhow::Result<()> {
    let compiler = FilterCompiler::new();
    let expr = compiler
        .compile_expr(filter, &Schema::new(fields.iter().cloned()))
        .with_context(|| format!("Invalid filter expression: {filter}"))?;

    println!("{} {}", "valid".green(), filter);
    println!("{}", expr.render(compiler.options()));
    Ok(())
}

fn print_approximate_codes(words: &[String]) {
    let options = options::current();
    for word in words {
        println!("{}\t{}", word, options.approximate().encode(word).cyan());
    }
}

pub fn run() -> anyhow::Result<()> {
    let cli = cli_parse();
    init_logger(cli.verbose);

    let mut config: FilterConfig =
        load_config(cli.config.as_deref()).context("Failed to load config")?;
    config.case_insensitive_store |= cli.case_insensitive_store;
    if let Some(locale) = &cli.locale {
        config.locale = Some(locale.clone());
    }
    if config.like_timeout_ms == 0 {
        bail!("like_timeout_ms must be greater than zero");
    }
    options::replace(config.to_options());

    match &cli.command {
        Commands::Filter {
            filter,
            file,
            fields,
            format,
            on_timeout,
        } => filter_records(filter, file.as_deref(), fields, *format, *on_timeout),
        Commands::Check { filter, fields } => check_filter(filter, fields),
        Commands::Approx { words } => {
            print_approximate_codes(words);
            Ok(())
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

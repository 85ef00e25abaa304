use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use envcfg::document::{DuplicateKeys, Value, dump};
use envcfg::{Config, LoadOptions};

#[derive(Parser)]
#[command(name = "envcfg")]
#[command(
	author,
	version,
	about = "Resolve YAML environment configurations with includes and templates"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Increase log verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short, long, action = ArgAction::Count, global = true)]
	verbose: u8,

	/// Treat duplicate mapping keys as errors instead of warnings
	#[arg(long, global = true)]
	strict_duplicates: bool,

	/// Set a substitution variable for include paths and templates
	#[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var, global = true)]
	vars: Vec<(String, String)>,
}

#[derive(Subcommand)]
enum Commands {
	/// Print the fully resolved configuration as YAML
	Show { config: PathBuf },
	/// Check a configuration for errors
	Validate { config: PathBuf },
	/// Print one target option
	Option {
		config: PathBuf,
		target: String,
		option: String,
	},
	/// Print the resolved path of a tool
	Tool { config: PathBuf, name: String },
	/// List global and target features
	Features { config: PathBuf },
}

fn main() -> ExitCode {
	match run() {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();
	init_logging(cli.verbose)?;

	let options = load_options(&cli);
	match &cli.command {
		Commands::Show { config } => handle_show(config, options),
		Commands::Validate { config } => handle_validate(config, options),
		Commands::Option {
			config,
			target,
			option,
		} => handle_option(config, options, target, option),
		Commands::Tool { config, name } => handle_tool(config, options, name),
		Commands::Features { config } => handle_features(config, options),
	}
}

fn init_logging(verbose: u8) -> Result<()> {
	let level = match verbose {
		0 => LevelFilter::WARN,
		1 => LevelFilter::INFO,
		2 => LevelFilter::DEBUG,
		_ => LevelFilter::TRACE,
	};
	let filter = EnvFilter::builder()
		.with_default_directive(level.into())
		.from_env_lossy();
	let subscriber = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.finish();
	tracing::subscriber::set_global_default(subscriber).context("Failed to initialize logging")
}

fn parse_var(input: &str) -> std::result::Result<(String, String), String> {
	match input.split_once('=') {
		Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
		_ => Err(format!("invalid KEY=VALUE: no `=` found in `{input}`")),
	}
}

fn load_options(cli: &Cli) -> LoadOptions {
	let duplicate_keys = if cli.strict_duplicates {
		DuplicateKeys::Error
	} else {
		DuplicateKeys::Warn
	};
	cli.vars
		.iter()
		.fold(LoadOptions::default().duplicate_keys(duplicate_keys), |options, (key, value)| {
			options.var(key, value)
		})
}

fn load(path: &Path, options: LoadOptions) -> Result<Config> {
	Config::load_with(path, options)
		.with_context(|| format!("Failed to load configuration {}", path.display()))
}

fn handle_show(path: &Path, options: LoadOptions) -> Result<ExitCode> {
	let config = load(path, options)?;
	print!("{}", dump(config.data())?);
	Ok(ExitCode::SUCCESS)
}

fn handle_validate(path: &Path, options: LoadOptions) -> Result<ExitCode> {
	match Config::load_with(path, options) {
		Ok(config) => {
			println!("Configuration is valid: {}", config.path().display());
			Ok(ExitCode::SUCCESS)
		}
		Err(e) => {
			eprintln!("Configuration error: {:#}", anyhow::Error::from(e));
			Ok(ExitCode::FAILURE)
		}
	}
}

fn handle_option(
	path: &Path,
	options: LoadOptions,
	target: &str,
	option: &str,
) -> Result<ExitCode> {
	let config = load(path, options)?;
	let value = config.get_target_option(target, option)?;
	match value.as_str() {
		Some(text) => println!("{}", text),
		None => print!("{}", render(value)?),
	}
	Ok(ExitCode::SUCCESS)
}

fn handle_tool(path: &Path, options: LoadOptions, name: &str) -> Result<ExitCode> {
	let config = load(path, options)?;
	println!("{}", config.get_tool(name).display());
	Ok(ExitCode::SUCCESS)
}

fn handle_features(path: &Path, options: LoadOptions) -> Result<ExitCode> {
	let config = load(path, options)?;
	let join = |features: std::collections::BTreeSet<String>| {
		features.into_iter().collect::<Vec<_>>().join(", ")
	};
	println!("features: {}", join(config.get_features()));
	println!("target features: {}", join(config.get_target_features()));
	Ok(ExitCode::SUCCESS)
}

fn render(value: &Value) -> Result<String> {
	dump(value).context("Failed to render value")
}

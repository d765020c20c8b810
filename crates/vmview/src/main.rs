use std::process;

use clap::{Parser, Subcommand};
use vmview_core::{Registry, ViewConfig};
use vmview_utils::{debug, init_logging, init_logging_with_level, LogFormat, LogLevel};

mod demo;

/// Debugger formatters for psi::vm containers.
#[derive(Parser, Debug)]
#[command(name = "vmview")]
#[command(version)]
#[command(about = "Inspect and export the psi::vm debugger formatter table", long_about = None)]
struct Cli
{
    /// Log level (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log output format, `pretty` or `json`
    #[arg(long, global = true, default_value = "pretty")]
    log_format: LogFormat,

    /// Library namespace prefix, e.g. `psi::vm::`
    #[arg(long, global = true)]
    namespace: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// List every pattern → family binding
    Bindings,
    /// Print the LLDB commands that install the formatters
    LldbInit
    {
        /// Script module the formatter functions live in
        #[arg(long)]
        module: Option<String>,
    },
    /// Show which family a type name is bound to
    Match
    {
        /// Fully qualified type name, e.g. `psi::vm::tr_vector<int>`
        type_name: String,
    },
    /// Render a sample memory snapshot with every family
    Demo,
}

fn main()
{
    let cli = Cli::parse();

    let logging = match cli.log_level {
        Some(level) => init_logging_with_level(level, cli.log_format),
        None => init_logging(),
    };
    if let Err(e) = logging {
        eprintln!("Failed to initialize logging: {e}");
        process::exit(1);
    }

    if let Err(e) = run_command(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<ViewConfig, Box<dyn std::error::Error>>
{
    let mut config = ViewConfig::from_env()?;
    if let Some(namespace) = &cli.namespace {
        config = config.with_namespace(namespace)?;
    }
    if let Commands::LldbInit { module: Some(module) } = &cli.command {
        config = config.with_script_module(module)?;
    }
    debug!(?config, "configuration loaded");
    Ok(config)
}

fn run_command(cli: Cli) -> Result<(), Box<dyn std::error::Error>>
{
    let config = load_config(&cli)?;
    let registry = Registry::new(&config);

    match cli.command {
        Commands::Bindings => {
            println!("Category: {}", registry.category());
            for binding in registry.bindings() {
                let hooks = if binding.has_synthetic() {
                    "summary, synthetic"
                } else {
                    "summary"
                };
                println!("  {:<40} {:<16} {hooks}", binding.pattern.to_string(), binding.family.name());
            }
        }
        Commands::LldbInit { .. } => {
            for command in registry.lldb_commands() {
                println!("{command}");
            }
        }
        Commands::Match { type_name } => match registry.find(type_name.trim()) {
            Some(binding) => println!("{type_name}: {} (pattern {})", binding.family, binding.pattern),
            None => println!("{type_name}: no binding"),
        },
        Commands::Demo => {
            print!("{}", demo::render_sample(&registry)?);
        }
    }
    Ok(())
}

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use autodoc::cli::Output;
use autodoc::cli::commands::{self, generate::GenerateOptions};

#[derive(Parser)]
#[command(name = "autodoc")]
#[command(
    version,
    about = "Generate a README for a remote git repository with an LLM"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, global = true, help = "Config file to use instead of the layered lookup")]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP/WebSocket API
    Serve {
        #[arg(long, help = "Bind address (default from config)")]
        host: Option<String>,
        #[arg(long, short, help = "Bind port (default from config)")]
        port: Option<u16>,
    },

    /// Document one repository from the terminal
    Generate {
        #[arg(help = "Repository URL to clone")]
        repo_url: String,
        #[arg(long, short, help = "Model to use")]
        model: Option<String>,
        #[arg(long, short, help = "Also write the document to this file")]
        output: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'f', long, value_enum, default_value_t = ConfigFormat::Toml)]
        format: ConfigFormat,
    },
    /// Show configuration file paths
    Path,
    /// Write the default global config file
    Init {
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ConfigFormat {
    Toml,
    Json,
    Yaml,
}

impl ConfigFormat {
    fn as_str(self) -> &'static str {
        match self {
            Self::Toml => "toml",
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mautodoc hit an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let out = Output::new(cli.quiet);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Serve { host, port } => {
            commands::serve::run(config_path, host, port, &out)?;
        }
        Commands::Generate {
            repo_url,
            model,
            output,
        } => {
            let report = commands::generate::run(
                GenerateOptions {
                    repo_url,
                    config: cli.config.clone(),
                    model,
                    output,
                },
                &out,
            )?;
            if !report.succeeded() {
                anyhow::bail!(
                    "run {} failed: {}",
                    report.run_id,
                    report.latest_log().unwrap_or("no log recorded")
                );
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => commands::config::show(config_path, format.as_str())?,
            ConfigAction::Path => commands::config::path(&out)?,
            ConfigAction::Init { force } => commands::config::init(force, &out)?,
        },
    }

    Ok(())
}

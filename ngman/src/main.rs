//! ngman - nginx configuration as a directive tree
//!
//! Command-line entry point: loads settings, sets up logging and drives
//! the configuration manager.

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use ngman_config::{validate_contexts, ConfigManager};
use ngman_core::{Settings, SettingsLoader};
use ngman_syntax::{BuildOptions, ParseOptions, Payload, SyntaxError};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// ngman - inspect and edit nginx configuration without breaking it
#[derive(Parser)]
#[command(name = "ngman")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (TOML or JSON)
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    /// Configuration directory, overrides the settings file
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Primary configuration file name inside the root
    #[arg(short = 'f', long = "file", global = true)]
    primary_file: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the parsed payload as JSON
    Tree,

    /// Print the directive tree as JSON
    Directives,

    /// Print one directive, e.g. `http/server[1]/listen`
    Get {
        path: String,
    },

    /// Replace the arguments of a directive and save
    Set {
        path: String,

        #[arg(required = true, num_args = 1..)]
        args: Vec<String>,
    },

    /// Rewrite the configuration in canonical form
    Fmt {
        /// Print the result instead of writing it
        #[arg(long)]
        dry_run: bool,
    },

    /// Load the configuration and report misplaced or unknown directives
    Check,

    /// Parse any configuration file into a payload
    Parse {
        file: PathBuf,

        /// Keep comments
        #[arg(long)]
        comments: bool,

        /// Follow include directives
        #[arg(long)]
        follow_includes: bool,
    },

    /// Build configuration text from a payload JSON file
    Build {
        payload: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = SettingsLoader::resolve(cli.settings.as_deref())?;
    if let Some(root) = cli.root {
        settings.config_root = root;
    }
    if let Some(file) = cli.primary_file {
        settings.primary_file = file;
    }

    init_tracing(&settings, cli.verbose);

    match cli.command {
        Commands::Tree => {
            let manager = open(settings)?;
            println!("{}", manager.config_tree()?.to_json_pretty()?);
        }

        Commands::Directives => {
            let manager = open(settings)?;
            println!("{}", serde_json::to_string_pretty(manager.directives()?)?);
        }

        Commands::Get { path } => {
            let manager = open(settings)?;
            let node = manager
                .directives()?
                .select(&path)
                .with_context(|| format!("no directive at {}", path))?;
            println!("{}", serde_json::to_string_pretty(node)?);
        }

        Commands::Set { path, args } => {
            let mut manager = open(settings)?;
            let node = manager
                .directives_mut()?
                .select_mut(&path)
                .with_context(|| format!("no directive at {}", path))?;
            tracing::debug!("{}: {:?} -> {:?}", path, node.args(), args);
            node.set_args(args);
            let target = manager.save()?;
            println!("✅ Updated {} in {}", path, target.display());
        }

        Commands::Fmt { dry_run } => {
            let mut manager = open(settings)?;
            if dry_run {
                print!("{}", manager.render()?);
            } else {
                let target = manager.save()?;
                println!("✅ Formatted {}", target.display());
            }
        }

        Commands::Check => {
            let manager = open(settings)?;
            for warning in manager.warnings() {
                println!("⚠️ {}", warning);
            }

            let violations = validate_contexts(manager.directives()?, manager.registry());
            for violation in &violations {
                println!("❌ {}", violation);
            }

            if !violations.is_empty() {
                eprintln!("❌ {} misplaced directive(s)", violations.len());
                std::process::exit(1);
            }
            println!(
                "✅ Configuration '{}' is valid!",
                manager.settings().primary_path().display()
            );
        }

        Commands::Parse {
            file,
            comments,
            follow_includes,
        } => {
            let options = ParseOptions {
                comments,
                single_file: !follow_includes,
                catch_errors: false,
            };
            let payload = match ngman_syntax::parse(&file, &options) {
                Ok(payload) => payload,
                Err(SyntaxError::Parse { file, source }) => {
                    print_report(Path::new(&file), &source);
                    anyhow::bail!("{} could not be parsed", file);
                }
                Err(e) => return Err(e.into()),
            };
            println!("{}", payload.to_json_pretty()?);
        }

        Commands::Build { payload } => {
            let json = std::fs::read_to_string(&payload)
                .with_context(|| format!("failed to read {}", payload.display()))?;
            let payload = Payload::from_json(&json)?;
            let options = BuildOptions {
                indent: settings.format.indent,
                tabs: settings.format.tabs,
                header: settings.format.header,
            };

            let many = payload.config.len() > 1;
            for entry in &payload.config {
                let text = ngman_syntax::build_file(entry, &options)
                    .with_context(|| format!("{} has no parsed content", entry.file))?;
                if many {
                    println!("# {}", entry.file);
                }
                print!("{}", text);
            }
        }

        Commands::Version => {
            println!("ngman v{}", ngman_core::VERSION);
        }
    }

    Ok(())
}

fn init_tracing(settings: &Settings, verbose: bool) {
    let level = if verbose { "debug" } else { settings.logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries command output
    let fmt = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let fmt = match settings.logging.format.as_str() {
        "compact" => fmt.compact().boxed(),
        _ => fmt.boxed(),
    };

    tracing_subscriber::registry().with(fmt).with(filter).init();
}

/// Open the manager, showing an annotated report when the file does not parse
fn open(settings: Settings) -> anyhow::Result<ConfigManager> {
    let primary = settings.primary_path();
    match ConfigManager::open(settings) {
        Ok(manager) => Ok(manager),
        Err(e @ ngman_core::Error::Parse { .. }) => {
            if let Ok(source) = std::fs::read_to_string(&primary) {
                if let Err(parse_error) = ngman_syntax::parse_str(&source, &ParseOptions::default()) {
                    eprint!("{}", parse_error.report(&primary.display().to_string(), &source));
                }
            }
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_report(file: &Path, error: &ngman_syntax::ParseError) {
    match std::fs::read_to_string(file) {
        Ok(source) => eprint!("{}", error.report(&file.display().to_string(), &source)),
        Err(_) => eprintln!("❌ {}", error),
    }
}

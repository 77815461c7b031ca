//! CLI entry point for compilation database resolution.
//!
//! Answers the questions an analysis front end asks before invoking a compiler-flag
//! sensitive tool: where is the database, which entry applies to a file, and what
//! environment does the toolchain need.

use anyhow::Context;
use ccdb::compdb::{EvaluationContext, WorkspaceRootProvider};
use ccdb::{
    ActiveConfigurationResolver, BuildSettingsLocator, CompilationDatabaseEntry,
    CompilationDatabaseLocator, CompilationEntryResolver, ExitCode, LocateOutcome,
    MacroEvaluationEngine, ResolutionError, Settings, ToolchainEnvironmentProvider, logging,
    stable_id,
};
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Compilation database resolver
#[derive(Parser)]
#[command(
    name = "ccdb",
    version = env!("CARGO_PKG_VERSION"),
    about = "Resolve compile_commands.json entries for the active CMake configuration",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Workspace root directory (overrides settings)
    #[arg(long, global = true, env = "CCDB_ROOT")]
    root: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the compilation database path of the active configuration
    Locate,

    /// Print the database entry whose flags apply to a file
    #[command(after_help = "Examples:\n  ccdb entry src/main.cpp\n  ccdb entry include/widget.h --database build/compile_commands.json\n  ccdb entry src/main.cpp --json")]
    Entry {
        /// Source or header file
        file: PathBuf,

        /// Use this database instead of locating one
        #[arg(long)]
        database: Option<PathBuf>,

        /// Output the raw entry as JSON
        #[arg(long)]
        json: bool,
    },

    /// Expand a `${...}` template against the workspace
    #[command(after_help = "Examples:\n  ccdb eval '${workspaceRoot}/build/${name}'\n  ccdb eval '${env.HOME}/.cache' --configuration x64-Release")]
    Eval {
        template: String,

        /// Evaluate for this configuration instead of the active one
        #[arg(long)]
        configuration: Option<String>,
    },

    /// Print the deterministic id of a string
    StableId { input: String },

    /// Run the toolchain bootstrap and print the captured environment
    Env {
        /// Parameters passed to the bootstrap script (e.g. `x64`)
        #[arg(default_value = "")]
        params: String,
    },

    /// Display active settings
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut settings = if let Some(config_path) = &cli.config {
        Settings::load_from(config_path).unwrap_or_else(|e| {
            eprintln!(
                "Configuration error loading from {}: {e}",
                config_path.display()
            );
            std::process::exit(ExitCode::ConfigError.into());
        })
    } else {
        Settings::load().unwrap_or_else(|e| {
            eprintln!("Configuration error: {e}");
            Settings::default()
        })
    };

    if let Some(root) = &cli.root {
        settings.workspace_root = Some(root.clone());
    }

    logging::init(&settings.log_level, cli.verbose);

    let code = match run(cli.command, settings).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            match e.downcast_ref::<ResolutionError>() {
                Some(resolution) => {
                    for suggestion in resolution.recovery_suggestions() {
                        eprintln!("  - {suggestion}");
                    }
                    ExitCode::from_error(resolution)
                }
                None => ExitCode::GeneralError,
            }
        }
    };

    std::process::exit(code.into());
}

async fn run(command: Commands, settings: Settings) -> anyhow::Result<ExitCode> {
    let settings = Arc::new(settings);

    match command {
        Commands::Locate => {
            let locator = CompilationDatabaseLocator::new(&settings.resolution, settings.clone());
            match locator.locate_detailed()? {
                LocateOutcome::Found(path) => {
                    println!("{}", path.display());
                    Ok(ExitCode::Success)
                }
                outcome => {
                    eprintln!("{outcome}");
                    Ok(ExitCode::NotFound)
                }
            }
        }

        Commands::Entry {
            file,
            database,
            json,
        } => {
            let file = absolute_from_cwd(&file)?;
            let locator = CompilationDatabaseLocator::new(&settings.resolution, settings.clone());
            let resolver = CompilationEntryResolver::new(locator);

            let entry = match &database {
                Some(database) => resolver.get_config_from(&absolute_from_cwd(database)?, &file)?,
                None => resolver.get_config(&file)?,
            };

            match &entry {
                Some(entry) if json => println!("{}", serde_json::to_string_pretty(entry)?),
                Some(entry) => print_entry(entry),
                None => {
                    eprintln!("No compilation database entry applies to {}", file.display());
                    if database.is_none() {
                        let outcome = resolver.locator().locate_detailed()?;
                        if outcome.path().is_none() {
                            eprintln!("{outcome}");
                        }
                    }
                }
            }
            Ok(ExitCode::from_lookup(&entry))
        }

        Commands::Eval {
            template,
            configuration,
        } => {
            let root = settings
                .workspace_root()
                .ok_or(ResolutionError::MissingWorkspaceRoot)?;
            let context = evaluation_context(&settings, &root, configuration)?;

            let value = MacroEvaluationEngine::new().evaluate(&template, &context);
            match &value {
                Some(value) => println!("{value}"),
                None => eprintln!("Template '{template}' contains an unresolvable macro"),
            }
            Ok(ExitCode::from_lookup(&value))
        }

        Commands::StableId { input } => {
            println!("{}", stable_id(&input));
            Ok(ExitCode::Success)
        }

        Commands::Env { params } => {
            let provider = ToolchainEnvironmentProvider::new(&settings.toolchain);
            let snapshot = provider.get(&params).await;
            match &snapshot {
                Some(snapshot) => {
                    for (name, value) in snapshot.iter() {
                        println!("{name}={value}");
                    }
                }
                None => eprintln!("Toolchain bootstrap produced no environment for '{params}'"),
            }
            Ok(ExitCode::from_lookup(&snapshot))
        }

        Commands::Config => {
            println!("Current Configuration:");
            println!("{}", "=".repeat(50));
            let toml_str =
                toml::to_string_pretty(settings.as_ref()).context("Error displaying config")?;
            println!("{toml_str}");
            Ok(ExitCode::Success)
        }
    }
}

/// Context the locator would use for `configuration` (default: the active one)
fn evaluation_context(
    settings: &Settings,
    root: &Path,
    configuration: Option<String>,
) -> anyhow::Result<EvaluationContext> {
    let config = &settings.resolution;
    let active = match configuration {
        Some(name) => name,
        None => ActiveConfigurationResolver::new(config).get_active_config(root)?,
    };

    let context = EvaluationContext::for_configuration(&active, root);
    let context = match BuildSettingsLocator::new(config).find(root)? {
        Some(found) => context
            .with_generator(
                found
                    .settings
                    .configuration(&active)
                    .and_then(|c| c.generator.clone()),
            )
            .with_settings_file(&found.settings_file_path)
            .with_root_descriptor(&found.root_descriptor_path),
        None => context.with_root_descriptor(root.join(&config.root_descriptor_name)),
    };
    Ok(context)
}

fn print_entry(entry: &CompilationDatabaseEntry) {
    println!("file:      {}", entry.file_path().display());
    println!("directory: {}", entry.directory());
    if let Some(command) = entry.command() {
        println!("command:   {command}");
    }
    if let Some(output) = entry.output() {
        println!("output:    {output}");
    }
    println!("arguments:");
    for argument in entry.arguments() {
        println!("  {argument}");
    }
}

fn absolute_from_cwd(path: &Path) -> anyhow::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        let cwd = std::env::current_dir().context("Cannot determine current directory")?;
        Ok(cwd.join(path))
    }
}

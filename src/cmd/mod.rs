mod export;
mod inspect;
mod list;
mod profile;

use crate::config::DbviewConfig;
use crate::loader::{DetectorCatalog, Loader};
use crate::schema::Database;
use anyhow::{bail, Context};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "dbview")]
#[command(version)]
#[command(about = "Render the relations of a database schema as Graphviz diagrams", long_about = None)]
pub struct Cli {
    /// YAML config file (default: <config dir>/dbview/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging on stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export a schema diagram in Graphviz DOT format
    Export {
        /// Input SQL schema dump (supports .gz, .bz2, .xz, .zst compression)
        file: Option<PathBuf>,

        /// Named profile supplying the input and loader settings
        #[arg(short, long)]
        profile: Option<String>,

        /// Detail tier: full, medium, light
        #[arg(short, long, conflicts_with = "exporter")]
        detail: Option<String>,

        /// Exporter by registry name (see `dbview list exporters`)
        #[arg(short, long)]
        exporter: Option<String>,

        /// Layout direction: lr (horizontal), tb (vertical)
        #[arg(short, long)]
        layout: Option<String>,

        /// Output file (default: stdout); an existing file is replaced
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only draw these tables and their surroundings (comma-separated)
        #[arg(short, long, conflicts_with = "path_between")]
        zoom: Option<String>,

        /// Number of relation hops to expand around the zoomed tables
        #[arg(long, default_value_t = 0, requires = "zoom")]
        zoom_level: usize,

        /// Only draw the shortest paths between two tables (comma-separated pair)
        #[arg(long)]
        path_between: Option<String>,

        /// Number of shortest paths to draw
        #[arg(long, default_value_t = 1, requires = "path_between")]
        path_limit: usize,

        /// Keep only tables matching these glob patterns (comma-separated)
        #[arg(short, long)]
        tables: Option<String>,

        /// Drop tables matching these glob patterns (comma-separated)
        #[arg(long)]
        exclude: Option<String>,

        /// Soft foreign key detector (see `dbview list detectors`)
        #[arg(long)]
        soft_fk: Option<String>,

        /// Database name shown in output (default: input file stem)
        #[arg(long)]
        name: Option<String>,
    },

    /// Print the loaded entity model and its relations
    Inspect {
        /// Input SQL schema dump (supports .gz, .bz2, .xz, .zst compression)
        file: Option<PathBuf>,

        /// Named profile supplying the input and loader settings
        #[arg(short, long)]
        profile: Option<String>,

        /// Soft foreign key detector (see `dbview list detectors`)
        #[arg(long)]
        soft_fk: Option<String>,

        /// Database name shown in output (default: input file stem)
        #[arg(long)]
        name: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List registered exporters or soft foreign key detectors
    List {
        #[arg(value_enum)]
        what: ListTarget,
    },

    /// Manage named input profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ListTarget {
    Exporters,
    Detectors,
}

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Create a profile
    Add {
        name: String,
        #[command(flatten)]
        settings: ProfileSettings,
    },
    /// Change the given settings of a profile
    Update {
        name: String,
        #[command(flatten)]
        settings: ProfileSettings,
    },
    /// Delete a profile
    Remove { name: String },
    /// Print one profile
    Show { name: String },
    /// List profile names
    List,
}

#[derive(clap::Args)]
pub struct ProfileSettings {
    /// Schema dump path
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Database name shown in output
    #[arg(long)]
    pub database_name: Option<String>,

    /// Soft foreign key detector
    #[arg(long)]
    pub soft_fk: Option<String>,
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => DbviewConfig::default_path()
            .context("Cannot determine the config directory; pass --config")?,
    };
    let config = DbviewConfig::load_or_default(&config_path)?;

    match cli.command {
        Commands::Export {
            file,
            profile,
            detail,
            exporter,
            layout,
            output,
            zoom,
            zoom_level,
            path_between,
            path_limit,
            tables,
            exclude,
            soft_fk,
            name,
        } => export::run(
            &config,
            InputArgs {
                file,
                profile,
                soft_fk,
                name,
            },
            detail,
            exporter,
            layout,
            output,
            zoom,
            zoom_level,
            path_between,
            path_limit,
            tables,
            exclude,
        ),
        Commands::Inspect {
            file,
            profile,
            soft_fk,
            name,
            json,
        } => inspect::run(
            &config,
            InputArgs {
                file,
                profile,
                soft_fk,
                name,
            },
            json,
        ),
        Commands::List { what } => list::run(what),
        Commands::Profile { action } => profile::run(config, &config_path, action),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "dbview", &mut io::stdout());
            Ok(())
        }
    }
}

/// Where the entity model comes from
pub struct InputArgs {
    pub file: Option<PathBuf>,
    pub profile: Option<String>,
    pub soft_fk: Option<String>,
    pub name: Option<String>,
}

impl InputArgs {
    /// Resolve command-line values over profile values and load the database
    pub fn load(self, config: &DbviewConfig) -> anyhow::Result<Database> {
        let profile = match &self.profile {
            Some(name) => match config.profile(name) {
                Some(profile) => profile.clone(),
                None => bail!("Unknown profile: {}", name),
            },
            None => Default::default(),
        };

        let Some(file) = self.file.or(profile.input) else {
            bail!("No input given: pass a schema dump file or --profile");
        };
        if !file.exists() {
            bail!("input file does not exist: {}", file.display());
        }

        let mut loader = Loader::new();
        if let Some(name) = self.name.or(profile.database_name) {
            loader = loader.database_name(name);
        }
        if let Some(detector) = self.soft_fk.or(profile.soft_fk_detector) {
            loader = loader.soft_fk_detector(DetectorCatalog::with_builtins().create(&detector)?);
        }

        eprintln!("Loading schema: {}", file.display());
        load_with(&loader, &file)
    }
}

fn load_with(loader: &Loader, file: &Path) -> anyhow::Result<Database> {
    let db = loader.load_path(file)?;
    if db.is_empty() {
        eprintln!("No tables found in the file.");
    }
    Ok(db)
}

use anyhow::Result;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::process::ExitCode;

use claudeswap::{
    commands::{self, AddOptions},
    logging,
    paths::Paths,
    ui::{ColorMode, Ui},
};

#[derive(Parser)]
#[command(name = "claudeswap")]
#[command(about = "Switch Claude Code between API providers and model profiles")]
#[command(version)]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// When to use colors: always, auto, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: ColorMode,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all available profiles
    List,

    /// Switch Claude Code to a profile
    Use {
        /// Name of the profile to activate
        name: String,
    },

    /// Print the active profile
    Current {
        /// Also show when it was switched and whether the settings still match
        #[arg(short, long)]
        long: bool,
    },

    /// Add a new profile
    Add {
        /// Name of the profile to create
        name: String,

        /// Start from a built-in provider preset (see `claudeswap presets`)
        #[arg(long)]
        preset: Option<String>,

        /// Anthropic-compatible API endpoint
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,

        /// API token, or env:<VARIABLE> to read it at switch time
        #[arg(long)]
        token: Option<String>,

        /// Model for a slot: default, small-fast, haiku, sonnet, opus
        #[arg(long = "model", value_name = "SLOT=MODEL")]
        models: Vec<String>,

        /// Extra environment variable for Claude Code
        #[arg(long = "env", value_name = "KEY=VALUE")]
        env: Vec<String>,

        /// Request timeout in milliseconds
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,

        /// Free-form description
        #[arg(long)]
        description: Option<String>,

        /// Overwrite an existing profile
        #[arg(short, long)]
        force: bool,
    },

    /// Show detailed information about a profile
    Show {
        /// Name of the profile to show
        name: String,
    },

    /// Open a profile file in your editor
    Edit {
        /// Name of the profile to edit
        name: String,
    },

    /// Remove a profile
    Remove {
        /// Name of the profile to remove
        name: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Rename a profile
    Rename {
        /// Current name
        old_name: String,

        /// New name
        new_name: String,
    },

    /// Remove claudeswap's entries from Claude Code's settings
    Reset,

    /// List built-in provider presets
    Presets,

    /// Manage backups of Claude Code's settings
    Backup {
        #[command(subcommand)]
        command: BackupCommands,
    },

    /// Run diagnostics on the claudeswap setup
    Doctor,

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum BackupCommands {
    /// List all backups
    List,

    /// Restore a backup over Claude Code's settings
    Restore {
        /// Backup ID (see `claudeswap backup list`)
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            let _ = e.print();
            return code;
        }
    };

    let ui = Ui::new(cli.color, cli.no_color);
    if let Err(e) = logging::init(cli.verbose, cli.quiet) {
        ui.warn(format!("Logging disabled: {e}"));
    }

    match run(cli.command, &ui) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui.report(&e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, ui: &Ui) -> Result<()> {
    if let Commands::Completions { shell } = command {
        clap_complete::generate(shell, &mut Cli::command(), "claudeswap", &mut std::io::stdout());
        return Ok(());
    }
    if let Commands::Presets = command {
        return commands::presets(ui);
    }

    let paths = Paths::new()?;

    match command {
        Commands::List => commands::list(&paths, ui),
        Commands::Use { name } => commands::use_profile(&paths, &name, ui),
        Commands::Current { long } => commands::current(&paths, ui, long),
        Commands::Add {
            name,
            preset,
            base_url,
            token,
            models,
            env,
            timeout_ms,
            description,
            force,
        } => commands::add(
            &paths,
            AddOptions {
                name,
                preset,
                base_url,
                token,
                models,
                env,
                timeout_ms,
                description,
                force,
            },
            ui,
        ),
        Commands::Show { name } => commands::show(&paths, &name, ui),
        Commands::Edit { name } => commands::edit(&paths, &name, ui),
        Commands::Remove { name, force } => commands::remove(&paths, &name, ui, force),
        Commands::Rename { old_name, new_name } => {
            commands::rename(&paths, &old_name, &new_name, ui)
        }
        Commands::Reset => commands::reset(&paths, ui),
        Commands::Backup { command } => match command {
            BackupCommands::List => commands::backup_list(&paths, ui),
            BackupCommands::Restore { id, yes } => commands::backup_restore(&paths, &id, ui, yes),
        },
        Commands::Doctor => commands::doctor(&paths, ui),
        Commands::Presets | Commands::Completions { .. } => Ok(()),
    }
}

#![forbid(unsafe_code)]

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ytlearn_engines::ai_client::{GeminiClient, GeminiConfig};
use ytlearn_engines::device_vault::{resolve_gemini_api_key, DeviceVault};
use ytlearn_os::generation::{GenerationConfig, GenerationWiring};
use ytlearn_storage::StoreConfig;
use ytlearn_tools::creation_cli::{
    build_generation_options, delete_creation, export_creation, get_preferences, list_creations,
    open_local_repo, progress_line, set_preference, show_creation, GenerateArgs,
};
use ytlearn_tools::logging::init_logging;
use ytlearn_tools::vault_cli::{execute_vault_command, parse_secret_id};

#[derive(Parser, Debug)]
#[command(name = "ytlearn")]
#[command(about = "Turn a YouTube video or a PDF into a quiz, flashcards or a game", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a new creation and print its id
    Generate {
        #[arg(long, conflicts_with = "pdf")]
        youtube: Option<String>,
        #[arg(long)]
        pdf: Option<PathBuf>,
        /// quiz, flashcards or interactive
        #[arg(long = "type", default_value = "quiz")]
        game_type: String,
        #[arg(long)]
        difficulty: Option<String>,
        /// Questions or cards, 1 to 50
        #[arg(long)]
        count: Option<u8>,
        #[arg(long)]
        instructions: Option<String>,
        #[arg(long)]
        title: Option<String>,
    },
    /// List creations, newest first
    List,
    /// Print the playable HTML of a creation
    Show { id: String },
    /// Write the playable HTML of a creation to a file
    Export { id: String, out: PathBuf },
    Delete { id: String },
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
    /// Manage the local encrypted secret vault
    Vault {
        #[command(subcommand)]
        action: VaultAction,
    },
}

#[derive(Subcommand, Debug)]
enum PrefsAction {
    Get,
    Set { key: String, value: String },
}

#[derive(Subcommand, Debug)]
enum VaultAction {
    Set { secret_id: String },
    Has { secret_id: String },
    Del { secret_id: String },
}

fn main() {
    init_logging();
    match run(Cli::parse()) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    }
}

fn run(cli: Cli) -> Result<String, String> {
    let store_config = StoreConfig::from_env();
    tracing::debug!(path = %store_config.data_path.display(), "local store");
    match cli.command {
        Commands::Generate {
            youtube,
            pdf,
            game_type,
            difficulty,
            count,
            instructions,
            title,
        } => {
            let options = build_generation_options(&GenerateArgs {
                youtube: youtube.as_deref(),
                pdf: pdf.as_deref(),
                game_type: &game_type,
                difficulty: difficulty.as_deref(),
                count,
                instructions: instructions.as_deref(),
                title: title.as_deref(),
            })?;
            let mut gemini = GeminiConfig::from_env();
            if gemini.api_key.is_none() {
                gemini.api_key = resolve_gemini_api_key();
            }
            let wiring = GenerationWiring::new(
                GenerationConfig::from_env(),
                GeminiClient::new(gemini),
                open_local_repo(&store_config),
            )
            .map_err(|e| e.to_string())?;
            let creation = wiring
                .generate_with_progress(&options, |p| eprintln!("{}", progress_line(p)))
                .map_err(|e| e.to_string())?;
            Ok(creation.id)
        }
        Commands::List => Ok(list_creations(&open_local_repo(&store_config))),
        Commands::Show { id } => show_creation(&open_local_repo(&store_config), &id),
        Commands::Export { id, out } => {
            export_creation(&open_local_repo(&store_config), &id, &out)
        }
        Commands::Delete { id } => delete_creation(&open_local_repo(&store_config), &id),
        Commands::Prefs { action } => {
            let repo = open_local_repo(&store_config);
            match action {
                PrefsAction::Get => get_preferences(&repo),
                PrefsAction::Set { key, value } => set_preference(&repo, &key, &value),
            }
        }
        Commands::Vault { action } => {
            let vault = DeviceVault::default_local();
            match action {
                VaultAction::Set { secret_id } => {
                    let id = parse_secret_id(&secret_id)?;
                    let value = read_secret_value(id.as_str())?;
                    execute_vault_command(&vault, "set", Some(&secret_id), Some(&value))
                }
                VaultAction::Has { secret_id } => {
                    execute_vault_command(&vault, "has", Some(&secret_id), None)
                }
                VaultAction::Del { secret_id } => {
                    execute_vault_command(&vault, "del", Some(&secret_id), None)
                }
            }
        }
    }
}

fn read_secret_value(secret_id: &str) -> Result<String, String> {
    let value = if io::stdin().is_terminal() {
        rpassword::prompt_password(format!("Enter value for {secret_id}:"))
            .map_err(|e| e.to_string())?
    } else {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .map_err(|e| e.to_string())?;
        input
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("secret value must not be empty".to_string());
    }
    Ok(trimmed.to_string())
}

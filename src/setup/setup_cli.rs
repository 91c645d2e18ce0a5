use clap::{Parser, Subcommand};
use sitebase_backend::config::Config;
use sitebase_backend::setup::db_setup;
use sitebase_backend::AppState;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "setup_cli",
    author,
    version,
    about = "A CLI for initial backend setup.",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
    Storage {
        #[command(subcommand)]
        action: StorageAction,
    },
}

#[derive(Subcommand, Debug)]
enum DbAction {
    /// Print the SQL that creates the tables, policies and bucket.
    Schema,
    /// List every collection through the configured backend.
    Check,
}

#[derive(Subcommand, Debug)]
enum StorageAction {
    /// Print the public URL issued for an object path.
    Url { path: String },
}

#[actix_web::main]
async fn main() {
    let cli = Cli::parse();

    let config = Config::from_env(&cli.env_file)
        .expect("FATAL: Failed to load or parse configuration.");
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(&config.log_level));

    match &cli.command {
        Commands::Db { action } => match action {
            DbAction::Schema => println!("{}", db_setup::schema_sql(&config.storage_bucket)),
            DbAction::Check => check_backend(&config).await,
        },
        Commands::Storage { action } => match action {
            StorageAction::Url { path } => {
                let state = AppState::from_config(&config)
                    .expect("FATAL: Failed to initialise the backend clients.");
                println!("{}", state.blobs.public_url(path.trim_start_matches('/')));
            }
        },
    }
}

async fn check_backend(config: &Config) {
    let state = match AppState::from_config(config) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("❌ Error: Could not create backend clients: {}", e);
            return;
        }
    };
    println!("Checking collections ({:?} backend)...", config.backend_mode);

    match db_setup::check_collections(state.records.as_ref()).await {
        Ok(reports) => {
            for report in reports {
                println!("- {:<14} {} row(s)", report.collection.table_name(), report.rows);
            }
            println!("✅ All collections are reachable.");
        }
        Err(e) => eprintln!("❌ Error checking collections: {}", e),
    }
}

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::mpsc;

use newsdigest::app::{build_http_client, App, AppEvent};
use newsdigest::config::{process_env, Config};
use newsdigest::content::ReaderClient;
use newsdigest::digest::{DigestController, Phase};
use newsdigest::keybindings::KeybindingRegistry;
use newsdigest::news::GeminiClient;
use newsdigest::storage::{Database, DatabaseError};
use newsdigest::ui;

/// Get the config directory path (~/.config/newsdigest/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let config_dir = PathBuf::from(home).join(".config").join("newsdigest");
    Ok(config_dir)
}

#[derive(Parser, Debug)]
#[command(
    name = "newsdigest",
    about = "A 24-hour thematic news summary powered by Gemini"
)]
struct Args {
    /// Fetch one digest, print it as plain text and exit
    #[arg(long)]
    print: bool,

    /// Delete saved stories and the stored theme
    #[arg(long)]
    reset_db: bool,

    /// Use an alternate config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

/// Send logs to a file in the config directory; the TUI owns the terminal.
///
/// Filtering follows `RUST_LOG`, defaulting to `info` for this crate.
fn init_logging(config_dir: &Path) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("newsdigest=info"));

    let log_path = config_dir.join("newsdigest.log");
    match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init(),
        Err(e) => {
            eprintln!(
                "Warning: cannot open log file {}: {}",
                log_path.display(),
                e
            );
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::sink)
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up config directory
    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        println!("Created config directory: {}", config_dir.display());
    }

    // User-only access: the directory holds the config (API keys) and state
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = std::fs::metadata(&config_dir) {
            let mut perms = metadata.permissions();
            perms.set_mode(0o700);
            if let Err(e) = std::fs::set_permissions(&config_dir, perms) {
                eprintln!(
                    "Warning: failed to restrict permissions on {}: {}",
                    config_dir.display(),
                    e
                );
            }
        }
    }

    init_logging(&config_dir);

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    tracing::debug!(config = ?config, "Configuration resolved");

    let db_path = config_dir.join("newsdigest.db");

    // Handle --reset-db flag
    if args.reset_db && db_path.exists() {
        std::fs::remove_file(&db_path).context("Failed to delete database")?;
        println!("Local state reset.");
    }

    let Some(gemini_key) = config.resolve_gemini_key(process_env) else {
        eprintln!("Error: no Gemini API key configured.");
        eprintln!();
        eprintln!("Set GEMINI_API_KEY in the environment, or add");
        eprintln!("  gemini_api_key = \"...\"");
        eprintln!("to {}", config_path.display());
        std::process::exit(1);
    };

    let http = build_http_client().context("Failed to create HTTP client")?;

    let mut gemini = GeminiClient::new(http.clone(), gemini_key)
        .with_model(&config.model)
        .with_search_grounding(config.search_grounding)
        .with_prompt(&config.prompt_options());
    if let Some(base_url) = &config.api_base_url {
        gemini = gemini
            .with_base_url(base_url)
            .context("Invalid api_base_url in config")?;
    }
    tracing::info!(
        model = %gemini.model(),
        region = %config.region,
        print = args.print,
        "Starting newsdigest"
    );

    // Open database
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of newsdigest appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::anyhow!("Failed to open database: {}", e));
        }
    };

    let mut digest = DigestController::load(db.clone(), config.default_theme())
        .await
        .with_region(&config.region)
        .with_reveal_interval(config.reveal_interval());

    if args.print {
        digest.refresh_with(&gemini).await;
        digest.reveal_all();
        print!("{}", ui::render_plain(&digest));
        let failed = matches!(digest.phase(), Phase::Failed(_));
        db.close().await;
        if failed {
            std::process::exit(1);
        }
        return Ok(());
    }

    let mut keybindings = KeybindingRegistry::new();
    for warning in keybindings.apply_overrides(&config.keybindings) {
        tracing::warn!(warning = %warning, "Keybinding override skipped");
    }

    let reader = ReaderClient::new(http, config.resolve_jina_key(process_env));
    let mut app = App::new(digest, gemini, reader)
        .with_prefetch(config.prefetch)
        .with_keybindings(keybindings);

    // Create event channel for background tasks
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    // Run the TUI
    ui::run(&mut app, event_tx, event_rx).await?;

    drop(app);
    db.close().await;
    println!("Goodbye!");
    Ok(())
}

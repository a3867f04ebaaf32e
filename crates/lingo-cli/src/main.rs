use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use lingo_chat::TurnEvent;
use lingo_core::config::{Config, LoggingConfig};
use lingo_gateway::AppState;

#[derive(Parser)]
#[command(
    name = "lingo",
    about = "Multilingual voice chatbot — talk to Gemini in any language",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server with the embedded chat UI
    Serve {
        /// Port to listen on (default: 7860)
        #[arg(long)]
        port: Option<u16>,

        /// Serve the API only, without the embedded UI
        #[arg(long)]
        no_ui: bool,
    },

    /// Send one message and print the streamed response
    Chat {
        /// Message to send
        #[arg(short, long)]
        message: String,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show configuration status and validation results
    Status,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Get a specific config value (dotted path, e.g. "gateway.port")
    Get { key: String },
}

fn init_logging(logging: &LoggingConfig, verbose: bool) {
    let default_level = if verbose {
        "debug".to_string()
    } else {
        logging.level.clone().unwrap_or_else(|| "info".to_string())
    };

    let mut directives = vec![default_level];
    directives.extend(logging.filters.iter().cloned());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(directives.join(",")));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_deref()
        .map(lingo_core::config::expand_path)
        .unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path)?;

    init_logging(&config.logging.clone().unwrap_or_default(), cli.verbose);

    match cli.command {
        Commands::Serve { port, no_ui } => {
            let port = port.unwrap_or_else(|| config.gateway_port());
            let state = AppState::new(Arc::new(config))?;
            tracing::info!("Starting Lingo gateway on port {port}");
            lingo_gateway::start_server(state, port, !no_ui).await?;
        }
        Commands::Chat { message } => {
            let state = AppState::new(Arc::new(config))?;
            run_one_shot(&state, &message).await?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let json = serde_json::to_string_pretty(&config)?;
                println!("{json}");
            }
            ConfigAction::Get { key } => match config.get_path(&key) {
                Some(value) => println!("{value}"),
                None => {
                    eprintln!("Unknown config key: {key}");
                    std::process::exit(1);
                }
            },
        },
        Commands::Status => {
            println!("Lingo v{}", env!("CARGO_PKG_VERSION"));
            println!("Config: {}", config_path.display());
            println!("Model: {}", config.model());
            println!("Gateway port: {}", config.gateway_port());
            println!(
                "Voice: {}",
                if config.voice_enabled() {
                    "enabled"
                } else {
                    "disabled"
                }
            );

            let (warnings, errors) = config.validate();
            for warning in &warnings {
                println!("Warning: {warning}");
            }
            for error in &errors {
                println!("Error: {error}");
            }
            if warnings.is_empty() && errors.is_empty() {
                println!("Configuration OK");
            }
            if !errors.is_empty() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Run a single turn against the live services, printing fragments as they
/// stream in. Translated fragments follow the English response.
async fn run_one_shot(state: &AppState, message: &str) -> anyhow::Result<()> {
    use std::io::Write;

    let (tx, mut rx) = mpsc::unbounded_channel::<TurnEvent>();

    let printer = tokio::spawn(async move {
        let mut translated: Vec<String> = Vec::new();
        while let Some(event) = rx.recv().await {
            match event {
                TurnEvent::Detected { lang } => {
                    tracing::debug!("Detected language: {lang}");
                }
                TurnEvent::Fragment { text } => {
                    print!("{text}");
                    let _ = std::io::stdout().flush();
                }
                TurnEvent::TranslatedFragment { text } => {
                    translated.push(text);
                }
                TurnEvent::Completed => {
                    println!();
                    if !translated.is_empty() {
                        println!();
                        println!("{}", translated.join(""));
                    }
                }
                TurnEvent::Failed { message } => {
                    eprintln!("Turn failed: {message}");
                }
            }
        }
    });

    let result = {
        let mut guard = state.chat.lock().await;
        let chat = &mut *guard;
        lingo_chat::run_turn(
            message,
            &mut chat.transcript,
            &mut chat.session,
            state.translator.as_ref(),
            state.conversation.as_ref(),
            &tx,
        )
        .await
    };

    drop(tx);
    printer.await?;

    let summary = result?;
    tracing::debug!(
        "Turn complete: {} fragments in {}ms",
        summary.fragments,
        summary.duration_ms
    );
    Ok(())
}

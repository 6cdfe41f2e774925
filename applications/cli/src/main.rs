/// Encore CLI - terminal playback session
use clap::{Parser, Subcommand};
use encore_cli::{
    catalog::load_catalog,
    config::CliConfig,
    engine::SimulatedEngine,
    platform::{LoggedHaptics, TerminalRoutePicker},
    shell::{spawn_event_printer, Shell},
};
use encore_playback::{
    engine_channel, mode_presentation, spawn_session, PlaybackMode, PlaybackSession,
    SessionCommand,
};
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "encore-cli")]
#[command(about = "Encore playback session in the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a catalog interactively
    Play {
        /// JSON catalog of tracks
        #[arg(short, long)]
        catalog: PathBuf,

        /// Configuration file path
        #[arg(long, env = "ENCORE_CONFIG")]
        config: Option<PathBuf>,

        /// Track id to start with
        #[arg(short, long)]
        start: Option<String>,
    },
    /// List playback modes in cycle order
    Modes,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "encore_cli=info,encore_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            catalog,
            config,
            start,
        } => {
            play(catalog, config, start).await?;
        }
        Commands::Modes => {
            list_modes();
        }
    }

    Ok(())
}

async fn play(
    catalog: PathBuf,
    config_path: Option<PathBuf>,
    start: Option<String>,
) -> anyhow::Result<()> {
    // Load configuration
    let config = CliConfig::load(config_path.as_deref())?;
    config.validate()?;

    let tracks = load_catalog(&catalog)?;

    let (engine_events, engine_rx) = engine_channel();
    let engine = SimulatedEngine::spawn(&config.engine, &tracks, engine_events);

    let mut session = PlaybackSession::new(engine, config.session.clone())
        .with_haptics(Box::new(LoggedHaptics))
        .with_route_picker(Box::new(TerminalRoutePicker));
    let track_count = tracks.len();
    session.replace_queue(tracks)?;

    let (handle, task) = spawn_session(session, engine_rx);
    let printer = spawn_event_printer(handle.subscribe());
    tracing::info!("Session ready with {} tracks", track_count);

    if let Some(id) = start {
        handle.execute(SessionCommand::SelectTrack(id)).await?;
    }

    let mut shell = Shell::new(handle.clone());
    shell
        .run(BufReader::new(tokio::io::stdin()), &mut std::io::stdout())
        .await?;

    handle.shutdown()?;
    // Every event sender has to go before the printer sees the end
    drop(shell);
    drop(handle);
    task.await?;
    printer.await?;

    Ok(())
}

fn list_modes() {
    let mut mode = PlaybackMode::default();
    for _ in 0..3 {
        let presentation = mode_presentation(mode);
        println!("{:<10} {:<12} {}", presentation.icon, presentation.label, serde_mode(mode));
        mode = mode.cycled();
    }
}

fn serde_mode(mode: PlaybackMode) -> String {
    serde_json::to_value(mode)
        .ok()
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_default()
}

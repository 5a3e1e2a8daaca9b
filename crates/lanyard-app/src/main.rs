mod boot;
mod cli;
mod render;

use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use lanyard_common::LanyardError;
use lanyard_config::schema::LoggingConfig;
use lanyard_config::LanyardConfig;
use lanyard_presence::display::now_millis;
use lanyard_presence::{PresenceClient, PresenceView, SessionEvents};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use render::RenderOptions;

/// Why the follow loop woke up.
enum Wake {
    Changed,
    Tick,
    Stop,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    let log = boot::init_logging(&boot::log_directive(
        args.log_level.as_deref(),
        &LoggingConfig::default(),
    ));
    tracing::info!("Lanyard v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(ref path) = args.config {
        tracing::info!("Using config override: {}", path.display());
    }

    let config = match boot::load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("lanyard: {e}");
            return ExitCode::from(2);
        }
    };
    let directive = boot::log_directive(args.log_level.as_deref(), &config.logging);
    boot::apply_log_directive(&log, &directive);

    match run(args, config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("lanyard: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: cli::Args, config: LanyardConfig) -> Result<ExitCode, LanyardError> {
    let session_config = boot::session_config(&config.presence);
    let prefer_streaming = config.presence.prefer_streaming && !args.no_socket;
    let client =
        PresenceClient::new(session_config).map_err(|e| LanyardError::Network(e.to_string()))?;

    let (mut session, events) = client.open(&args.subject, prefer_streaming)?;
    tracing::info!(session = %session.id(), subject = %session.subject(), "watching presence");

    // Only the combined view is rendered; the per-kind channels are dropped.
    let SessionEvents { mut view, .. } = events;
    let options = RenderOptions::new(&config.display, args.diagnostics, args.json || args.once);
    let tick = Duration::from_millis(config.display.tick_interval_ms.into());

    let code = if args.once {
        once(&mut view, &options).await
    } else {
        follow(&mut view, &options, tick).await?;
        ExitCode::SUCCESS
    };

    session.close().await;
    tracing::info!("Shutdown complete");
    Ok(code)
}

/// Wait for the first settled state, print it, and report whether a
/// snapshot was obtained.
async fn once(view: &mut watch::Receiver<PresenceView>, options: &RenderOptions) -> ExitCode {
    let settled = tokio::select! {
        state = view.wait_for(|v| !v.loading) => state.map(|v| v.clone()).ok(),
        _ = tokio::signal::ctrl_c() => None,
    };

    match settled {
        Some(state) => {
            println!("{}", options.render(&state, now_millis()));
            if state.snapshot.is_some() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        None => ExitCode::FAILURE,
    }
}

/// Re-render on every view change and on every tick until interrupted.
async fn follow(
    view: &mut watch::Receiver<PresenceView>,
    options: &RenderOptions,
    tick: Duration,
) -> Result<(), LanyardError> {
    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut stdout = std::io::stdout();

    loop {
        let wake = tokio::select! {
            _ = tokio::signal::ctrl_c() => Wake::Stop,
            changed = view.changed() => match changed {
                Ok(()) => Wake::Changed,
                Err(_) => Wake::Stop,
            },
            _ = ticker.tick() => Wake::Tick,
        };

        let state = match wake {
            Wake::Stop => {
                tracing::info!("Stopping");
                return Ok(());
            }
            // JSON consumers get one line per state change, not per tick.
            Wake::Tick if options.json => continue,
            Wake::Changed | Wake::Tick => view.borrow_and_update().clone(),
        };

        let frame = options.render(&state, now_millis());
        if options.json {
            writeln!(stdout, "{frame}")?;
        } else {
            write!(stdout, "\x1b[2J\x1b[H{frame}")?;
        }
        stdout.flush()?;
    }
}

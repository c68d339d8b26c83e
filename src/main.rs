use std::sync::Arc;

use futures::StreamExt;
use onboard_assist::channels::render::{self, Output};
use onboard_assist::channels::{Channel, CliChannel, Command, IncomingMessage, OutgoingResponse};
use onboard_assist::config::SimConfig;
use onboard_assist::router::{Route, View};
use onboard_assist::simulator::Simulator;
use onboard_assist::store::{FlagBackend, FlagStore, LibSqlBackend, MemoryBackend};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the subscriber. The returned guard flushes the log file on drop.
fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match std::env::var("ONBOARD_ASSIST_LOG_DIR") {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "onboard-assist.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _log_guard = init_tracing();

    let config = SimConfig::from_env()?;

    eprintln!("🧭 Onboard Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Database: {}", config.db_path.display());
    eprintln!("   Type /help for commands. /quit to exit.\n");

    // ── Flag store ───────────────────────────────────────────────────────
    let durable: Arc<dyn FlagBackend> = match LibSqlBackend::new_local(&config.db_path).await {
        Ok(backend) => Arc::new(backend),
        Err(e) => {
            warn!(error = %e, "Durable store unavailable, preferences will not persist");
            Arc::new(MemoryBackend::new("durable"))
        }
    };
    let store = Arc::new(FlagStore::new(
        Arc::new(MemoryBackend::new("session")),
        durable,
    ));

    let sim = Arc::new(Simulator::new(config, store));
    if sim.startup().await {
        info!("Seed version changed, durable flags reset");
    }

    // ── Channel ──────────────────────────────────────────────────────────
    let channel = Arc::new(CliChannel::new());

    let mut events = sim.subscribe();
    let printer = {
        let channel = Arc::clone(&channel);
        tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let result = match render::event_output(&event) {
                    Some(Output::Respond(response)) => channel.respond(None, response).await,
                    Some(Output::Status(status)) => channel.send_status(status).await,
                    None => Ok(()),
                };
                if let Err(e) = result {
                    warn!(error = %e, "Failed to print event");
                }
            }
        })
    };

    let mut input = channel.start().await?;
    loop {
        let msg = tokio::select! {
            msg = input.next() => match msg {
                Some(msg) => msg,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        };

        let command = match Command::parse(&msg.content) {
            Ok(Command::Quit) => break,
            Ok(command) => command,
            Err(e) => {
                channel
                    .respond(Some(&msg), OutgoingResponse::text(e.to_string()))
                    .await?;
                continue;
            }
        };

        if let Err(e) = handle(&sim, channel.as_ref(), &msg, command).await {
            channel
                .respond(Some(&msg), OutgoingResponse::text(format!("⚠️  {e}")))
                .await?;
        }
    }

    printer.abort();
    channel.shutdown().await?;
    eprintln!("Bye.");
    Ok(())
}

async fn handle(
    sim: &Simulator,
    channel: &dyn Channel,
    msg: &IncomingMessage,
    command: Command,
) -> anyhow::Result<()> {
    let reply = match command {
        Command::Login { email, password } => {
            let route = sim.login(&email, &password).await?;
            format!("Welcome, {email}.\n\n{}", show(sim, route).await)
        }
        Command::Logout => {
            sim.logout().await;
            "Logged out. Simulation state was reset.".to_string()
        }
        Command::Dashboard => {
            let route = sim.navigate(View::Dashboard, None).await;
            show(sim, route).await
        }
        Command::Open(case_id) => {
            sim.open_chat(&case_id).await?;
            let name = sim
                .journey(&case_id)
                .await
                .map(|j| j.name)
                .unwrap_or(case_id);
            format!("Chat opened for {name}. Type a message, /close to leave.")
        }
        Command::Close => {
            sim.close_chat().await;
            "Chat closed.".to_string()
        }
        Command::Go { view, id } => {
            let route = sim.navigate(view, id.as_deref()).await;
            show(sim, route).await
        }
        Command::Back => {
            let route = sim.back().await;
            show(sim, route).await
        }
        Command::Feed(count) => render::feed(&sim.telemetry(count).await),
        Command::Mode => format!("User mode: {}", sim.user_mode().await),
        Command::Help => onboard_assist::channels::commands::HELP.to_string(),
        Command::Chat(text) => {
            sim.send(&text).await?;
            return Ok(());
        }
        Command::Empty | Command::Quit => return Ok(()),
    };

    channel
        .respond(Some(msg), OutgoingResponse::text(reply))
        .await?;
    Ok(())
}

/// Describe the view a route landed on.
async fn show(sim: &Simulator, route: Route) -> String {
    match route {
        Route::Login => "Please /login first.".to_string(),
        Route::Dashboard => render::dashboard(&sim.dashboard().await),
        Route::Survey => "Survey view (nothing to show here yet).".to_string(),
        Route::Journey { case_id } => match sim.journey(&case_id).await {
            Some(j) => format!(
                "{} {}: {} ({}%), {} open exception(s). /open {} to chat.",
                j.case_id,
                j.name,
                j.stage.label(),
                j.progress,
                j.exception_count,
                j.case_id
            ),
            None => format!("Now at /journey/{case_id}"),
        },
    }
}

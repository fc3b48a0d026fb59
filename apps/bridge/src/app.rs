//! Bridge orchestrator: wires the controller to the console.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use harmony_auth::AuthClient;
use harmony_remote::{
    CommandOutcome, HarmonyController, HarmonyEvent, IntentCommand, LiveConnector, spawn_refresh,
};

use crate::config::BridgeConfig;

const HELP: &str = "\
commands:
  <intent> <entity>[,<entity>...] [source label]
  status     print entity states as JSON
  refresh    refresh the session token now
  help       show this text
intents: turn_on turn_off toggle play pause play_pause stop next_track
         previous_track volume_up volume_down mute select_source";

/// Runs the bridge until stdin closes or Ctrl-C.
pub async fn run(config: BridgeConfig) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let controller = Arc::new(build_controller(&config)?);

    // -- Events --
    if let Some(mut events) = controller.take_events().await {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                log_event(&event);
            }
        });
    }

    // -- Entities --
    let entities = controller.initialize().await?;
    for entity in &entities {
        println!("{entity}");
    }

    // -- Token refresh --
    let refresh = spawn_refresh(
        Arc::clone(&controller),
        config.refresh_schedule(),
        cancel.clone(),
    );

    tracing::info!(hub = %config.hub_addr(), "bridge ready");

    // -- Main loop: one command per line --
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!("SIGINT received, shutting down");
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let output = dispatch(&controller, &line).await;
                    if !output.is_empty() {
                        println!("{output}");
                    }
                }
                Ok(None) => {
                    tracing::info!("stdin closed, shutting down");
                    break;
                }
                Err(e) => {
                    tracing::error!("stdin read failed: {e}");
                    break;
                }
            }
        }
    }

    cancel.cancel();
    refresh.await?;
    Ok(())
}

fn build_controller(config: &BridgeConfig) -> anyhow::Result<HarmonyController> {
    let auth = AuthClient::with_url(&config.auth_url)?;
    let connector = LiveConnector::new(
        auth,
        config.credential(),
        config.hub_addr(),
        &config.client_label,
        config.session_timeouts(),
    );
    Ok(HarmonyController::new(Arc::new(connector)))
}

fn log_event(event: &HarmonyEvent) {
    match event {
        HarmonyEvent::Registered { entity, kind } => {
            tracing::debug!(%entity, ?kind, "entity registered");
        }
        HarmonyEvent::PowerChanged { entity, power } => {
            tracing::info!(%entity, ?power, "power changed");
        }
        HarmonyEvent::SourceChanged { entity, source } => {
            tracing::info!(%entity, %source, "source changed");
        }
        HarmonyEvent::TokenRefreshed => tracing::debug!("token refreshed"),
        HarmonyEvent::TokenRefreshFailed { reason } => {
            tracing::warn!(%reason, "token refresh failed");
        }
    }
}

/// Handles one console line and returns the text to print.
async fn dispatch(controller: &HarmonyController, line: &str) -> String {
    match line.trim() {
        "" => String::new(),
        "help" => HELP.to_string(),
        "status" => status(controller).await,
        "refresh" => match controller.refresh_token().await {
            Ok(()) => "token refreshed".into(),
            Err(e) => format!("error: {e}"),
        },
        command => match command.parse::<IntentCommand>() {
            Ok(cmd) => {
                let results = controller.handle_intent(&cmd.targets, &cmd.intent).await;
                results
                    .into_iter()
                    .map(|(entity, result)| match result {
                        Ok(CommandOutcome::Sent) => format!("{entity}: sent"),
                        Ok(CommandOutcome::Unsupported) => format!("{entity}: unsupported"),
                        Err(e) => format!("{entity}: error: {e}"),
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            Err(e) => format!("error: {e} (try `help`)"),
        },
    }
}

async fn status(controller: &HarmonyController) -> String {
    let status = serde_json::json!({
        "current_activity": controller.current_activity().await,
        "remotes": controller.remotes().await,
        "activities": controller.activities().await,
    });
    serde_json::to_string_pretty(&status).unwrap_or_else(|e| format!("error: {e}"))
}

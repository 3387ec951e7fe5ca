//! `marstek watch` -- continuous polling with live updates.

use owo_colors::OwoColorize;

use marstek_core::{ConnectionStatus, Coordinator, Diagnostics};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: &WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let poller = config::resolve_with_interval(global, args.interval)?;
    let coordinator = Coordinator::new(poller)?;
    let mut updates = coordinator.subscribe_diagnostics();
    let color = output::should_color(&global.color);

    coordinator.start().await;
    if !global.quiet {
        println!("Watching Marstek Cloud (Ctrl-C to stop)...");
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let diagnostics = updates.borrow_and_update().clone();
                print_update(&coordinator, &diagnostics, global, color);
            }
        }
    }

    coordinator.shutdown().await;
    Ok(())
}

fn print_update(
    coordinator: &Coordinator,
    diagnostics: &Diagnostics,
    global: &GlobalOpts,
    color: bool,
) {
    if global.quiet {
        return;
    }

    let status = status_label(diagnostics.connection_status, color);
    let updated = diagnostics
        .last_update
        .map_or_else(|| "never".into(), |t| t.format("%H:%M:%S").to_string());
    let latency = diagnostics
        .api_latency_ms
        .map_or_else(|| "-".into(), |ms| format!("{ms:.0}ms"));

    let devices = coordinator
        .latest()
        .map_or(0, |snapshot| snapshot.len());

    println!("[{updated}] {status}  devices={devices}  latency={latency}");
}

fn status_label(status: ConnectionStatus, color: bool) -> String {
    let label = match status {
        ConnectionStatus::Idle => "idle",
        ConnectionStatus::Connected => "connected",
        ConnectionStatus::Degraded => "degraded",
        ConnectionStatus::BreakerOpen => "breaker-open",
        ConnectionStatus::AuthFailed => "auth-failed",
    };
    if !color {
        return label.into();
    }
    match status {
        ConnectionStatus::Connected => label.green().to_string(),
        ConnectionStatus::Idle => label.dimmed().to_string(),
        ConnectionStatus::Degraded | ConnectionStatus::BreakerOpen => label.yellow().to_string(),
        ConnectionStatus::AuthFailed => label.red().to_string(),
    }
}

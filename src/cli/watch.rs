//! The `watch` command: refresh continuously at a fixed interval.
//!
//! Each tick runs a full refresh cycle and redraws the dashboard; a failed
//! cycle prints the error and keeps the loop alive for the next tick.
//! Ctrl+C exits cleanly.

use tokio::time::{Duration, interval};

use crate::cli::args::{OutputFormat, WatchArgs};
use crate::error::Result;
use crate::render;

/// Execute the watch command.
pub async fn execute(
    args: &WatchArgs,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<()> {
    args.validate()?;

    let store = crate::cli::open_store();
    let engine = crate::cli::build_engine(store)?;
    let mut ticker = interval(Duration::from_secs(args.interval));

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        let _ = shutdown_tx.send(());
    });

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match engine.refresh().await {
                    Ok(snapshot) => {
                        if format == OutputFormat::Human {
                            clear_screen();
                        }
                        println!("{}", render::render_snapshot(&snapshot, format, pretty, no_color)?);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "refresh cycle failed");
                        eprintln!("refresh failed: {e}");
                    }
                }
            }
            _ = &mut shutdown_rx => {
                tracing::info!("watch interrupted, exiting");
                break;
            }
        }
    }
    Ok(())
}

fn clear_screen() {
    print!("\x1b[2J\x1b[H");
}

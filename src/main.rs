//! Staged Transfer demo
//!
//! Runs one savings → checking transfer against simulated stages and prints
//! every published snapshot as a JSON line.
//!
//! ```text
//! staged_transfer [--env dev] [--amount 200] [--cancel-after-ms 2500]
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::{info, warn};

use staged_transfer::config::AppConfig;
use staged_transfer::logging::init_logging;
use staged_transfer::money::format_amount;
use staged_transfer::transfer::{
    SimulatedFinalizer, SimulatedStages, StageLatency, TransferCoordinator, TransferError,
};

// ============================================================
// ARGUMENTS
// ============================================================

fn get_arg(names: &[&str]) -> Option<String> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if names.contains(&args[i].as_str()) && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }
    None
}

fn get_env() -> String {
    get_arg(&["--env", "-e"]).unwrap_or_else(|| "dev".to_string())
}

fn get_amount() -> String {
    get_arg(&["--amount", "-a"]).unwrap_or_else(|| "200".to_string())
}

fn get_cancel_after() -> anyhow::Result<Option<Duration>> {
    match get_arg(&["--cancel-after-ms"]) {
        Some(ms) => Ok(Some(Duration::from_millis(ms.parse()?))),
        None => Ok(None),
    }
}

// ============================================================
// MAIN
// ============================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env)?;
    let _guard = init_logging(&config);
    let cancel_after = get_cancel_after()?;

    info!(git_hash = env!("GIT_HASH"), env = %env, "staged_transfer starting");

    let latency = StageLatency::from(&config.transfer);
    let coordinator = TransferCoordinator::new(
        config.transfer.initial_balances(),
        Arc::new(SimulatedStages::new(latency)),
        Arc::new(SimulatedFinalizer::new(latency.cleanup)),
        Handle::current(),
    );

    let mut observer = coordinator.subscribe();
    let printer = tokio::spawn(async move {
        while observer.changed().await.is_ok() {
            let snapshot = observer.borrow_and_update().clone();
            match serde_json::to_string(&snapshot) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!(error = %e, "Failed to render snapshot"),
            }
        }
    });

    let handle = coordinator.start(get_amount());

    if let Some(delay) = cancel_after {
        tokio::time::sleep(delay).await;
        info!(delay_ms = delay.as_millis() as u64, "Cancelling transfer");
        coordinator.cancel();
    }

    let result = handle.wait().await;
    let snapshot = coordinator.snapshot();

    // Last sender goes away with the coordinator, which ends the printer.
    drop(coordinator);
    printer.await?;

    println!(
        "savings={} checking={}",
        format_amount(snapshot.balances.source, 2),
        format_amount(snapshot.balances.destination, 2)
    );

    match result {
        Ok(outcome) => println!("{}", outcome.message()),
        Err(TransferError::Cancelled) => println!("Transfer cancelled"),
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

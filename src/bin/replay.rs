//! Replays a recorded sensor stream and prints every finished trip.
//!
//! Input is newline-delimited JSON, one [`Inbound`] record per line. Each
//! finished trip is written to stdout as a JSON line. Log output goes to
//! stderr and is controlled by `RUST_LOG`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::{env, io};

use anyhow::{Context, Result, bail};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt};
use triptrack::{AppContext, Inbound};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    Registry::default().with(filter).with(fmt::layer().with_writer(io::stderr)).init();

    let Some(path) = env::args().nth(1) else {
        bail!("usage: triptrack-replay <samples.ndjson>");
    };
    let file = File::open(&path).with_context(|| format!("opening {path}"))?;

    let ctx = AppContext::from_env()?;
    let mut ended = ctx.events().subscribe_trip_ended();
    let printer = tokio::spawn(async move {
        let mut count = 0_usize;
        loop {
            match ended.recv().await {
                Ok(event) => {
                    match serde_json::to_string(&event.trip) {
                        Ok(line) => println!("{line}"),
                        Err(err) => warn!(error = %err, "serializing trip"),
                    }
                    count += 1;
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "trip output lagged"),
                Err(RecvError::Closed) => break,
            }
        }
        count
    });

    let monitor = ctx.start();
    drop(ctx);

    let mut records = 0_usize;
    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("reading {path}"))?;
        if line.trim().is_empty() {
            continue;
        }
        let inbound: Inbound = serde_json::from_str(&line)
            .with_context(|| format!("parsing {path} line {}", number + 1))?;
        monitor.send(inbound).await?;
        records += 1;
    }

    monitor.stop().await?;
    let trips = printer.await.context("joining output task")?;
    info!(records, trips, "replay complete");

    Ok(())
}

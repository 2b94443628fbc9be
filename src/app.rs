//! Event loop wiring the gazetteer loader, the fix reader and the processor.
//!
//! ```text
//! gazetteer file ──load task──▶ oneshot ─┐
//!                                        ├─▶ drive() ─▶ LocationProcessor ─▶ readout sink
//! fix file/stdin ──reader task─▶ mpsc ───┘
//! ```
//!
//! [`drive`] is the only caller of the processor, so events are applied one
//! at a time in arrival order.

use std::future::pending;
use std::io::Write;
use std::path::Path;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::{Config, OutputFormat};
use crate::gazetteer::{
    beyond_radius_label, load_gazetteer, spawn_gazetteer_loader, Gazetteer, Nearest,
};
use crate::geo::Coordinate;
use crate::processor::LocationProcessor;
use crate::readout::Readout;
use crate::source::{spawn_fix_reader, SourceEvent};

/// Capacity of the fix channel between reader and event loop.
const EVENT_CHANNEL_CAPACITY: usize = 64;

type GazetteerRx = oneshot::Receiver<Result<Gazetteer, String>>;
type GazetteerDelivery = Result<Result<Gazetteer, String>, oneshot::error::RecvError>;

/// Resolve once the gazetteer arrives; never resolves if there is none.
async fn recv_gazetteer(rx: &mut Option<GazetteerRx>) -> GazetteerDelivery {
    match rx {
        Some(rx) => rx.await,
        None => pending().await,
    }
}

fn deliver_gazetteer(
    processor: &mut LocationProcessor,
    result: GazetteerDelivery,
) -> Result<(), String> {
    match result {
        Ok(Ok(gazetteer)) => {
            processor.set_gazetteer(gazetteer);
            Ok(())
        }
        Ok(Err(e)) => Err(e),
        Err(_) => Err("gazetteer loader exited without a result".into()),
    }
}

fn apply_event(processor: &mut LocationProcessor, event: &SourceEvent) {
    match event {
        SourceEvent::Fix(fix) => processor.ingest_fix(fix),
        SourceEvent::SetMarker => {
            if processor.set_marker() {
                info!("Marker set");
            } else {
                info!("Marker not set: no position and altitude available");
            }
        }
    }
}

/// Feed every event into `processor` and hand the readout to `on_readout`
/// after each one.
///
/// With `wait_for_gazetteer`, fixes are held until the gazetteer has been
/// delivered. Otherwise it is installed whenever it arrives. A failed load
/// ends the loop with that error. Returns the number of events applied.
pub async fn drive<F>(
    processor: &mut LocationProcessor,
    mut gazetteer_rx: Option<GazetteerRx>,
    wait_for_gazetteer: bool,
    mut events: mpsc::Receiver<SourceEvent>,
    mut on_readout: F,
) -> Result<u64, String>
where
    F: FnMut(&Readout),
{
    if wait_for_gazetteer {
        if let Some(rx) = gazetteer_rx.take() {
            debug!("Waiting for gazetteer before processing fixes");
            deliver_gazetteer(processor, rx.await)?;
        }
    }

    let mut applied: u64 = 0;
    loop {
        tokio::select! {
            biased;
            result = recv_gazetteer(&mut gazetteer_rx) => {
                gazetteer_rx = None;
                deliver_gazetteer(processor, result)?;
            }
            event = events.recv() => {
                let Some(event) = event else { break };
                apply_event(processor, &event);
                applied += 1;
                on_readout(&processor.readout());
            }
        }
    }

    Ok(applied)
}

fn print_readout(format: OutputFormat, readout: &Readout) {
    let mut out = std::io::stdout().lock();
    let written = match format {
        OutputFormat::Text => writeln!(out, "{readout}"),
        OutputFormat::Json => match serde_json::to_string(readout) {
            Ok(line) => writeln!(out, "{line}"),
            Err(e) => {
                warn!("Failed to encode readout: {e}");
                return;
            }
        },
    };
    if let Err(e) = written.and_then(|()| out.flush()) {
        warn!("Failed to write readout: {e}");
    }
}

/// Resolves on SIGINT, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received SIGINT"),
                    _ = sigterm.recv() => info!("Received SIGTERM"),
                }
            }
            Err(e) => {
                warn!("Failed to register SIGTERM: {e}");
                ctrl_c.await.ok();
                info!("Received SIGINT");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received SIGINT");
    }
}

/// Run the full pipeline until the fix source ends or a signal arrives.
pub async fn run(config: &Config) -> Result<(), String> {
    let mut processor = LocationProcessor::new(config.processor.settings());

    if config.gazetteer.path.is_none() {
        warn!("No gazetteer configured, closest city will stay empty");
    }
    let gazetteer_rx = config.gazetteer.path.clone().map(spawn_gazetteer_loader);

    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let reader = spawn_fix_reader(
        config.source.path.clone(),
        config.source.replay_interval(),
        tx,
    );

    let format = config.output.format;
    let outcome = tokio::select! {
        r = drive(&mut processor, gazetteer_rx, config.gazetteer.wait, rx, |readout| {
            print_readout(format, readout);
        }) => Some(r),
        () = shutdown_signal() => None,
    };

    if let Some(result) = outcome {
        let applied = result?;
        info!("Processed {applied} events");
        match reader.await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(e),
            Err(e) => return Err(format!("fix reader task failed: {e}")),
        }
    } else {
        info!("Shutting down...");
        reader.abort();
    }

    debug!("Closest-city searches: {}", processor.search_count());
    Ok(())
}

/// One-off closest-city lookup against the gazetteer at `path`.
///
/// Returns a single display line such as `Montreal (1.24 km)`.
pub async fn nearest(path: &Path, at: Coordinate, radius_m: f64) -> Result<String, String> {
    let gazetteer = load_gazetteer(path).await?;
    let line = match gazetteer.closest(&at, radius_m) {
        Some(Nearest::City { entry, distance_m }) => {
            format!("{} ({:.2} km)", entry.name, distance_m / 1000.0)
        }
        Some(Nearest::BeyondRadius) => beyond_radius_label(radius_m),
        None => return Err(format!("gazetteer {} is empty", path.display())),
    };
    Ok(line)
}

//! Line-oriented fix source.
//!
//! A background task reads newline-delimited JSON events from a file or
//! stdin and forwards them, in order, on an `mpsc` channel:
//!
//! ```text
//! {"type":"fix","horizontal_accuracy":5,"latitude":45.5,"longitude":-73.6,
//!  "vertical_accuracy":3,"altitude":40,"speed":1.2}
//! {"type":"set_marker"}
//! ```
//!
//! Blank lines and `#` comments are skipped. Malformed lines are logged and
//! counted but never stop the stream. End of input drops the sender, which
//! is how the consumer learns the track is over.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::fix::Fix;

/// One event from the fix source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceEvent {
    /// A new raw fix.
    Fix(Fix),
    /// Capture the current position as the reference marker.
    SetMarker,
}

/// Totals reported when the reader finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub events: u64,
    pub malformed: u64,
}

/// Parse one input line. `Ok(None)` for blank lines and comments.
pub fn parse_line(line: &str) -> Result<Option<SourceEvent>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(line)
        .map(Some)
        .map_err(|e| format!("bad event: {e}"))
}

/// Forward every event in `reader` to `tx`, optionally pacing delivery.
///
/// Stops at end of input or when the receiving side goes away.
pub async fn pump<R>(
    reader: R,
    replay_interval: Duration,
    tx: mpsc::Sender<SourceEvent>,
) -> Result<SourceStats, String>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut ticker = (!replay_interval.is_zero()).then(|| tokio::time::interval(replay_interval));
    let mut stats = SourceStats::default();
    let mut line_no: u64 = 0;

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| format!("read fixes: {e}"))?
    {
        line_no += 1;
        let event = match parse_line(&line) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) => {
                stats.malformed += 1;
                warn!("Source: line {line_no}: {e}");
                continue;
            }
        };

        if let Some(ticker) = ticker.as_mut() {
            ticker.tick().await;
        }
        if tx.send(event).await.is_err() {
            debug!("Source: receiver closed, stopping at line {line_no}");
            break;
        }
        stats.events += 1;
    }

    Ok(stats)
}

/// Spawn the reader task over `path`, or stdin when `path` is `None`.
pub fn spawn_fix_reader(
    path: Option<PathBuf>,
    replay_interval: Duration,
    tx: mpsc::Sender<SourceEvent>,
) -> tokio::task::JoinHandle<Result<SourceStats, String>> {
    tokio::spawn(async move {
        let input: Box<dyn AsyncRead + Unpin + Send> = if let Some(p) = &path {
            info!("Source: reading fixes from {}", p.display());
            Box::new(
                tokio::fs::File::open(p)
                    .await
                    .map_err(|e| format!("open {}: {e}", p.display()))?,
            )
        } else {
            info!("Source: reading fixes from stdin");
            Box::new(tokio::io::stdin())
        };

        let stats = pump(BufReader::new(input), replay_interval, tx).await?;
        info!(
            "Source: done, {} events, {} malformed lines",
            stats.events, stats.malformed
        );
        Ok::<_, String>(stats)
    })
}

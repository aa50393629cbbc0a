//! `pacer decode` – decode job output offline, optionally replaying it into a tracker.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use anyhow::{Context, Result};
use pacer_core::config::PacerConfig;
use pacer_core::event::{decode, CategoryHints};
use pacer_core::tracker::InflightTracker;

pub fn run_decode(cfg: &PacerConfig, path: Option<&Path>, track: bool) -> Result<()> {
    let tracker = track.then(InflightTracker::default);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let count = match path {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            decode_lines(BufReader::new(file), &cfg.hints, tracker.as_ref(), &mut out)?
        }
        None => decode_lines(io::stdin().lock(), &cfg.hints, tracker.as_ref(), &mut out)?,
    };
    tracing::debug!(events = count, "decode finished");
    if let Some(tracker) = tracker {
        writeln!(out, "{}", serde_json::to_string_pretty(&tracker.snapshot())?)?;
    }
    Ok(())
}

/// Write one JSON object per decoded event. Returns the number of events.
pub fn decode_lines<R: BufRead, W: Write>(
    reader: R,
    hints: &CategoryHints,
    tracker: Option<&InflightTracker>,
    out: &mut W,
) -> Result<usize> {
    let mut count = 0;
    for line in reader.lines() {
        let line = line.context("reading input")?;
        for event in decode(&line, hints) {
            if let Some(tracker) = tracker {
                tracker.update(&event);
            }
            writeln!(out, "{}", serde_json::to_string(&event)?)?;
            count += 1;
        }
    }
    Ok(count)
}

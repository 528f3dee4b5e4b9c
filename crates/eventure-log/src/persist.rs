//! Newline-delimited JSON persistence.
//!
//! One event object per line, in log order, no header or footer. Blank lines
//! are skipped on load.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use eventure_core::{Event, EventError, IdGenerator, Result};
use tracing::{debug, info, instrument};

use crate::log::EventLog;

impl EventLog {
    /// Write every event to `path`, replacing any existing file.
    ///
    /// Every event is encoded before the file is touched, so an event that
    /// cannot be encoded (a non-finite timestamp) fails with
    /// [`EventError::Encode`] and leaves `path` as it was. A failed write may
    /// leave a partial file behind.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let lines = self.with_events(|events| {
            events.iter().map(Event::to_json).collect::<std::result::Result<Vec<_>, _>>()
        })?;

        let file = File::create(path).map_err(|e| EventError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        for line in &lines {
            writeln!(writer, "{line}").map_err(|e| EventError::io(path, e))?;
        }
        let count = lines.len();

        writer.flush().map_err(|e| EventError::io(path, e))?;
        info!(count, "event log saved");
        Ok(())
    }

    /// Read a log written by [`save`](Self::save) into a fresh log with its
    /// own ID generator.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_generator(path, Arc::new(IdGenerator::new()))
    }

    /// Read a log, drawing future IDs from `ids`.
    ///
    /// The tick is set to the highest tick in the file, 0 when the file holds
    /// no events. Every loaded ID is recorded in `ids`, so events added
    /// afterwards never reuse one. The first malformed line aborts the load
    /// with [`EventError::Decode`]; that includes a record without an
    /// `event_id`, which is rejected rather than given a fresh ID.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load_with_generator(path: impl AsRef<Path>, ids: Arc<IdGenerator>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| EventError::io(path, e))?;
        let log = Self::with_generator(ids);

        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| EventError::io(path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let event = Event::from_json(&line).map_err(|source| EventError::Decode {
                line: idx + 1,
                source,
            })?;
            if !log.id_generator().observe(event.id()) {
                debug!(event_id = event.id(), "unstructured id, not seeding generator");
            }
            log.raise_tick_to(event.tick());
            log.append(event);
        }

        info!(count = log.len(), tick = log.current_tick(), "event log loaded");
        Ok(log)
    }
}

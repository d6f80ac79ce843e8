use driftwatch_core::{DriftEvent, Error, Result};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Append-only JSON-lines event log, one `DriftEvent` per line
pub struct EventFile {
    file: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl EventFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            file: Mutex::new(BufWriter::new(file)),
            path,
        })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every event back, oldest first
    pub fn read_all(&self) -> Result<Vec<DriftEvent>> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut events = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let event = serde_json::from_str(&line).map_err(|e| {
                Error::Serialization(format!("{}:{}: {}", self.path.display(), idx + 1, e))
            })?;
            events.push(event);
        }
        Ok(events)
    }
}

impl crate::store::EventLog for EventFile {
    fn append(&self, event: &DriftEvent) -> Result<()> {
        let line = serde_json::to_vec(event)?;
        let mut writer = self.file.lock();
        writer.write_all(&line)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        // audit rows must survive a crash right after the cycle
        writer.get_ref().sync_data()?;
        Ok(())
    }
}

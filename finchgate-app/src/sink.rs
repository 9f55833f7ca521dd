use chrono::{Local, NaiveDate};
use finchgate_core::CrossingEvent;
use finchgate_experiment::{DataSink, SinkError};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

/// Appends crossing events as JSON lines to `<dir>/<YYYYMMDD>.jsonl`, named
/// after the day the session started. Writes happen on a dedicated thread
/// and every line is flushed as soon as it is written.
pub struct DailyFileSink {
    path: PathBuf,
    tx: Option<Sender<CrossingEvent>>,
    writer: Option<JoinHandle<()>>,
}

impl DailyFileSink {
    pub fn open(dir: &Path) -> io::Result<Self> {
        Self::open_for(dir, Local::now().date_naive())
    }

    pub fn open_for(dir: &Path, date: NaiveDate) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.jsonl", date.format("%Y%m%d")));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let (tx, rx) = mpsc::channel();
        let writer = thread::Builder::new()
            .name("finchgate-sink".into())
            .spawn(move || write_lines(rx, file))?;

        info!("Recording crossings to {}", path.display());
        Ok(Self {
            path,
            tx: Some(tx),
            writer: Some(writer),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn write_lines(rx: Receiver<CrossingEvent>, file: File) {
    let mut out = BufWriter::new(file);
    for event in rx {
        let written = serde_json::to_writer(&mut out, &event)
            .map_err(io::Error::from)
            .and_then(|()| out.write_all(b"\n"))
            .and_then(|()| out.flush());
        if let Err(e) = written {
            error!("Failed to write crossing {event:?}: {e}");
        }
    }
    debug!("Data writer drained");
}

impl DataSink for DailyFileSink {
    fn append(&mut self, event: CrossingEvent) -> Result<(), SinkError> {
        let tx = self.tx.as_ref().ok_or(SinkError::Closed)?;
        tx.send(event).map_err(|_| SinkError::Closed)
    }

    fn close(&mut self) {
        // Dropping the sender ends the writer loop once the backlog is written.
        self.tx.take();
        if let Some(writer) = self.writer.take() {
            if writer.join().is_err() {
                error!("Data writer thread panicked");
            }
        }
    }
}

impl Drop for DailyFileSink {
    fn drop(&mut self) {
        self.close();
    }
}

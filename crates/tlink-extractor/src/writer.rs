//! JSON-lines instance writer
//!
//! Training instances are written one JSON object per line for an external
//! training script to pick up:
//!
//! ```text
//! {"outcome":"before-1","features":["<t>","<timex_12>","</t>","<e>","biopsy","</e>"]}
//! ```

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tlink_core::{DataWriter, Instance, Result};

/// File name used inside a training output directory
pub const TRAINING_DATA_FILE: &str = "training-data.jsonl";

pub struct JsonlDataWriter<W: Write> {
    inner: W,
    written: usize,
}

impl<W: Write> JsonlDataWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Instances written so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and hand back the underlying writer
    pub fn finish(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl JsonlDataWriter<BufWriter<File>> {
    /// Create `training-data.jsonl` in `dir`, creating the directory if needed
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path: PathBuf = dir.join(TRAINING_DATA_FILE);

        tracing::info!("Writing training instances to {}", path.display());
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> DataWriter for JsonlDataWriter<W> {
    fn write(&mut self, instance: Instance) -> Result<()> {
        serde_json::to_writer(&mut self.inner, &instance)?;
        self.inner.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }
}

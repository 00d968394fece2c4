use std::collections::HashMap;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::container::header::CarHeader;
use crate::enumerate::lookup::NamedLookup;
use crate::enumerate::walk::EnumerationSummary;
use crate::foundation::error::CarResult;

/// Receiver of `(output hint, lookup)` pairs produced by a walk.
pub trait LookupSink {
    /// Called once before any lookup is pushed.
    fn begin(&mut self, header: &CarHeader) -> CarResult<()>;
    /// Push one lookup. Returning `Err` stops the walk.
    fn push(&mut self, output_hint: Option<&Path>, lookup: &NamedLookup) -> CarResult<()>;
    /// Called once after the last lookup.
    fn end(&mut self, summary: &EnumerationSummary) -> CarResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    header: Option<CarHeader>,
    summary: Option<EnumerationSummary>,
    /// Lookups in push order.
    pub(crate) lookups: Vec<NamedLookup>,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Header captured in `begin`, if any.
    pub fn header(&self) -> Option<&CarHeader> {
        self.header.as_ref()
    }

    /// Summary captured in `end`, if any.
    pub fn summary(&self) -> Option<EnumerationSummary> {
        self.summary
    }

    /// Borrow the captured lookups.
    pub fn lookups(&self) -> &[NamedLookup] {
        &self.lookups
    }
}

impl LookupSink for InMemorySink {
    fn begin(&mut self, header: &CarHeader) -> CarResult<()> {
        self.header = Some(header.clone());
        self.summary = None;
        self.lookups.clear();
        Ok(())
    }

    fn push(&mut self, _output_hint: Option<&Path>, lookup: &NamedLookup) -> CarResult<()> {
        self.lookups.push(lookup.clone());
        Ok(())
    }

    fn end(&mut self, summary: &EnumerationSummary) -> CarResult<()> {
        self.summary = Some(*summary);
        Ok(())
    }
}

/// Writes each lookup under a directory: raw `data` when present, otherwise `image` as PNG.
///
/// The per-visit output hint, when set, replaces the sink's own directory. A filename already
/// written by this sink gets a numeric suffix.
#[derive(Debug)]
pub struct DirectorySink {
    root: PathBuf,
    seen: HashMap<PathBuf, usize>,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    /// Sink writing under `root`, created on `begin` if missing.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            seen: HashMap::new(),
            written: Vec::new(),
        }
    }

    /// Files written so far, in push order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn unique_path(&mut self, dir: &Path, filename: &str) -> PathBuf {
        let path = dir.join(filename);
        let n = self.seen.entry(path.clone()).or_insert(0);
        *n += 1;
        if *n == 1 {
            return path;
        }
        let suffixed = match filename.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{n}.{ext}"),
            _ => format!("{filename}-{n}"),
        };
        dir.join(suffixed)
    }
}

impl LookupSink for DirectorySink {
    fn begin(&mut self, _header: &CarHeader) -> CarResult<()> {
        std::fs::create_dir_all(&self.root)?;
        self.seen.clear();
        self.written.clear();
        Ok(())
    }

    fn push(&mut self, output_hint: Option<&Path>, lookup: &NamedLookup) -> CarResult<()> {
        let dir = output_hint.map_or_else(|| self.root.clone(), Path::to_path_buf);
        if lookup.data.is_none() && lookup.image.is_none() {
            tracing::debug!(filename = %lookup.filename, "nothing to write");
            return Ok(());
        }
        std::fs::create_dir_all(&dir)?;
        let path = self.unique_path(&dir, &lookup.filename);

        if let Some(data) = &lookup.data {
            std::fs::write(&path, data)?;
        } else if let Some(image) = &lookup.image {
            let file = std::fs::File::create(&path)?;
            let mut out = BufWriter::new(file);
            image
                .to_rgba_image()
                .write_to(&mut out, image::ImageFormat::Png)
                .with_context(|| format!("encode png {}", path.display()))?;
            out.flush()?;
        }
        tracing::debug!(path = %path.display(), "wrote lookup");
        self.written.push(path);
        Ok(())
    }

    fn end(&mut self, summary: &EnumerationSummary) -> CarResult<()> {
        tracing::info!(files = self.written.len(), %summary, "export finished");
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/sink.rs"]
mod tests;

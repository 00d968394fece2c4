use std::path::PathBuf;

use rayon::prelude::*;

use crate::container::catalog::{Container, IndexEntry};
use crate::enumerate::lookup::{NamedLookup, build_lookup};
use crate::export::sink::LookupSink;
use crate::foundation::error::{CarError, CarResult};
use crate::key::rendition_key::RenditionKey;
use crate::render::preview::PreviewOpts;
use crate::rendition::decode::decode;
use crate::rendition::model::Rendition;

/// Walk options.
#[derive(Clone, Debug)]
pub struct EnumerateOpts {
    /// Output location handed to every visit unchanged.
    pub output_hint: Option<PathBuf>,
    /// Decode entries on a rayon pool.
    pub parallel: bool,
    /// Entries decoded per parallel batch.
    pub chunk_size: usize,
    /// Pool size; `None` lets rayon decide.
    pub threads: Option<usize>,
    /// Bound lookup images to a preview size.
    pub preview: Option<PreviewOpts>,
}

impl Default for EnumerateOpts {
    fn default() -> Self {
        Self {
            output_hint: None,
            parallel: false,
            chunk_size: 64,
            threads: None,
            preview: None,
        }
    }
}

/// One visited rendition.
#[derive(Debug)]
pub struct Visit {
    /// Position in tree storage order.
    pub position: usize,
    /// [`EnumerateOpts::output_hint`].
    pub output_hint: Option<PathBuf>,
    /// Classification key, read before decoding.
    pub key: RenditionKey,
    /// Decode outcome; an error here is local to this entry.
    pub rendition: CarResult<Rendition>,
    /// Consumer view of the outcome.
    pub lookup: NamedLookup,
}

/// Counts reported at the end of a walk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct EnumerationSummary {
    /// Entries visited.
    pub found: u64,
    /// Entries that decoded.
    pub decoded: u64,
    /// Entries with an unsupported kind or codec.
    pub skipped: u64,
    /// Entries that failed for any other reason.
    pub failed: u64,
}

impl EnumerationSummary {
    fn record(&mut self, outcome: &CarResult<Rendition>) {
        self.found += 1;
        match outcome {
            Ok(_) => self.decoded += 1,
            Err(e) if e.is_unsupported() => self.skipped += 1,
            Err(_) => self.failed += 1,
        }
    }
}

impl std::fmt::Display for EnumerationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} renditions found, {} decoded, {} skipped (unsupported)",
            self.found, self.decoded, self.skipped
        )?;
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        Ok(())
    }
}

/// Visit every rendition once, in tree storage order, decoding each payload.
///
/// Per-entry decode errors travel inside the [`Visit`]; the walk goes on. A damaged index ends
/// the walk with [`CarError::Enumeration`] carrying the number of entries already visited. An
/// `Err` from `visitor` stops the walk and is returned as-is.
///
/// With [`EnumerateOpts::parallel`] entries are decoded in chunks on a dedicated pool and
/// handed to `visitor` on the calling thread.
#[tracing::instrument(skip_all, fields(parallel = opts.parallel))]
pub fn enumerate<F>(
    container: &Container,
    opts: &EnumerateOpts,
    mut visitor: F,
) -> CarResult<EnumerationSummary>
where
    F: FnMut(Visit) -> CarResult<()>,
{
    let entries = container
        .entries()
        .map_err(|e| CarError::enumeration(0, e.to_string()))?;
    let mut summary = EnumerationSummary::default();
    let mut visited = 0usize;

    if !opts.parallel {
        for entry in entries {
            let entry = entry.map_err(|e| CarError::enumeration(visited, e.to_string()))?;
            let visit = visit_entry(container, &entry, opts);
            summary.record(&visit.rendition);
            visitor(visit)?;
            visited += 1;
        }
        tracing::info!(%summary, "enumeration finished");
        return Ok(summary);
    }

    let pool = build_thread_pool(opts.threads)?;
    let chunk_size = opts.chunk_size.max(1);
    let mut entries = entries;
    loop {
        let mut chunk: Vec<IndexEntry<'_>> = Vec::with_capacity(chunk_size);
        let mut fault = None;
        for entry in entries.by_ref() {
            match entry {
                Ok(entry) => {
                    chunk.push(entry);
                    if chunk.len() == chunk_size {
                        break;
                    }
                }
                Err(e) => {
                    fault = Some(e);
                    break;
                }
            }
        }
        if chunk.is_empty() && fault.is_none() {
            break;
        }

        let visits: Vec<Visit> = pool.install(|| {
            chunk
                .par_iter()
                .map(|entry| visit_entry(container, entry, opts))
                .collect()
        });
        for visit in visits {
            summary.record(&visit.rendition);
            visitor(visit)?;
            visited += 1;
        }
        if let Some(e) = fault {
            return Err(CarError::enumeration(visited, e.to_string()));
        }
    }
    tracing::info!(%summary, "enumeration finished");
    Ok(summary)
}

/// [`enumerate`] onto a [`LookupSink`]: `begin`, one `push` per rendition, then `end`.
#[tracing::instrument(skip_all)]
pub fn enumerate_to_sink(
    container: &Container,
    opts: &EnumerateOpts,
    sink: &mut dyn LookupSink,
) -> CarResult<EnumerationSummary> {
    sink.begin(container.header())?;
    let summary = enumerate(container, opts, |visit| {
        sink.push(visit.output_hint.as_deref(), &visit.lookup)
    })?;
    sink.end(&summary)?;
    Ok(summary)
}

fn visit_entry(container: &Container, entry: &IndexEntry<'_>, opts: &EnumerateOpts) -> Visit {
    let rendition = decode(container, entry);
    match &rendition {
        Ok(r) => tracing::debug!(
            position = entry.position,
            name = %entry.key.rendition_name,
            kind = r.kind.label(),
            "decoded"
        ),
        Err(e) if e.is_unsupported() => tracing::warn!(
            position = entry.position,
            name = %entry.key.rendition_name,
            error = %e,
            "skipping rendition"
        ),
        Err(e) => tracing::warn!(
            position = entry.position,
            name = %entry.key.rendition_name,
            error = %e,
            "rendition failed to decode"
        ),
    }
    let lookup = build_lookup(&entry.key, rendition.as_ref(), opts.preview.as_ref());
    Visit {
        position: entry.position,
        output_hint: opts.output_hint.clone(),
        key: entry.key.clone(),
        rendition,
        lookup,
    }
}

fn build_thread_pool(threads: Option<usize>) -> CarResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(anyhow::anyhow!("enumeration 'threads' must be >= 1 when set").into());
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build rayon thread pool: {e}").into())
}

#[cfg(test)]
#[path = "../../tests/unit/enumerate/walk.rs"]
mod tests;

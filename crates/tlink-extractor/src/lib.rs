//! TLink Extractor - Temporal relation feature extraction
//!
//! Implements the windowed-context labeling engine shared by the temporal
//! annotators: context windows with typed anchor markers, time-expression
//! normalization, BIO chunking and event-time candidate generation. Three
//! annotators are built on top of it:
//! - `DocTimeRelAnnotator`: event relation to document creation time
//! - `EventTimeAnnotator`: event-time relations within a sentence
//! - `TimexAnnotator`: time-expression spans via sequence labeling

use tlink_core::{AnnotationUpdate, Document, ProcessingMode, Result, SpanIndex};

/// A document-level annotator.
///
/// In training mode instances go to the mode's data writer and no updates are
/// returned. In prediction mode the classifier's labels come back as updates
/// for the host store to apply.
pub trait Annotator: Send + Sync {
    /// Short name used in logs and on the command line
    fn name(&self) -> &str;

    fn process(
        &self,
        index: &dyn SpanIndex,
        mode: &mut ProcessingMode<'_>,
    ) -> Result<Vec<AnnotationUpdate>>;
}

/// Run an annotator over an in-memory document and apply its updates
pub fn annotate_document(
    annotator: &dyn Annotator,
    document: &mut Document,
    mode: &mut ProcessingMode<'_>,
) -> Result<usize> {
    let updates = annotator.process(&*document, mode)?;
    let count = updates.len();
    document.apply_all(updates)?;

    tracing::debug!(
        "{} applied {} updates to {}",
        annotator.name(),
        count,
        document.id()
    );
    Ok(count)
}

pub mod bio;
pub mod candidates;
pub mod direction;
pub mod doc_time;
pub mod event_time;
pub mod metrics;
pub mod timex;
pub mod timex_tagger;
pub mod window;
pub mod writer;

pub use bio::{BioChunking, BioTag, Chunk};
pub use candidates::{CandidateGenerator, CandidatePair};
pub use direction::{resolve_direction, Direction, RelationLookup, ResolvedRelation};
pub use doc_time::DocTimeRelAnnotator;
pub use event_time::EventTimeAnnotator;
pub use metrics::{AggregateMetrics, Evaluator, SpanMetrics};
pub use timex::{TableLoad, TimexNormalizer, TimexTable};
pub use timex_tagger::TimexAnnotator;
pub use window::{Anchor, ContextWindowExtractor};
pub use writer::JsonlDataWriter;

//! Event-time candidate pairs within a sentence

use tlink_core::{Annotation, AnnotationType, Span, SpanIndex};

/// A candidate relation: event first, time second
#[derive(Debug, Clone, Copy)]
pub struct CandidatePair<'a> {
    pub event: &'a Annotation,
    pub time: &'a Annotation,
}

/// Enumerates event-time pairs under configurable validity filters
#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    /// Skip event subclasses (system-inferred typed mentions)
    base_events_only: bool,
}

impl CandidateGenerator {
    pub fn new() -> Self {
        Self {
            base_events_only: true,
        }
    }

    /// Also pair event subclasses such as disease/disorder mentions
    pub fn including_subclasses(mut self) -> Self {
        self.base_events_only = false;
        self
    }

    /// Pairs of events and times contained in `sentence`, in document order.
    /// Overlapping event/time spans are never paired.
    pub fn candidates<'a>(&self, index: &'a dyn SpanIndex, sentence: Span) -> Vec<CandidatePair<'a>> {
        let times = index.select_covered(AnnotationType::Time, sentence);
        let mut pairs = Vec::new();

        for event in index.select_covered(AnnotationType::Event, sentence) {
            if self.base_events_only && !event.kind.is_base_event() {
                continue;
            }

            for &time in &times {
                if event.span.overlaps(&time.span) {
                    tracing::debug!(
                        "Skipping overlapping pair {} / {} in {}",
                        event.span,
                        time.span,
                        index.document_id()
                    );
                    continue;
                }
                pairs.push(CandidatePair { event, time });
            }
        }

        pairs
    }
}

impl Default for CandidateGenerator {
    fn default() -> Self {
        Self::new()
    }
}

//! DocTimeRel annotator
//!
//! Classifies how each event relates to the document creation time
//! (BEFORE, OVERLAP, AFTER, BEFORE/OVERLAP) from a wide single-anchor window.

use tlink_core::{
    AnnotationType, AnnotationUpdate, ExtractorConfig, Instance, ProcessingMode, Result,
    SpanIndex,
};

use crate::window::{Anchor, ContextWindowExtractor, EVENT_ROLE};
use crate::Annotator;

/// Tokens of context taken on each side of the event
pub const DEFAULT_DOC_TIME_WINDOW: usize = 40;

pub struct DocTimeRelAnnotator {
    extractor: ContextWindowExtractor,
    window: usize,
}

impl DocTimeRelAnnotator {
    pub fn new(extractor: ContextWindowExtractor) -> Self {
        Self {
            extractor,
            window: DEFAULT_DOC_TIME_WINDOW,
        }
    }

    pub fn from_config(extractor: ContextWindowExtractor, config: &ExtractorConfig) -> Self {
        Self::new(extractor).with_window(config.doc_time_window)
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl Annotator for DocTimeRelAnnotator {
    fn name(&self) -> &str {
        "doc-time"
    }

    fn process(
        &self,
        index: &dyn SpanIndex,
        mode: &mut ProcessingMode<'_>,
    ) -> Result<Vec<AnnotationUpdate>> {
        let mut updates = Vec::new();
        let mut skipped = 0usize;

        // The window is not bounded by the sentence
        for event in index.select(AnnotationType::Event) {
            let features =
                self.extractor
                    .single_features(index, None, Anchor::new(event, EVENT_ROLE), self.window);

            match mode {
                ProcessingMode::Training(writer) => match &event.doc_time_rel {
                    Some(category) => writer.write(Instance::new(category.clone(), features))?,
                    None => skipped += 1,
                },
                ProcessingMode::Prediction(classifier) => {
                    let value = classifier.classify(&features)?;
                    updates.push(AnnotationUpdate::SetDocTimeRel {
                        event: event.id,
                        value,
                    });
                }
            }
        }

        if skipped > 0 {
            tracing::debug!(
                "Skipped {} events without a gold DocTimeRel in {}",
                skipped,
                index.document_id()
            );
        }

        Ok(updates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tlink_core::{AnnotationKind, Document, EventClass, Feature, Span};

    fn sample() -> Document {
        let text = "Patient denies pain . Biopsy scheduled next week .";
        let mut doc = Document::new("dtr", text);
        doc.add_tokens(
            [
                (0, 7),
                (8, 14),
                (15, 19),
                (20, 21),
                (22, 28),
                (29, 38),
                (39, 43),
                (44, 48),
                (49, 50),
            ]
            .map(|(b, e)| Span::new(b, e)),
        )
        .unwrap();
        let pain = doc
            .add(AnnotationKind::Event(EventClass::Generic), Span::new(15, 19))
            .unwrap();
        doc.add(AnnotationKind::Event(EventClass::Procedure), Span::new(22, 28))
            .unwrap();
        doc.set_doc_time_rel(pain, "OVERLAP").unwrap();
        doc
    }

    #[test]
    fn test_training_skips_events_without_gold() {
        let doc = sample();
        let mut instances = Vec::new();

        let updates = DocTimeRelAnnotator::new(ContextWindowExtractor::default())
            .process(&doc, &mut ProcessingMode::Training(&mut instances))
            .unwrap();

        assert!(updates.is_empty());
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].outcome, "OVERLAP");
        // window crosses the sentence boundary
        assert_eq!(instances[0].features.first(), Some(&Feature::from("patient")));
        assert_eq!(instances[0].features.last(), Some(&Feature::from(".")));
    }

    #[test]
    fn test_prediction_sets_doc_time_rel_on_every_event() {
        let doc = sample();
        let classifier = |features: &[Feature]| -> Result<String> {
            if features.contains(&Feature::from("biopsy")) {
                Ok("AFTER".to_string())
            } else {
                Ok("OVERLAP".to_string())
            }
        };

        let updates = DocTimeRelAnnotator::new(ContextWindowExtractor::default())
            .with_window(1)
            .process(&doc, &mut ProcessingMode::Prediction(&classifier))
            .unwrap();

        let values: Vec<&str> = updates
            .iter()
            .map(|u| match u {
                AnnotationUpdate::SetDocTimeRel { value, .. } => value.as_str(),
                other => panic!("unexpected update {:?}", other),
            })
            .collect();
        assert_eq!(values, vec!["OVERLAP", "AFTER"]);
    }

    #[test]
    fn test_window_size() {
        let doc = sample();
        let mut instances = Vec::new();

        DocTimeRelAnnotator::new(ContextWindowExtractor::default())
            .with_window(1)
            .process(&doc, &mut ProcessingMode::Training(&mut instances))
            .unwrap();

        let texts: Vec<&str> = instances[0].features.iter().map(|f| f.as_str()).collect();
        assert_eq!(texts, vec!["denies", "<e>", "pain", "</e>", "."]);
    }
}

//! Event-time relation annotator
//!
//! Pairs every base event with every time expression in the same sentence
//! and classifies the pair from a narrow window around both anchors.

use tlink_core::{
    AnnotationType, AnnotationUpdate, ExtractorConfig, Instance, ProcessingMode, Relation,
    Result, SpanIndex,
};

use crate::candidates::{CandidateGenerator, CandidatePair};
use crate::direction::{resolve_direction, RelationLookup};
use crate::window::{Anchor, ContextWindowExtractor, EVENT_ROLE, TIME_ROLE};
use crate::Annotator;

/// Tokens of context taken outside the anchor pair
pub const DEFAULT_EVENT_TIME_WINDOW: usize = 2;

/// Outcome for unrelated pairs
pub const NO_RELATION: &str = "none";

pub struct EventTimeAnnotator {
    extractor: ContextWindowExtractor,
    candidates: CandidateGenerator,
    window: usize,
    no_relation: String,
}

impl EventTimeAnnotator {
    pub fn new(extractor: ContextWindowExtractor) -> Self {
        Self {
            extractor,
            candidates: CandidateGenerator::new(),
            window: DEFAULT_EVENT_TIME_WINDOW,
            no_relation: NO_RELATION.to_string(),
        }
    }

    pub fn from_config(extractor: ContextWindowExtractor, config: &ExtractorConfig) -> Self {
        Self::new(extractor)
            .with_window(config.event_time_window)
            .with_no_relation(config.no_relation_category.clone())
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_no_relation(mut self, category: impl Into<String>) -> Self {
        self.no_relation = category.into();
        self
    }

    pub fn with_candidates(mut self, candidates: CandidateGenerator) -> Self {
        self.candidates = candidates;
        self
    }

    /// Anchors in text order. The earlier one becomes arg1.
    fn ordered_anchors<'a>(pair: &CandidatePair<'a>) -> (Anchor<'a>, Anchor<'a>) {
        let event = Anchor::new(pair.event, EVENT_ROLE);
        let time = Anchor::new(pair.time, TIME_ROLE);

        if pair.time.begin() < pair.event.begin() {
            (time, event)
        } else {
            (event, time)
        }
    }
}

impl Annotator for EventTimeAnnotator {
    fn name(&self) -> &str {
        "event-time"
    }

    fn process(
        &self,
        index: &dyn SpanIndex,
        mode: &mut ProcessingMode<'_>,
    ) -> Result<Vec<AnnotationUpdate>> {
        let lookup = if mode.is_training() {
            RelationLookup::build(index)
        } else {
            RelationLookup::default()
        };
        let mut updates = Vec::new();

        for sentence in index.select(AnnotationType::Sentence) {
            for pair in self.candidates.candidates(index, sentence.span) {
                let (arg1, arg2) = Self::ordered_anchors(&pair);
                let features =
                    self.extractor
                        .pair_features(index, sentence.span, arg1, arg2, self.window);

                match mode {
                    ProcessingMode::Training(writer) => {
                        let category = lookup
                            .training_category(arg1.annotation, arg2.annotation)
                            .map(|c| c.to_lowercase())
                            .unwrap_or_else(|| self.no_relation.clone());
                        writer.write(Instance::new(category, features))?;
                    }
                    ProcessingMode::Prediction(classifier) => {
                        let predicted = classifier.classify(&features)?;
                        if predicted.is_empty() || predicted.eq_ignore_ascii_case(&self.no_relation)
                        {
                            continue;
                        }

                        let resolved =
                            resolve_direction(&predicted, arg1.annotation, arg2.annotation);
                        updates.push(AnnotationUpdate::AddRelation(
                            Relation::new(
                                resolved.arg1.id,
                                resolved.arg2.id,
                                resolved.category.to_uppercase(),
                            )
                            .with_confidence(0.0),
                        ));
                    }
                }
            }
        }

        Ok(updates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tlink_core::{AnnotationId, AnnotationKind, Document, EventClass, Feature, Span};

    // "On 5/12 she had surgery ."
    fn sample() -> (Document, AnnotationId, AnnotationId) {
        let text = "On 5/12 she had surgery .";
        let mut doc = Document::new("event-time", text);
        doc.add(AnnotationKind::Sentence, Span::new(0, 25)).unwrap();
        doc.add_tokens(
            [(0, 2), (3, 7), (8, 11), (12, 15), (16, 23), (24, 25)].map(|(b, e)| Span::new(b, e)),
        )
        .unwrap();
        let time = doc.add(AnnotationKind::Time, Span::new(3, 7)).unwrap();
        let event = doc
            .add(AnnotationKind::Event(EventClass::Generic), Span::new(16, 23))
            .unwrap();
        (doc, time, event)
    }

    #[test]
    fn test_time_first_pair_puts_time_left() {
        let (doc, _, _) = sample();
        let mut instances = Vec::new();

        EventTimeAnnotator::new(ContextWindowExtractor::default())
            .process(&doc, &mut ProcessingMode::Training(&mut instances))
            .unwrap();

        let texts: Vec<&str> = instances[0].features.iter().map(|f| f.as_str()).collect();
        assert_eq!(
            texts,
            vec!["on", "<t>", "<timex_797>", "</t>", "she", "had", "<e>", "surgery", "</e>", "."]
        );
        assert_eq!(instances[0].outcome, "none");
    }

    #[test]
    fn test_training_label_lowercased_with_direction() {
        let (mut doc, time, event) = sample();
        doc.add_relation(Relation::new(event, time, "BEFORE"))
            .unwrap();
        let mut instances = Vec::new();

        EventTimeAnnotator::new(ContextWindowExtractor::default())
            .process(&doc, &mut ProcessingMode::Training(&mut instances))
            .unwrap();

        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].outcome, "before-1");
    }

    #[test]
    fn test_prediction_restores_gold_orientation() {
        let (doc, time, event) = sample();
        let classifier = |_: &[Feature]| -> Result<String> { Ok("before-1".to_string()) };

        let updates = EventTimeAnnotator::new(ContextWindowExtractor::default())
            .process(&doc, &mut ProcessingMode::Prediction(&classifier))
            .unwrap();

        assert_eq!(
            updates,
            vec![AnnotationUpdate::AddRelation(
                Relation::new(event, time, "BEFORE").with_confidence(0.0)
            )]
        );
    }

    #[test]
    fn test_prediction_none_emits_nothing() {
        let (doc, _, _) = sample();
        let classifier = |_: &[Feature]| -> Result<String> { Ok("none".to_string()) };

        let updates = EventTimeAnnotator::new(ContextWindowExtractor::default())
            .process(&doc, &mut ProcessingMode::Prediction(&classifier))
            .unwrap();

        assert!(updates.is_empty());
    }

    #[test]
    fn test_subclass_events_are_not_paired() {
        let (mut doc, _, _) = sample();
        doc.add(AnnotationKind::Event(EventClass::Procedure), Span::new(16, 23))
            .unwrap();
        let mut instances = Vec::new();

        EventTimeAnnotator::new(ContextWindowExtractor::default())
            .process(&doc, &mut ProcessingMode::Training(&mut instances))
            .unwrap();

        assert_eq!(instances.len(), 1);
    }
}

//! Time-expression sequence labeling annotator
//!
//! Each sentence is one instance: the features are the lower-cased token
//! texts framed by `START` and `EOS`, and the outcome is the space-joined BIO
//! label sequence for the same positions.

use tlink_core::{
    AnnotationType, AnnotationUpdate, ExtractorConfig, Feature, Instance, ProcessingMode, Result,
    Span, SpanIndex, TlinkError,
};

use crate::bio::{BioChunking, OUTSIDE};
use crate::Annotator;

/// Feature opening every sentence
pub const START_FEATURE: &str = "START";

/// Feature closing every sentence
pub const END_FEATURE: &str = "EOS";

/// Chunk type of time expressions
pub const TIME_LABEL: &str = "TIME";

pub struct TimexAnnotator {
    codec: BioChunking,
}

impl TimexAnnotator {
    pub fn new() -> Self {
        Self {
            codec: BioChunking::new(TIME_LABEL),
        }
    }

    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self {
            codec: BioChunking::new(config.time_label.clone()),
        }
    }

    /// Segments to walk, or the whole document when none are annotated
    fn segment_spans(index: &dyn SpanIndex) -> Vec<Span> {
        let segments: Vec<Span> = index
            .select(AnnotationType::Segment)
            .into_iter()
            .map(|s| s.span)
            .collect();

        if segments.is_empty() {
            vec![Span::new(0, usize::MAX)]
        } else {
            segments
        }
    }

    fn sentence_features(tokens: &[&str]) -> Vec<Feature> {
        let mut features = Vec::with_capacity(tokens.len() + 2);
        features.push(Feature::new(START_FEATURE));
        features.extend(tokens.iter().map(|t| Feature::new(t.to_lowercase())));
        features.push(Feature::new(END_FEATURE));
        features
    }

    fn training_outcome(&self, tokens: &[Span], times: &[Span]) -> String {
        let mut labels = Vec::with_capacity(tokens.len() + 2);
        labels.push(OUTSIDE.to_string());
        labels.extend(self.codec.encode_labels(tokens, times));
        labels.push(OUTSIDE.to_string());
        labels.join(" ")
    }

    /// Decode a predicted label string, dropping the `START`/`EOS` positions
    fn decode_outcome(&self, tokens: &[Span], outcome: &str) -> Result<Vec<Span>> {
        let labels: Vec<&str> = outcome.split_whitespace().collect();
        let expected = tokens.len() + 2;

        if labels.len() != expected {
            return Err(TlinkError::LabelCountMismatch {
                expected,
                actual: labels.len(),
            });
        }

        self.codec.decode_spans(tokens, &labels[1..labels.len() - 1])
    }
}

impl Default for TimexAnnotator {
    fn default() -> Self {
        Self::new()
    }
}

impl Annotator for TimexAnnotator {
    fn name(&self) -> &str {
        "timex"
    }

    fn process(
        &self,
        index: &dyn SpanIndex,
        mode: &mut ProcessingMode<'_>,
    ) -> Result<Vec<AnnotationUpdate>> {
        tracing::info!("Processing document {}", index.document_id());
        let mut updates = Vec::new();

        for segment in Self::segment_spans(index) {
            for sentence in index.select_covered(AnnotationType::Sentence, segment) {
                let tokens = index.select_covered(AnnotationType::Token, sentence.span);
                let token_spans: Vec<Span> = tokens.iter().map(|t| t.span).collect();
                let token_texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
                let features = Self::sentence_features(&token_texts);

                match mode {
                    ProcessingMode::Training(writer) => {
                        let times: Vec<Span> = index
                            .select_covered(AnnotationType::Time, sentence.span)
                            .into_iter()
                            .map(|t| t.span)
                            .collect();
                        let outcome = self.training_outcome(&token_spans, &times);
                        writer.write(Instance::new(outcome, features))?;
                    }
                    ProcessingMode::Prediction(classifier) => {
                        let outcome = classifier.classify(&features)?;
                        for span in self.decode_outcome(&token_spans, &outcome)? {
                            updates.push(AnnotationUpdate::AddTime { span });
                        }
                    }
                }
            }
        }

        Ok(updates)
    }
}

//! Quality Metrics module
//!
//! Exact-match precision, recall and F1 for predicted time spans and
//! event-time relations against gold annotations.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use tlink_core::{AnnotationType, Relation, Span, SpanIndex};

// ============================================================================
// Span Metrics
// ============================================================================

/// Counts for one evaluation (spans or relations)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanMetrics {
    /// Predictions matching a gold item
    pub true_positives: usize,
    /// Predictions with no gold match
    pub false_positives: usize,
    /// Gold items never predicted
    pub false_negatives: usize,
    pub gold_total: usize,
    pub predicted_total: usize,
}

impl SpanMetrics {
    /// Calculate precision (TP / (TP + FP))
    pub fn precision(&self) -> f32 {
        if self.true_positives + self.false_positives == 0 {
            0.0
        } else {
            self.true_positives as f32 / (self.true_positives + self.false_positives) as f32
        }
    }

    /// Calculate recall (TP / (TP + FN))
    pub fn recall(&self) -> f32 {
        if self.true_positives + self.false_negatives == 0 {
            0.0
        } else {
            self.true_positives as f32 / (self.true_positives + self.false_negatives) as f32
        }
    }

    /// Calculate F1 score (2 * P * R / (P + R))
    pub fn f1_score(&self) -> f32 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    pub fn add(&mut self, other: &SpanMetrics) {
        self.true_positives += other.true_positives;
        self.false_positives += other.false_positives;
        self.false_negatives += other.false_negatives;
        self.gold_total += other.gold_total;
        self.predicted_total += other.predicted_total;
    }

    fn from_sets<T: Eq + std::hash::Hash>(gold: &HashSet<T>, predicted: &HashSet<T>) -> Self {
        let true_positives = predicted.intersection(gold).count();

        Self {
            true_positives,
            false_positives: predicted.len() - true_positives,
            false_negatives: gold.len() - true_positives,
            gold_total: gold.len(),
            predicted_total: predicted.len(),
        }
    }
}

// ============================================================================
// Evaluator
// ============================================================================

/// Relation identity for scoring: argument spans plus category
type RelationKey = (Span, Span, String);

/// Evaluator for extraction quality
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    /// Ignore argument order when matching relations
    ignore_direction: bool,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match relations regardless of argument order
    pub fn ignoring_direction(mut self) -> Self {
        self.ignore_direction = true;
        self
    }

    /// Score exact span matches. Duplicate spans count once.
    pub fn evaluate_spans(&self, gold: &[Span], predicted: &[Span]) -> SpanMetrics {
        let gold: HashSet<Span> = gold.iter().copied().collect();
        let predicted: HashSet<Span> = predicted.iter().copied().collect();
        SpanMetrics::from_sets(&gold, &predicted)
    }

    /// Score annotations of one type in a system document against a gold one
    pub fn evaluate_annotations(
        &self,
        gold: &dyn SpanIndex,
        system: &dyn SpanIndex,
        ty: AnnotationType,
    ) -> SpanMetrics {
        let metrics =
            self.evaluate_spans(&annotation_spans(gold, ty), &annotation_spans(system, ty));

        tracing::debug!(
            "{} {}: P={:.3} R={:.3} F1={:.3}",
            gold.document_id(),
            ty,
            metrics.precision(),
            metrics.recall(),
            metrics.f1_score()
        );
        metrics
    }

    /// Score relations keyed by argument spans and upper-cased category.
    /// Relations whose arguments cannot be resolved are skipped.
    pub fn evaluate_relations(&self, gold: &dyn SpanIndex, system: &dyn SpanIndex) -> SpanMetrics {
        let gold = self.relation_keys(gold);
        let predicted = self.relation_keys(system);
        SpanMetrics::from_sets(&gold, &predicted)
    }

    fn relation_keys(&self, index: &dyn SpanIndex) -> HashSet<RelationKey> {
        index
            .relations()
            .iter()
            .filter_map(|relation| self.relation_key(index, relation))
            .collect()
    }

    fn relation_key(&self, index: &dyn SpanIndex, relation: &Relation) -> Option<RelationKey> {
        let arg1 = index.get(relation.arg1)?.span;
        let arg2 = index.get(relation.arg2)?.span;
        let (arg1, arg2) = if self.ignore_direction && arg2 < arg1 {
            (arg2, arg1)
        } else {
            (arg1, arg2)
        };

        Some((arg1, arg2, relation.category.to_uppercase()))
    }
}

fn annotation_spans(index: &dyn SpanIndex, ty: AnnotationType) -> Vec<Span> {
    index.select(ty).into_iter().map(|a| a.span).collect()
}

// ============================================================================
// Aggregate Metrics
// ============================================================================

/// Aggregate metrics over a batch of documents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub time_metrics: SpanMetrics,
    pub relation_metrics: SpanMetrics,
    pub num_documents: usize,
}

impl AggregateMetrics {
    /// Score one document pair and fold it into the totals
    pub fn add_document(
        &mut self,
        evaluator: &Evaluator,
        gold: &dyn SpanIndex,
        system: &dyn SpanIndex,
    ) {
        self.time_metrics
            .add(&evaluator.evaluate_annotations(gold, system, AnnotationType::Time));
        self.relation_metrics
            .add(&evaluator.evaluate_relations(gold, system));
        self.num_documents += 1;
    }

    /// Print a summary report
    pub fn report(&self) -> String {
        format!(
            "=== Temporal Extraction Report ===\n\n\
             Documents evaluated: {}\n\n\
             Time Expressions:\n\
               Precision: {:.1}%\n\
               Recall:    {:.1}%\n\
               F1 Score:  {:.1}%\n\
               Gold: {} | Predicted: {} | TP: {} | FP: {} | FN: {}\n\n\
             Event-Time Relations:\n\
               Precision: {:.1}%\n\
               Recall:    {:.1}%\n\
               F1 Score:  {:.1}%\n\
               Gold: {} | Predicted: {} | TP: {} | FP: {} | FN: {}\n",
            self.num_documents,
            self.time_metrics.precision() * 100.0,
            self.time_metrics.recall() * 100.0,
            self.time_metrics.f1_score() * 100.0,
            self.time_metrics.gold_total,
            self.time_metrics.predicted_total,
            self.time_metrics.true_positives,
            self.time_metrics.false_positives,
            self.time_metrics.false_negatives,
            self.relation_metrics.precision() * 100.0,
            self.relation_metrics.recall() * 100.0,
            self.relation_metrics.f1_score() * 100.0,
            self.relation_metrics.gold_total,
            self.relation_metrics.predicted_total,
            self.relation_metrics.true_positives,
            self.relation_metrics.false_positives,
            self.relation_metrics.false_negatives,
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

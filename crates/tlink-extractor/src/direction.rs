//! Relation direction handling
//!
//! Training labels carry a `-1` suffix when the gold relation has the event
//! as its first argument. At prediction time the suffix is stripped and the
//! arguments are reordered so the output relation matches the orientation
//! the label was trained on.

use std::collections::HashMap;

use tlink_core::{Annotation, AnnotationId, Relation, SpanIndex};

/// Suffix marking a category trained with the event as first argument
pub const INVERSE_SUFFIX: &str = "-1";

/// Orientation of a category relative to training order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    AsExtracted,
    Inverted,
}

/// Strip the inverse suffix, reporting which orientation the label had
pub fn split_direction(category: &str) -> (&str, Direction) {
    match category.strip_suffix(INVERSE_SUFFIX) {
        Some(base) => (base, Direction::Inverted),
        None => (category, Direction::AsExtracted),
    }
}

/// A predicted relation with its arguments in output order
#[derive(Debug, Clone, Copy)]
pub struct ResolvedRelation<'a> {
    pub category: &'a str,
    pub arg1: &'a Annotation,
    pub arg2: &'a Annotation,
    pub direction: Direction,
}

/// Reorder predicted arguments.
///
/// Inverted labels put the event first: swap when the time is in arg1.
/// Plain labels put the time first: swap when the event is in arg1.
pub fn resolve_direction<'a>(
    category: &'a str,
    arg1: &'a Annotation,
    arg2: &'a Annotation,
) -> ResolvedRelation<'a> {
    let (category, direction) = split_direction(category);

    let swap = match direction {
        Direction::Inverted => arg1.kind.is_time(),
        Direction::AsExtracted => arg1.kind.is_event(),
    };
    let (arg1, arg2) = if swap { (arg2, arg1) } else { (arg1, arg2) };

    ResolvedRelation {
        category,
        arg1,
        arg2,
        direction,
    }
}

// ============================================================================
// Gold relation lookup
// ============================================================================

/// Bidirectional lookup of gold relations by argument pair
#[derive(Debug, Default)]
pub struct RelationLookup<'a> {
    relations: HashMap<(AnnotationId, AnnotationId), &'a Relation>,
}

impl<'a> RelationLookup<'a> {
    /// Index the document's relations. A second relation over the same
    /// argument pair, in either order, is logged and ignored.
    pub fn build(index: &'a dyn SpanIndex) -> Self {
        let mut relations: HashMap<(AnnotationId, AnnotationId), &'a Relation> = HashMap::new();

        for relation in index.relations() {
            let key = (relation.arg1, relation.arg2);
            let existing = relations
                .get(&key)
                .or_else(|| relations.get(&(relation.arg2, relation.arg1)));

            if let Some(existing) = existing {
                let covered = |id: AnnotationId| {
                    index
                        .get(id)
                        .map(|a| a.text.as_str())
                        .unwrap_or("<missing>")
                };
                tracing::warn!(
                    "Duplicate relation in {}: {} conflicts with existing {} at span: {} -- {}",
                    index.document_id(),
                    relation.category,
                    existing.category,
                    covered(relation.arg1),
                    covered(relation.arg2)
                );
                continue;
            }

            relations.insert(key, relation);
        }

        Self { relations }
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Find the relation over two arguments in either order
    pub fn find(&self, a: AnnotationId, b: AnnotationId) -> Option<(&'a Relation, Direction)> {
        if let Some(relation) = self.relations.get(&(a, b)) {
            return Some((*relation, Direction::AsExtracted));
        }
        self.relations
            .get(&(b, a))
            .map(|relation| (*relation, Direction::Inverted))
    }

    /// Training category for a candidate pair, suffixed when the gold
    /// relation starts at the event. `None` when the pair is unrelated.
    pub fn training_category(&self, arg1: &Annotation, arg2: &Annotation) -> Option<String> {
        let (relation, direction) = self.find(arg1.id, arg2.id)?;

        let gold_first = match direction {
            Direction::AsExtracted => arg1,
            Direction::Inverted => arg2,
        };

        if gold_first.kind.is_event() {
            Some(format!("{}{}", relation.category, INVERSE_SUFFIX))
        } else {
            Some(relation.category.clone())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

//! In-memory annotated document
//!
//! A simple `SpanIndex` implementation for hosts that do not bring their own
//! annotation store. Annotation ids are positions in insertion order;
//! queries sort by span.

use serde::{Deserialize, Serialize};

use crate::{
    Annotation, AnnotationId, AnnotationKind, AnnotationType, AnnotationUpdate, Relation, Result,
    Span, SpanIndex, TlinkError,
};

/// Annotated document text with gold or system annotations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DocumentRecord", into = "DocumentRecord")]
pub struct Document {
    id: String,
    text: String,
    annotations: Vec<Annotation>,
    relations: Vec<Relation>,
}

impl Document {
    /// Create an empty document
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            annotations: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Text under a span, if the span is valid for this document
    pub fn covered_text(&self, span: Span) -> Option<&str> {
        if span.begin > span.end {
            return None;
        }
        self.text.get(span.begin..span.end)
    }

    /// Add an annotation, validating its span against the text
    pub fn add(&mut self, kind: AnnotationKind, span: Span) -> Result<AnnotationId> {
        let text = self
            .covered_text(span)
            .ok_or_else(|| TlinkError::InvalidSpan {
                begin: span.begin,
                end: span.end,
                reason: format!(
                    "outside text of length {} or not on a char boundary",
                    self.text.len()
                ),
            })?
            .to_string();

        let id = AnnotationId(self.annotations.len());
        self.annotations.push(Annotation {
            id,
            kind,
            span,
            text,
            doc_time_rel: None,
        });

        Ok(id)
    }

    /// Add one token annotation per span
    pub fn add_tokens(&mut self, spans: impl IntoIterator<Item = Span>) -> Result<Vec<AnnotationId>> {
        spans
            .into_iter()
            .map(|span| self.add(AnnotationKind::Token, span))
            .collect()
    }

    /// Create or overwrite the DocTimeRel of an event
    pub fn set_doc_time_rel(&mut self, event: AnnotationId, value: impl Into<String>) -> Result<()> {
        let annotation = self
            .annotations
            .get_mut(event.0)
            .ok_or_else(|| TlinkError::NotFound(format!("annotation {}", event)))?;

        if !annotation.kind.is_event() {
            return Err(TlinkError::NotFound(format!("event {}", event)));
        }

        annotation.doc_time_rel = Some(value.into());
        Ok(())
    }

    /// Add a relation between existing annotations
    pub fn add_relation(&mut self, relation: Relation) -> Result<()> {
        for arg in [relation.arg1, relation.arg2] {
            if arg.0 >= self.annotations.len() {
                return Err(TlinkError::NotFound(format!("relation argument {}", arg)));
            }
        }

        self.relations.push(relation);
        Ok(())
    }

    /// Apply one annotator update. Returns the id of a newly created annotation.
    pub fn apply(&mut self, update: AnnotationUpdate) -> Result<Option<AnnotationId>> {
        match update {
            AnnotationUpdate::SetDocTimeRel { event, value } => {
                self.set_doc_time_rel(event, value)?;
                Ok(None)
            }
            AnnotationUpdate::AddRelation(relation) => {
                self.add_relation(relation)?;
                Ok(None)
            }
            AnnotationUpdate::AddTime { span } => self.add(AnnotationKind::Time, span).map(Some),
        }
    }

    /// Apply updates in order, stopping at the first failure
    pub fn apply_all(&mut self, updates: impl IntoIterator<Item = AnnotationUpdate>) -> Result<()> {
        for update in updates {
            self.apply(update)?;
        }
        Ok(())
    }
}

impl SpanIndex for Document {
    fn document_id(&self) -> &str {
        &self.id
    }

    fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.get(id.0)
    }

    fn select(&self, ty: AnnotationType) -> Vec<&Annotation> {
        let mut selected: Vec<&Annotation> = self
            .annotations
            .iter()
            .filter(|a| a.kind.annotation_type() == ty)
            .collect();

        // Stable: equal spans keep insertion order
        selected.sort_by_key(|a| a.span);
        selected
    }

    fn relations(&self) -> &[Relation] {
        &self.relations
    }
}

// ============================================================================
// Serialized form
// ============================================================================

/// Serialized annotation: ids are implied by position, text by the span
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AnnotationRecord {
    kind: AnnotationKind,
    begin: usize,
    end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    doc_time_rel: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DocumentRecord {
    id: String,
    text: String,
    #[serde(default)]
    annotations: Vec<AnnotationRecord>,
    #[serde(default)]
    relations: Vec<Relation>,
}

impl TryFrom<DocumentRecord> for Document {
    type Error = TlinkError;

    fn try_from(record: DocumentRecord) -> Result<Self> {
        let mut document = Document::new(record.id, record.text);

        for annotation in record.annotations {
            let id = document.add(annotation.kind, Span::new(annotation.begin, annotation.end))?;
            if let Some(value) = annotation.doc_time_rel {
                document.set_doc_time_rel(id, value)?;
            }
        }

        for relation in record.relations {
            document.add_relation(relation)?;
        }

        Ok(document)
    }
}

impl From<Document> for DocumentRecord {
    fn from(document: Document) -> Self {
        Self {
            id: document.id,
            text: document.text,
            annotations: document
                .annotations
                .into_iter()
                .map(|a| AnnotationRecord {
                    kind: a.kind,
                    begin: a.span.begin,
                    end: a.span.end,
                    doc_time_rel: a.doc_time_rel,
                })
                .collect(),
            relations: document.relations,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

//! TLink Core - Annotation model, span index and classifier boundary
//!
//! This crate defines the abstractions shared by the temporal extractors:
//! - Spans and typed annotations (segments, sentences, tokens, events, times)
//! - The `SpanIndex` query surface and the in-memory `Document` store
//! - Relations and the update records annotators hand back to the host
//! - The classifier boundary (features, instances, data writers, classifiers)
//! - Common error types and configuration

pub mod config;
pub mod document;

pub use config::{ConfigError, ExtractorConfig, LoggingConfig, TlinkConfig};
pub use document::Document;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for extraction operations
#[derive(Error, Debug)]
pub enum TlinkError {
    #[error("Annotation not found: {0}")]
    NotFound(String),

    #[error("Invalid span [{begin}, {end}): {reason}")]
    InvalidSpan {
        begin: usize,
        end: usize,
        reason: String,
    },

    #[error("Label count mismatch: expected {expected} labels, classifier returned {actual}")]
    LabelCountMismatch { expected: usize, actual: usize },

    #[error("Resource error: {0}")]
    ResourceError(String),

    #[error("Classifier error: {0}")]
    ClassifierError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ConfigError> for TlinkError {
    fn from(e: ConfigError) -> Self {
        Self::ConfigError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TlinkError>;

// ============================================================================
// Spans
// ============================================================================

/// Half-open byte range `[begin, end)` into the document text.
///
/// Ordering is by begin offset, ties broken by end offset.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Span {
    pub begin: usize,
    pub end: usize,
}

impl Span {
    pub fn new(begin: usize, end: usize) -> Self {
        Self { begin, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.begin)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if `other` lies entirely inside this span
    pub fn contains(&self, other: &Span) -> bool {
        self.begin <= other.begin && other.end <= self.end
    }

    /// True if the two spans share at least one byte
    pub fn overlaps(&self, other: &Span) -> bool {
        self.begin < other.end && other.begin < self.end
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.begin, self.end)
    }
}

// ============================================================================
// Annotation Kinds
// ============================================================================

/// Event classes. `Generic` is the base event kind; the rest are
/// system-inferred subclasses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventClass {
    #[default]
    Generic,
    DiseaseDisorder,
    Procedure,
    SignSymptom,
    Medication,
    Lab,
    AnatomicalSite,
}

impl EventClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "Event",
            Self::DiseaseDisorder => "DiseaseDisorder",
            Self::Procedure => "Procedure",
            Self::SignSymptom => "SignSymptom",
            Self::Medication => "Medication",
            Self::Lab => "Lab",
            Self::AnatomicalSite => "AnatomicalSite",
        }
    }
}

impl std::fmt::Display for EventClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Closed set of annotation kinds a document can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    Segment,
    Sentence,
    Token,
    Event(EventClass),
    Time,
}

impl AnnotationKind {
    /// The selection type this kind answers to. Event subclasses select as `Event`.
    pub fn annotation_type(&self) -> AnnotationType {
        match self {
            Self::Segment => AnnotationType::Segment,
            Self::Sentence => AnnotationType::Sentence,
            Self::Token => AnnotationType::Token,
            Self::Event(_) => AnnotationType::Event,
            Self::Time => AnnotationType::Time,
        }
    }

    /// True only for the base event kind, never for its subclasses
    pub fn is_base_event(&self) -> bool {
        matches!(self, Self::Event(EventClass::Generic))
    }

    pub fn is_event(&self) -> bool {
        matches!(self, Self::Event(_))
    }

    pub fn is_time(&self) -> bool {
        matches!(self, Self::Time)
    }
}

/// Type used to query a `SpanIndex`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationType {
    Segment,
    Sentence,
    Token,
    Event,
    Time,
}

impl std::fmt::Display for AnnotationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Segment => write!(f, "segment"),
            Self::Sentence => write!(f, "sentence"),
            Self::Token => write!(f, "token"),
            Self::Event => write!(f, "event"),
            Self::Time => write!(f, "time"),
        }
    }
}

// ============================================================================
// Annotations and Relations
// ============================================================================

/// Identifier of an annotation within one document
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AnnotationId(pub usize);

impl std::fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A typed annotation over a document span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub kind: AnnotationKind,
    pub span: Span,

    /// Covered text
    pub text: String,

    /// Relation to document creation time (events only)
    pub doc_time_rel: Option<String>,
}

impl Annotation {
    pub fn begin(&self) -> usize {
        self.span.begin
    }

    pub fn end(&self) -> usize {
        self.span.end
    }
}

/// A directed relation between two annotations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub arg1: AnnotationId,
    pub arg2: AnnotationId,
    pub category: String,

    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    1.0
}

impl Relation {
    /// Create a new relation with full confidence
    pub fn new(arg1: AnnotationId, arg2: AnnotationId, category: impl Into<String>) -> Self {
        Self {
            arg1,
            arg2,
            category: category.into(),
            confidence: default_confidence(),
        }
    }

    /// Set confidence score
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }
}

/// Change an annotator asks the host store to apply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AnnotationUpdate {
    /// Create or overwrite the DocTimeRel of an event
    SetDocTimeRel { event: AnnotationId, value: String },
    /// Add a relation between two existing annotations
    AddRelation(Relation),
    /// Add a new time expression annotation
    AddTime { span: Span },
}

// ============================================================================
// Span Index
// ============================================================================

/// Read-only query surface over a document's typed annotations.
///
/// Implementors supply `document_id`, `get`, `select` and `relations`; the
/// span queries have default implementations on top of `select`. Every query
/// returns annotations in document order.
pub trait SpanIndex {
    /// Identifier used in log messages
    fn document_id(&self) -> &str;

    /// Look up an annotation by id
    fn get(&self, id: AnnotationId) -> Option<&Annotation>;

    /// All annotations of a type, in document order
    fn select(&self, ty: AnnotationType) -> Vec<&Annotation>;

    /// Gold (or previously added) relations
    fn relations(&self) -> &[Relation];

    /// Annotations of a type lying inside `span`
    fn select_covered(&self, ty: AnnotationType, span: Span) -> Vec<&Annotation> {
        self.select(ty)
            .into_iter()
            .filter(|a| span.contains(&a.span))
            .collect()
    }

    /// Annotations of a type that contain `span`
    fn select_covering(&self, ty: AnnotationType, span: Span) -> Vec<&Annotation> {
        self.select(ty)
            .into_iter()
            .filter(|a| a.span.contains(&span))
            .collect()
    }

    /// Annotations of a type strictly between two spans, whichever comes first
    fn select_between(&self, ty: AnnotationType, left: Span, right: Span) -> Vec<&Annotation> {
        let (first, second) = if left.begin <= right.begin {
            (left, right)
        } else {
            (right, left)
        };

        self.select(ty)
            .into_iter()
            .filter(|a| a.begin() >= first.end && a.end() <= second.begin)
            .collect()
    }

    /// Up to `count` annotations of a type ending at or before `span` begins
    fn select_preceding(&self, ty: AnnotationType, span: Span, count: usize) -> Vec<&Annotation> {
        let preceding: Vec<&Annotation> = self
            .select(ty)
            .into_iter()
            .filter(|a| a.end() <= span.begin)
            .collect();

        let skip = preceding.len().saturating_sub(count);
        preceding.into_iter().skip(skip).collect()
    }

    /// Up to `count` annotations of a type starting at or after `span` ends
    fn select_following(&self, ty: AnnotationType, span: Span, count: usize) -> Vec<&Annotation> {
        self.select(ty)
            .into_iter()
            .filter(|a| a.begin() >= span.end)
            .take(count)
            .collect()
    }
}

// ============================================================================
// Classifier Boundary
// ============================================================================

/// A single categorical feature
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Feature(String);

impl Feature {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Feature {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Feature {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A training record: outcome label plus ordered features
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub outcome: String,
    pub features: Vec<Feature>,
}

impl Instance {
    pub fn new(outcome: impl Into<String>, features: Vec<Feature>) -> Self {
        Self {
            outcome: outcome.into(),
            features,
        }
    }
}

/// Training-mode sink for instances. Append-only.
pub trait DataWriter {
    fn write(&mut self, instance: Instance) -> Result<()>;
}

impl DataWriter for Vec<Instance> {
    fn write(&mut self, instance: Instance) -> Result<()> {
        self.push(instance);
        Ok(())
    }
}

/// Prediction-mode classifier. Sequence classifiers return space-joined labels.
pub trait Classifier {
    fn classify(&self, features: &[Feature]) -> Result<String>;
}

impl<F> Classifier for F
where
    F: Fn(&[Feature]) -> Result<String>,
{
    fn classify(&self, features: &[Feature]) -> Result<String> {
        self(features)
    }
}

/// Explicit processing mode threaded through every annotator call
pub enum ProcessingMode<'a> {
    /// Write instances for an external trainer
    Training(&'a mut dyn DataWriter),
    /// Ask a trained classifier for labels
    Prediction(&'a dyn Classifier),
}

impl ProcessingMode<'_> {
    pub fn is_training(&self) -> bool {
        matches!(self, Self::Training(_))
    }
}

// ============================================================================
// Tests
// ============================================================================

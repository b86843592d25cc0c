//! Context window extraction
//!
//! Builds the token sequence a classifier sees around one or two anchor
//! annotations: left context, `<role>` anchor `</role>`, the tokens between
//! anchors, and right context. Time-expression anchors are replaced by their
//! normalized index token.

use tlink_core::{Annotation, AnnotationType, Feature, Span, SpanIndex};

use crate::timex::TimexNormalizer;

/// Role tag for event-like anchors
pub const EVENT_ROLE: &str = "e";

/// Role tag for time-like anchors
pub const TIME_ROLE: &str = "t";

/// An anchor annotation with the role tag used for its boundary markers
#[derive(Debug, Clone, Copy)]
pub struct Anchor<'a> {
    pub annotation: &'a Annotation,
    pub role: &'a str,
}

impl<'a> Anchor<'a> {
    pub fn new(annotation: &'a Annotation, role: &'a str) -> Self {
        Self { annotation, role }
    }

    /// Anchor tagged by its kind: `t` for times, `e` otherwise
    pub fn by_kind(annotation: &'a Annotation) -> Self {
        let role = if annotation.kind.is_time() {
            TIME_ROLE
        } else {
            EVENT_ROLE
        };
        Self { annotation, role }
    }

    fn span(&self) -> Span {
        self.annotation.span
    }
}

/// Extracts windowed token context around anchors
#[derive(Debug, Clone, Default)]
pub struct ContextWindowExtractor {
    normalizer: TimexNormalizer,
}

impl ContextWindowExtractor {
    pub fn new(normalizer: TimexNormalizer) -> Self {
        Self { normalizer }
    }

    pub fn normalizer(&self) -> &TimexNormalizer {
        &self.normalizer
    }

    /// Context for an ordered anchor pair inside `bound` (normally the sentence).
    ///
    /// `left` must begin no later than `right`. Up to `size` tokens are taken
    /// before `left` and after `right`, never crossing `bound`.
    pub fn pair_context(
        &self,
        index: &dyn SpanIndex,
        bound: Span,
        left: Anchor<'_>,
        right: Anchor<'_>,
        size: usize,
    ) -> String {
        let mut tokens: Vec<String> = Vec::new();

        for token in index.select_preceding(AnnotationType::Token, left.span(), size) {
            if bound.begin <= token.begin() {
                tokens.push(token.text.clone());
            }
        }

        self.push_anchor(&mut tokens, left);

        for token in index.select_between(AnnotationType::Token, left.span(), right.span()) {
            tokens.push(token.text.clone());
        }

        self.push_anchor(&mut tokens, right);

        for token in index.select_following(AnnotationType::Token, right.span(), size) {
            if token.end() <= bound.end {
                tokens.push(token.text.clone());
            }
        }

        join_context(&tokens)
    }

    /// Context around a single anchor. Without a bound the window may cross
    /// sentence boundaries.
    pub fn single_context(
        &self,
        index: &dyn SpanIndex,
        bound: Option<Span>,
        anchor: Anchor<'_>,
        size: usize,
    ) -> String {
        let bound = bound.unwrap_or(Span::new(0, usize::MAX));
        let mut tokens: Vec<String> = Vec::new();

        for token in index.select_preceding(AnnotationType::Token, anchor.span(), size) {
            if bound.begin <= token.begin() {
                tokens.push(token.text.clone());
            }
        }

        self.push_anchor(&mut tokens, anchor);

        for token in index.select_following(AnnotationType::Token, anchor.span(), size) {
            if token.end() <= bound.end {
                tokens.push(token.text.clone());
            }
        }

        join_context(&tokens)
    }

    /// Features for an ordered anchor pair
    pub fn pair_features(
        &self,
        index: &dyn SpanIndex,
        bound: Span,
        left: Anchor<'_>,
        right: Anchor<'_>,
        size: usize,
    ) -> Vec<Feature> {
        context_features(&self.pair_context(index, bound, left, right, size))
    }

    /// Features around a single anchor
    pub fn single_features(
        &self,
        index: &dyn SpanIndex,
        bound: Option<Span>,
        anchor: Anchor<'_>,
        size: usize,
    ) -> Vec<Feature> {
        context_features(&self.single_context(index, bound, anchor, size))
    }

    fn push_anchor(&self, tokens: &mut Vec<String>, anchor: Anchor<'_>) {
        tokens.push(format!("<{}>", anchor.role));
        tokens.push(self.anchor_token(anchor.annotation));
        tokens.push(format!("</{}>", anchor.role));
    }

    /// Normalized index for times, literal covered text otherwise
    fn anchor_token(&self, annotation: &Annotation) -> String {
        if annotation.kind.is_time() {
            self.normalizer.normalize(&annotation.text).to_string()
        } else {
            annotation.text.clone()
        }
    }
}

/// Join tokens with single spaces, turning line breaks into spaces
pub fn join_context(tokens: &[String]) -> String {
    tokens.join(" ").replace(['\r', '\n'], " ")
}

/// One lower-cased feature per space-separated piece of the context
pub fn context_features(context: &str) -> Vec<Feature> {
    context
        .split(' ')
        .filter(|piece| !piece.is_empty())
        .map(|piece| Feature::new(piece.to_lowercase()))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

//! BIO chunking
//!
//! Converts between gold spans and per-token `B-<Type>` / `I-<Type>` / `O`
//! labels. Decoding is permissive: an `I` that does not continue an open
//! chunk of the same type is read as `O`.

use std::fmt;

use tlink_core::{Result, Span, TlinkError};

/// Label given to tokens outside every chunk
pub const OUTSIDE: &str = "O";

/// A parsed BIO label
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BioTag {
    Outside,
    Begin(String),
    Inside(String),
}

impl BioTag {
    /// Parse a label. Anything that is not `B-x` or `I-x` reads as `O`.
    pub fn parse(label: &str) -> Self {
        match label.split_once('-') {
            Some(("B", ty)) if !ty.is_empty() => Self::Begin(ty.to_string()),
            Some(("I", ty)) if !ty.is_empty() => Self::Inside(ty.to_string()),
            _ => Self::Outside,
        }
    }

    pub fn chunk_type(&self) -> Option<&str> {
        match self {
            Self::Outside => None,
            Self::Begin(ty) | Self::Inside(ty) => Some(ty),
        }
    }
}

impl fmt::Display for BioTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outside => write!(f, "{}", OUTSIDE),
            Self::Begin(ty) => write!(f, "B-{}", ty),
            Self::Inside(ty) => write!(f, "I-{}", ty),
        }
    }
}

/// A decoded chunk: token-aligned span plus its type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chunk {
    pub span: Span,
    pub chunk_type: String,
}

/// BIO codec for one target chunk type
#[derive(Debug, Clone)]
pub struct BioChunking {
    chunk_type: String,
}

impl BioChunking {
    pub fn new(chunk_type: impl Into<String>) -> Self {
        Self {
            chunk_type: chunk_type.into(),
        }
    }

    pub fn chunk_type(&self) -> &str {
        &self.chunk_type
    }

    /// One tag per token. Spans covering no token are dropped; where spans
    /// overlap the first assignment wins.
    pub fn encode(&self, tokens: &[Span], spans: &[Span]) -> Vec<BioTag> {
        let mut tags = vec![BioTag::Outside; tokens.len()];

        for span in spans {
            let covered = tokens
                .iter()
                .enumerate()
                .filter(|(_, token)| span.contains(token))
                .map(|(i, _)| i);

            for (position, i) in covered.enumerate() {
                if tags[i] != BioTag::Outside {
                    continue;
                }
                tags[i] = if position == 0 {
                    BioTag::Begin(self.chunk_type.clone())
                } else {
                    BioTag::Inside(self.chunk_type.clone())
                };
            }
        }

        tags
    }

    /// `encode` rendered as label strings
    pub fn encode_labels(&self, tokens: &[Span], spans: &[Span]) -> Vec<String> {
        self.encode(tokens, spans)
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    /// Chunks of this codec's type
    pub fn decode_spans<S: AsRef<str>>(&self, tokens: &[Span], labels: &[S]) -> Result<Vec<Span>> {
        Ok(decode(tokens, labels)?
            .into_iter()
            .filter(|chunk| chunk.chunk_type == self.chunk_type)
            .map(|chunk| chunk.span)
            .collect())
    }
}

/// Decode labels of any type into chunks. Fails only when the label count
/// differs from the token count.
pub fn decode<S: AsRef<str>>(tokens: &[Span], labels: &[S]) -> Result<Vec<Chunk>> {
    if tokens.len() != labels.len() {
        return Err(TlinkError::LabelCountMismatch {
            expected: tokens.len(),
            actual: labels.len(),
        });
    }

    let mut chunks = Vec::new();
    // (first token, last token, type)
    let mut open: Option<(usize, usize, String)> = None;

    let close = |open: Option<(usize, usize, String)>, chunks: &mut Vec<Chunk>| {
        if let Some((first, last, chunk_type)) = open {
            chunks.push(Chunk {
                span: Span::new(tokens[first].begin, tokens[last].end),
                chunk_type,
            });
        }
    };

    for (i, label) in labels.iter().enumerate() {
        match BioTag::parse(label.as_ref()) {
            BioTag::Begin(ty) => {
                close(open.take(), &mut chunks);
                open = Some((i, i, ty));
            }
            BioTag::Inside(ty) => match open.as_mut() {
                Some((_, last, open_type)) if *open_type == ty => *last = i,
                // Unopened I: treated as O
                _ => close(open.take(), &mut chunks),
            },
            BioTag::Outside => close(open.take(), &mut chunks),
        }
    }
    close(open.take(), &mut chunks);

    Ok(chunks)
}

// ============================================================================
// Tests
// ============================================================================

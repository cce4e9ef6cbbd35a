use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Where in a stream a signature is expected to occur.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum SignatureKind {
    /// Pattern sits at the very start of the stream (magic number).
    Magic,
    /// Pattern may occur anywhere within the stream body.
    #[default]
    Content,
}

/// Half of a pattern byte: a literal hex digit or a wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nibble {
    Literal(u8),
    Any,
}

impl Nibble {
    #[inline]
    pub fn matches(self, value: u8) -> bool {
        match self {
            Nibble::Literal(expected) => expected == value,
            Nibble::Any => true,
        }
    }
}

/// One byte slot of a pattern, nibble-maskable on either half.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternByte {
    pub high: Nibble,
    pub low: Nibble,
}

impl PatternByte {
    #[inline]
    pub fn matches(self, byte: u8) -> bool {
        self.high.matches(byte >> 4) && self.low.matches(byte & 0xF)
    }

    /// The exact byte value, if neither nibble is masked.
    pub fn literal(self) -> Option<u8> {
        match (self.high, self.low) {
            (Nibble::Literal(high), Nibble::Literal(low)) => Some((high << 4) | low),
            _ => None,
        }
    }
}

/// An immutable byte pattern with optional nibble-level wildcards.
///
/// Built once via [`Signature::define`] and shared read-only by any number
/// of scans. Identity is the canonical pattern text: uppercase hex with
/// `?` wildcards and no separators, so `"cd 00 1?"` and `"CD001?"` define
/// equal signatures.
#[derive(Debug, Clone)]
pub struct Signature {
    kind: SignatureKind,
    pattern: Vec<PatternByte>,
    canonical_text: String,
    description: Option<String>,
}

impl Signature {
    /// Parse a pattern string into a signature.
    ///
    /// Accepted tokens are hex digits (either case), `?` wildcards and
    /// spaces; spaces are separators with no positional meaning. An odd
    /// token count is completed with one trailing wildcard nibble. Any
    /// other character fails with [`Error::InvalidPatternToken`].
    pub fn define(kind: SignatureKind, pattern: &str) -> Result<Self> {
        let canonical_text = canonicalize(pattern)?;
        let pattern = parse_canonical(&canonical_text);

        Ok(Self {
            kind,
            pattern,
            canonical_text,
            description: None,
        })
    }

    /// Attach a human-readable description (non-semantic).
    pub fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn kind(&self) -> SignatureKind {
        self.kind
    }

    pub fn pattern(&self) -> &[PatternByte] {
        &self.pattern
    }

    /// Pattern length in bytes.
    pub fn len(&self) -> usize {
        self.pattern.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_empty()
    }

    /// Normalized uppercase pattern text, the signature's identity.
    pub fn canonical_text(&self) -> &str {
        &self.canonical_text
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The first pattern byte when it is fully literal. Used by the
    /// scanner to skip between candidate positions with memchr.
    pub fn first_literal(&self) -> Option<u8> {
        self.pattern.first().and_then(|byte| byte.literal())
    }

    /// Test the pattern against `window` starting at its first byte.
    /// Returns false when the window is shorter than the pattern.
    pub fn matches_at(&self, window: &[u8]) -> bool {
        if window.len() < self.pattern.len() {
            return false;
        }

        self.pattern
            .iter()
            .zip(window)
            .all(|(slot, byte)| slot.matches(*byte))
    }
}

// Identity is the canonical text alone; canonicalization has already
// uppercased it, so comparison is case-insensitive by construction.
impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_text == other.canonical_text
    }
}

impl Eq for Signature {}

impl Hash for Signature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_text.hash(state);
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use fmt::Write;

        let mut chars = self.canonical_text.chars();
        let mut first = true;
        while let (Some(high), Some(low)) = (chars.next(), chars.next()) {
            if !first {
                f.write_char(' ')?;
            }
            first = false;
            f.write_char(high)?;
            f.write_char(low)?;
        }
        Ok(())
    }
}

fn canonicalize(pattern: &str) -> Result<String> {
    let mut text = String::with_capacity(pattern.len());

    for c in pattern.chars() {
        match c {
            '0'..='9' | 'A'..='F' | '?' => text.push(c),
            'a'..='f' => text.push(c.to_ascii_uppercase()),
            ' ' => {}
            other => return Err(Error::InvalidPatternToken(other)),
        }
    }

    if text.is_empty() {
        return Err(Error::EmptyPattern);
    }

    // An incomplete trailing byte is completed with a wildcard nibble.
    if text.len() % 2 != 0 {
        text.push('?');
    }

    Ok(text)
}

fn parse_canonical(text: &str) -> Vec<PatternByte> {
    text.as_bytes()
        .chunks(2)
        .map(|pair| PatternByte {
            high: parse_nibble(pair[0]),
            low: parse_nibble(pair[1]),
        })
        .collect()
}

fn parse_nibble(token: u8) -> Nibble {
    match token {
        b'?' => Nibble::Any,
        b'0'..=b'9' => Nibble::Literal(token - b'0'),
        _ => Nibble::Literal(token - b'A' + 10),
    }
}

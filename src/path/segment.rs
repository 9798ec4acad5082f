//! Path segments and the string-path tokenizer
//!
//! Every path utility in the crate (plain `Value` walkers and observable node
//! walkers alike) decomposes paths through [`Path::parse`], so `"items[0].name"`,
//! `"items.0.name"` and `"items['0'].name"` all address the same slot.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Keys that must never be written through.
const FORBIDDEN_KEYS: [&str; 3] = ["__proto__", "constructor", "prototype"];

/// A single segment in a path.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seg {
    /// Object key access
    Key(String),
    /// Array index access (also used as the key `"<n>"` on objects)
    Index(usize),
}

impl Seg {
    /// The segment as an object key.
    pub fn as_key(&self) -> Cow<'_, str> {
        match self {
            Seg::Key(k) => Cow::Borrowed(k),
            Seg::Index(i) => Cow::Owned(i.to_string()),
        }
    }

    /// The segment as an array index, if it is one.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Seg::Key(_) => None,
            Seg::Index(i) => Some(*i),
        }
    }

    /// Returns true if this is an index segment.
    pub fn is_index(&self) -> bool {
        matches!(self, Seg::Index(_))
    }

    /// Returns true for segments that would reach object internals in a
    /// prototype-based host (`__proto__`, `constructor`, `prototype`).
    pub fn is_forbidden(&self) -> bool {
        match self {
            Seg::Key(k) => FORBIDDEN_KEYS.contains(&k.as_str()),
            Seg::Index(_) => false,
        }
    }

    fn from_token(token: &str) -> Self {
        if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = token.parse::<usize>() {
                return Seg::Index(index);
            }
        }
        Seg::Key(token.to_string())
    }
}

impl fmt::Display for Seg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seg::Key(k) => write!(f, "{}", k),
            Seg::Index(i) => write!(f, "[{}]", i),
        }
    }
}

impl From<&str> for Seg {
    fn from(s: &str) -> Self {
        Seg::Key(s.to_string())
    }
}

impl From<String> for Seg {
    fn from(s: String) -> Self {
        Seg::Key(s)
    }
}

impl From<usize> for Seg {
    fn from(i: usize) -> Self {
        Seg::Index(i)
    }
}

/// An ordered list of segments addressing a location in a value graph.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Path(Vec<Seg>);

impl Path {
    /// The empty path (the root itself).
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Tokenize a dotted/bracketed string path.
    ///
    /// Splits on `.`, `[`, `]` and `,`, strips quote characters and drops
    /// empty segments. Purely numeric segments become [`Seg::Index`].
    pub fn parse(path: &str) -> Self {
        let segments = path
            .split(['.', '[', ']', ','])
            .map(|token| token.trim_matches(|c| c == '"' || c == '\''))
            .filter(|token| !token.is_empty())
            .map(Seg::from_token)
            .collect();
        Self(segments)
    }

    pub fn from_segments(segments: Vec<Seg>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[Seg] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn last(&self) -> Option<&Seg> {
        self.0.last()
    }

    /// The path without its final segment.
    pub fn parent(&self) -> Option<Path> {
        if self.0.is_empty() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    /// A new path with `seg` appended.
    pub fn child(&self, seg: impl Into<Seg>) -> Path {
        let mut segments = self.0.clone();
        segments.push(seg.into());
        Self(segments)
    }

    /// A new path with all of `other`'s segments appended.
    pub fn join(&self, other: &Path) -> Path {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        Self(segments)
    }

    pub fn contains_forbidden(&self) -> bool {
        self.0.iter().any(Seg::is_forbidden)
    }

    /// Returns true if `self` is an ancestor of (or equal to) `other`.
    pub fn is_prefix_of(&self, other: &Path) -> bool {
        other.0.len() >= self.0.len() && self.0.iter().zip(other.0.iter()).all(|(a, b)| seg_eq(a, b))
    }

    /// Returns true if a write at one path can change the value seen at the other.
    pub fn overlaps(&self, other: &Path) -> bool {
        self.is_prefix_of(other) || other.is_prefix_of(self)
    }
}

/// `Key("0")` and `Index(0)` address the same slot.
fn seg_eq(a: &Seg, b: &Seg) -> bool {
    a == b || a.as_key() == b.as_key()
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            match seg {
                Seg::Key(k) if i == 0 => write!(f, "{}", k)?,
                Seg::Key(k) => write!(f, ".{}", k)?,
                Seg::Index(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Self {
        Path::parse(s)
    }
}

impl From<&String> for Path {
    fn from(s: &String) -> Self {
        Path::parse(s)
    }
}

impl From<Vec<Seg>> for Path {
    fn from(segments: Vec<Seg>) -> Self {
        Path(segments)
    }
}

//! Slash-delimited tree paths.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Characters that may not appear in a path segment.
const FORBIDDEN: &[char] = &['.', '#', '$', '[', ']'];

/// Maximum nesting depth of a path.
const MAX_DEPTH: usize = 32;

/// The reserved synthetic namespace for client-local state.
pub const INFO_SEGMENT: &str = ".info";

/// Errors from path parsing and validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PathError {
    /// A segment contains a forbidden character or is otherwise invalid.
    #[error("invalid path segment: {segment:?}")]
    InvalidSegment {
        /// The offending segment.
        segment: String,
    },

    /// The path exceeds the maximum nesting depth.
    #[error("path too deep: {depth} segments (max {MAX_DEPTH})")]
    TooDeep {
        /// Number of segments in the rejected path.
        depth: usize,
    },

    /// The path names a synthetic location that cannot be written.
    #[error("path is reserved: {path}")]
    Reserved {
        /// Display form of the rejected path.
        path: String,
    },
}

/// Result type for path operations.
pub type PathResult<T> = Result<T, PathError>;

/// A validated, slash-delimited path into the tree.
///
/// The empty path addresses the root. Leading, trailing, and repeated
/// slashes are collapsed during parsing. Segments may not contain
/// `. # $ [ ]`, with one exception: a path may start with the reserved
/// `.info` segment, which addresses synthetic client-local state.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// The root path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses and validates a path string.
    pub fn parse(raw: &str) -> PathResult<Self> {
        let mut segments = Vec::new();
        for (index, segment) in raw.split('/').filter(|s| !s.is_empty()).enumerate() {
            if index == 0 && segment == INFO_SEGMENT {
                segments.push(segment.to_string());
                continue;
            }
            if segment.contains(FORBIDDEN) {
                return Err(PathError::InvalidSegment {
                    segment: segment.to_string(),
                });
            }
            segments.push(segment.to_string());
        }
        if segments.len() > MAX_DEPTH {
            return Err(PathError::TooDeep {
                depth: segments.len(),
            });
        }
        Ok(Self { segments })
    }

    /// The synthetic connectivity path, `.info/connected`.
    pub fn info_connected() -> Self {
        Self {
            segments: vec![INFO_SEGMENT.to_string(), "connected".to_string()],
        }
    }

    /// Returns true for the root path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns true if the path is inside the synthetic `.info` namespace.
    pub fn is_info(&self) -> bool {
        self.segments.first().map(String::as_str) == Some(INFO_SEGMENT)
    }

    /// Returns the final segment, or None for the root.
    pub fn key(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Returns the segments in order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the nesting depth.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Returns the path extended by one child segment.
    pub fn child(&self, segment: &str) -> PathResult<Self> {
        if segment.contains(FORBIDDEN) || segment.is_empty() || segment.contains('/') {
            return Err(PathError::InvalidSegment {
                segment: segment.to_string(),
            });
        }
        if self.segments.len() + 1 > MAX_DEPTH {
            return Err(PathError::TooDeep {
                depth: self.segments.len() + 1,
            });
        }
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self { segments })
    }

    /// Returns the path extended by every segment of `relative`.
    pub fn join(&self, relative: &Path) -> PathResult<Self> {
        let depth = self.segments.len() + relative.segments.len();
        if depth > MAX_DEPTH {
            return Err(PathError::TooDeep { depth });
        }
        let mut segments = self.segments.clone();
        segments.extend(relative.segments.iter().cloned());
        Ok(Self { segments })
    }

    /// Extends the path by a segment that is already known to be valid,
    /// e.g. a key served by the remote store.
    pub(crate) fn child_unchecked(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Self { segments }
    }

    /// Returns the parent path, or None for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Returns true if `self` is an ancestor of `other` or equal to it.
    pub fn contains(&self, other: &Path) -> bool {
        other.segments.len() >= self.segments.len()
            && self
                .segments
                .iter()
                .zip(other.segments.iter())
                .all(|(a, b)| a == b)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

//! Absolute repository paths.
//!
//! A path is a `/`-separated sequence of namespace-qualified names. Each
//! segment may carry a same-name-sibling index written as `name[n]`, where
//! `n` is 1-based and `name` is shorthand for `name[1]`. The root path is the
//! literal `/`.

use crate::{PathError, PathResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Characters that may never appear inside a single name.
const ILLEGAL_NAME_CHARS: [char; 5] = ['/', '[', ']', '|', '*'];

/// Validate a single item name (without index).
pub fn validate_name(name: &str) -> PathResult<()> {
    if name.is_empty() {
        return Err(PathError::invalid_name(name, "name is empty"));
    }
    if name == "." || name == ".." {
        return Err(PathError::invalid_name(name, "name is a relative step"));
    }
    if name.contains(ILLEGAL_NAME_CHARS) {
        return Err(PathError::invalid_name(
            name,
            "name contains one of '/', '[', ']', '|', '*'",
        ));
    }
    if name.starts_with(':') || name.ends_with(':') || name.matches(':').count() > 1 {
        return Err(PathError::invalid_name(name, "malformed namespace prefix"));
    }
    Ok(())
}

/// One step of a path: a name plus its 1-based same-name-sibling index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathSegment {
    name: String,
    index: usize,
}

impl PathSegment {
    /// Create a segment, validating the name. Index 0 is rejected.
    pub fn new(name: impl Into<String>, index: usize) -> PathResult<Self> {
        let name = name.into();
        validate_name(&name)?;
        if index == 0 {
            return Err(PathError::InvalidIndex {
                segment: format!("{}[0]", name),
            });
        }
        Ok(Self { name, index })
    }

    /// Parse `name` or `name[n]`.
    pub fn parse(segment: &str) -> PathResult<Self> {
        match segment.find('[') {
            None => Self::new(segment, 1),
            Some(open) => {
                let invalid = || PathError::InvalidIndex {
                    segment: segment.to_string(),
                };
                let digits = segment[open + 1..]
                    .strip_suffix(']')
                    .ok_or_else(invalid)?;
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid());
                }
                let index = digits.parse::<usize>().map_err(|_| invalid())?;
                Self::new(&segment[..open], index)
            }
        }
    }

    /// The name without index.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The 1-based same-name-sibling index.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.index > 1 {
            write!(f, "{}[{}]", self.name, self.index)
        } else {
            f.write_str(&self.name)
        }
    }
}

/// An absolute, normalized repository path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    /// The root path `/`.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse an absolute path. Relative paths are rejected.
    pub fn parse(path: &str) -> PathResult<Self> {
        let rest = path
            .strip_prefix('/')
            .ok_or_else(|| PathError::not_absolute(path))?;
        if rest.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for raw in rest.split('/') {
            if raw.is_empty() {
                return Err(PathError::EmptySegment {
                    path: path.to_string(),
                });
            }
            if raw == "." || raw == ".." {
                return Err(PathError::RelativeSegment {
                    path: path.to_string(),
                    segment: raw.to_string(),
                });
            }
            segments.push(PathSegment::parse(raw)?);
        }
        Ok(Self { segments })
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments; 0 for the root.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// All segments from the root downwards.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// The last segment, `None` for the root.
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// The name of the last segment without index; empty for the root.
    pub fn name(&self) -> &str {
        self.segments.last().map(|s| s.name()).unwrap_or("")
    }

    /// The index of the last segment; 1 for the root.
    pub fn index(&self) -> usize {
        self.segments.last().map(|s| s.index()).unwrap_or(1)
    }

    /// The parent path, `None` for the root.
    pub fn parent(&self) -> Option<Path> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Append a segment.
    pub fn join(&self, segment: PathSegment) -> Path {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// Append `name[index]`, validating the name.
    pub fn child(&self, name: &str, index: usize) -> PathResult<Path> {
        Ok(self.join(PathSegment::new(name, index)?))
    }

    /// Whether `self` is strictly below `ancestor`.
    pub fn is_descendant_of(&self, ancestor: &Path) -> bool {
        self.segments.len() > ancestor.segments.len()
            && self.segments[..ancestor.segments.len()] == ancestor.segments[..]
    }

    /// Replace the prefix `from` with `to`; `None` if `self` is not `from`
    /// or one of its descendants.
    pub fn rebase(&self, from: &Path, to: &Path) -> Option<Path> {
        if self != from && !self.is_descendant_of(from) {
            return None;
        }
        let mut segments = to.segments.clone();
        segments.extend_from_slice(&self.segments[from.segments.len()..]);
        Some(Self { segments })
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Path {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Path> for String {
    fn from(path: Path) -> Self {
        path.to_string()
    }
}

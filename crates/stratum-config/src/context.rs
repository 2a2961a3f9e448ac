//! Context identifier parsing.
//!
//! A context identifier such as `Production/Staging,debug` selects which
//! configuration layers apply. Slashes separate *segment groups*; a group's
//! position (1-based) is the ordinal of the layer directory it reads from.
//! Commas separate *alternative labels* inside a group, each naming one
//! override file at that ordinal.
//!
//! Labels are used to build file names, so their character set is checked
//! here, before anything touches the filesystem.

use std::fmt;
use std::str::FromStr;

use crate::{ConfigError, ConfigResult};

/// Separator between segment groups.
pub const SEGMENT_SEPARATOR: char = '/';

/// Separator between alternative labels within one segment group.
pub const ALTERNATIVE_SEPARATOR: char = ',';

/// Returns `true` if `c` may appear in a context label.
pub fn is_label_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// One slash-delimited position of a context identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentGroup {
    ordinal: usize,
    raw: String,
    labels: Vec<String>,
}

impl SegmentGroup {
    /// The 1-based layer ordinal this group reads from.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// The group exactly as written in the context identifier.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// All labels in listed order, including empty ones.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Non-empty labels in listed order.
    pub fn active_labels(&self) -> impl Iterator<Item = &str> {
        self.labels
            .iter()
            .map(String::as_str)
            .filter(|label| !label.is_empty())
    }

    /// Returns `true` if the group selects at least one override file.
    pub fn is_active(&self) -> bool {
        self.active_labels().next().is_some()
    }

    /// Returns `true` if one of the labels equals `label`.
    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// A validated, immutable context identifier.
///
/// # Example
///
/// ```
/// use stratum_config::ContextPath;
///
/// let path: ContextPath = "Production/Staging,debug".parse().unwrap();
/// assert_eq!(path.len(), 2);
/// assert_eq!(path.groups()[1].labels(), ["Staging", "debug"]);
///
/// assert!("Production/../etc".parse::<ContextPath>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextPath {
    raw: String,
    groups: Vec<SegmentGroup>,
}

impl ContextPath {
    /// Parse and validate a raw context identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidContextFormat`] if a non-empty label
    /// contains a character outside `[A-Za-z0-9_-]`.
    pub fn parse(raw: &str) -> ConfigResult<Self> {
        let mut groups = Vec::new();

        for (index, segment) in raw.split(SEGMENT_SEPARATOR).enumerate() {
            let labels: Vec<String> = segment
                .split(ALTERNATIVE_SEPARATOR)
                .map(str::to_string)
                .collect();

            if labels.iter().any(|label| !label.chars().all(is_label_char)) {
                return Err(ConfigError::invalid_context(segment, raw));
            }

            groups.push(SegmentGroup {
                ordinal: index + 1,
                raw: segment.to_string(),
                labels,
            });
        }

        Ok(Self {
            raw: raw.to_string(),
            groups,
        })
    }

    /// The raw identifier as supplied.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Segment groups in ordinal order.
    pub fn groups(&self) -> &[SegmentGroup] {
        &self.groups
    }

    /// Number of segment groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns `true` if no group selects an override file.
    pub fn is_empty(&self) -> bool {
        !self.groups.iter().any(SegmentGroup::is_active)
    }

    /// Short form used in display names: the first character of every segment.
    ///
    /// `Development/Local` becomes `D/L`; empty segments stay empty.
    pub fn abbreviated(&self) -> String {
        self.groups
            .iter()
            .map(|group| group.raw.chars().next().map(String::from).unwrap_or_default())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl FromStr for ContextPath {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ContextPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Broad classification of a context, taken from its first segment group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKind {
    /// Local or shared development.
    Development,
    /// Automated testing.
    Testing,
    /// Production, including staging variants.
    Production,
    /// Anything else.
    Other,
}

impl ContextKind {
    /// Label that selects this kind in the first segment group.
    pub fn label(self) -> Option<&'static str> {
        match self {
            Self::Development => Some("Development"),
            Self::Testing => Some("Testing"),
            Self::Production => Some("Production"),
            Self::Other => None,
        }
    }

    fn classify(path: &ContextPath) -> Self {
        let Some(root) = path.groups().first() else {
            return Self::Other;
        };

        [Self::Development, Self::Testing, Self::Production]
            .into_iter()
            .find(|kind| kind.label().is_some_and(|label| root.contains(label)))
            .unwrap_or(Self::Other)
    }
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label().unwrap_or("Other"))
    }
}

/// The running application context: a parsed identifier and its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationContext {
    path: ContextPath,
    kind: ContextKind,
}

impl ApplicationContext {
    /// Parse a context identifier and classify it.
    ///
    /// # Errors
    ///
    /// See [`ContextPath::parse`].
    pub fn parse(raw: &str) -> ConfigResult<Self> {
        Ok(Self::from(ContextPath::parse(raw)?))
    }

    /// The parsed identifier.
    pub fn path(&self) -> &ContextPath {
        &self.path
    }

    /// The context classification.
    pub fn kind(&self) -> ContextKind {
        self.kind
    }

    /// Returns `true` for development-like contexts.
    pub fn is_development(&self) -> bool {
        self.kind == ContextKind::Development
    }

    /// Returns `true` for production contexts.
    pub fn is_production(&self) -> bool {
        self.kind == ContextKind::Production
    }

    /// Returns `true` for testing contexts.
    pub fn is_testing(&self) -> bool {
        self.kind == ContextKind::Testing
    }
}

impl From<ContextPath> for ApplicationContext {
    fn from(path: ContextPath) -> Self {
        let kind = ContextKind::classify(&path);
        Self { path, kind }
    }
}

impl fmt::Display for ApplicationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.path.fmt(f)
    }
}

use std::fmt::{Display, Formatter};

use authconsole_core::{AppError, AppResult};

use crate::RowIndex;

/// One bracketed segment of a form field name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Named key, e.g. `[name]`.
    Key(String),
    /// Numeric index, e.g. `[0]`.
    Index(u32),
    /// Unindexed array marker `[]`; each occurrence appends a new element.
    Append,
}

/// Structured form field name such as
/// `ldap_servers[0][provision_groups][1][user_groups][][usrgrpid]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    root: String,
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Starts a path at a top-level form field.
    #[must_use]
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            segments: Vec::new(),
        }
    }

    /// Starts a path at a table row: `table[row_index]`.
    #[must_use]
    pub fn row(table: &str, row_index: RowIndex) -> Self {
        Self::new(table).index(row_index.value())
    }

    /// Appends a named key segment.
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Key(key.into()));
        self
    }

    /// Appends a numeric index segment.
    #[must_use]
    pub fn index(mut self, index: u32) -> Self {
        self.segments.push(PathSegment::Index(index));
        self
    }

    /// Appends an unindexed array marker.
    #[must_use]
    pub fn append(mut self) -> Self {
        self.segments.push(PathSegment::Append);
        self
    }

    /// Parses a bracketed field name.
    pub fn parse(name: &str) -> AppResult<Self> {
        let (root, mut rest) = match name.find('[') {
            Some(position) => (&name[..position], &name[position..]),
            None => (name, ""),
        };

        if root.is_empty() || root.contains(']') {
            return Err(AppError::Validation(format!(
                "form field name '{name}' has no valid root"
            )));
        }

        let mut segments = Vec::new();
        while !rest.is_empty() {
            let Some(inner) = rest.strip_prefix('[') else {
                return Err(AppError::Validation(format!(
                    "form field name '{name}' has trailing characters"
                )));
            };
            let Some(close) = inner.find(']') else {
                return Err(AppError::Validation(format!(
                    "form field name '{name}' has an unterminated segment"
                )));
            };

            let content = &inner[..close];
            if content.contains('[') {
                return Err(AppError::Validation(format!(
                    "form field name '{name}' has a nested bracket"
                )));
            }

            segments.push(if content.is_empty() {
                PathSegment::Append
            } else if content.bytes().all(|byte| byte.is_ascii_digit()) {
                let index = content.parse::<u32>().map_err(|_| {
                    AppError::Validation(format!(
                        "form field name '{name}' has an out of range index"
                    ))
                })?;
                PathSegment::Index(index)
            } else {
                PathSegment::Key(content.to_owned())
            });

            rest = &inner[close + 1..];
        }

        Ok(Self {
            root: root.to_owned(),
            segments,
        })
    }

    /// Returns the top-level field name.
    #[must_use]
    pub fn root(&self) -> &str {
        self.root.as_str()
    }

    /// Returns the bracketed segments.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }
}

impl Display for FieldPath {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.root.as_str())?;
        for segment in &self.segments {
            match segment {
                PathSegment::Key(key) => write!(formatter, "[{key}]")?,
                PathSegment::Index(index) => write!(formatter, "[{index}]")?,
                PathSegment::Append => formatter.write_str("[]")?,
            }
        }

        Ok(())
    }
}

use std::collections::BTreeMap;

use authconsole_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::field_path::{FieldPath, PathSegment};

/// One submitted form input: bracketed name plus text value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    name: String,
    value: String,
}

impl FormField {
    /// Creates a form field from a structured path.
    #[must_use]
    pub fn new(path: &FieldPath, value: impl Into<String>) -> Self {
        Self {
            name: path.to_string(),
            value: value.into(),
        }
    }

    /// Creates a top-level form field.
    #[must_use]
    pub fn scalar(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Returns the bracketed field name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the field value.
    #[must_use]
    pub fn value(&self) -> &str {
        self.value.as_str()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum NodeKey {
    Index(u32),
    Key(String),
}

/// Keyed tree decoded from flat form fields.
///
/// Indexed segments become numerically ordered children, so nested rows are
/// addressed by their sub-index directly instead of by slicing field names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFieldTree {
    value: Option<String>,
    children: BTreeMap<NodeKey, FormFieldTree>,
}

impl FormFieldTree {
    /// Builds the tree from submitted fields. Later duplicates win.
    pub fn from_fields<'a, I>(fields: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = &'a FormField>,
    {
        let mut tree = Self::default();
        for field in fields {
            let path = FieldPath::parse(field.name())?;
            tree.insert(&path, field.value());
        }

        Ok(tree)
    }

    fn insert(&mut self, path: &FieldPath, value: &str) {
        let mut node = self
            .children
            .entry(NodeKey::Key(path.root().to_owned()))
            .or_default();

        for segment in path.segments() {
            let key = match segment {
                PathSegment::Key(key) => NodeKey::Key(key.clone()),
                PathSegment::Index(index) => NodeKey::Index(*index),
                PathSegment::Append => NodeKey::Index(node.next_append_index()),
            };
            node = node.children.entry(key).or_default();
        }

        node.value = Some(value.to_owned());
    }

    fn next_append_index(&self) -> u32 {
        self.children
            .keys()
            .filter_map(|key| match key {
                NodeKey::Index(index) => Some(*index),
                NodeKey::Key(_) => None,
            })
            .max()
            .map_or(0, |index| index.saturating_add(1))
    }

    /// Returns the named child.
    #[must_use]
    pub fn child(&self, key: &str) -> Option<&Self> {
        self.children.get(&NodeKey::Key(key.to_owned()))
    }

    /// Returns the indexed child.
    #[must_use]
    pub fn at(&self, index: u32) -> Option<&Self> {
        self.children.get(&NodeKey::Index(index))
    }

    /// Returns the value stored at this node.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Returns the value of a named child, if present.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.child(key).and_then(Self::value)
    }

    /// Returns the value of a named child or a validation error naming `context`.
    pub fn required_text(&self, key: &str, context: &str) -> AppResult<String> {
        self.text(key).map(str::to_owned).ok_or_else(|| {
            AppError::Validation(format!("{context} is missing required field '{key}'"))
        })
    }

    /// Returns indexed children in ascending index order.
    pub fn indexed(&self) -> impl Iterator<Item = (u32, &Self)> {
        self.children.iter().filter_map(|(key, node)| match key {
            NodeKey::Index(index) => Some((*index, node)),
            NodeKey::Key(_) => None,
        })
    }
}

use authconsole_core::AppResult;
use authconsole_domain::{ProvisionMedia, RowIndex};

use crate::editable_table::EditableTable;

/// SAML media type mappings, in insertion order.
#[derive(Debug, Clone)]
pub struct SamlProvisionMediaTable {
    rows: EditableTable<ProvisionMedia>,
}

impl Default for SamlProvisionMediaTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SamlProvisionMediaTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: EditableTable::new("SAML media type mapping"),
        }
    }

    /// Loads page data; row indices follow the supplied order.
    pub fn load(media: Vec<ProvisionMedia>) -> AppResult<Self> {
        let mut table = Self::new();
        for entry in media {
            let index = table.rows.allocate_index();
            table.rows.push(index, entry)?;
        }

        Ok(table)
    }

    /// Returns the smallest free row index.
    #[must_use]
    pub fn allocate_index(&self) -> RowIndex {
        self.rows.allocate_index()
    }

    /// Appends a mapping and returns its row index.
    pub fn insert(&mut self, reserved: Option<RowIndex>, media: ProvisionMedia) -> AppResult<RowIndex> {
        let index = reserved
            .filter(|index| !self.rows.contains(*index))
            .unwrap_or_else(|| self.rows.allocate_index());
        self.rows.push(index, media)?;
        Ok(index)
    }

    /// Replaces a mapping wholesale.
    pub fn update(&mut self, index: RowIndex, media: ProvisionMedia) -> AppResult<()> {
        self.rows.replace(index, media)?;
        Ok(())
    }

    /// Removes a mapping.
    pub fn remove(&mut self, index: RowIndex) -> AppResult<ProvisionMedia> {
        self.rows.remove(index)
    }

    /// Returns a row by index.
    pub fn require(&self, index: RowIndex) -> AppResult<&ProvisionMedia> {
        self.rows.require(index)
    }

    /// Returns whether a live row holds `index`.
    #[must_use]
    pub fn contains(&self, index: RowIndex) -> bool {
        self.rows.contains(index)
    }

    /// Returns the generation of the row at `index`.
    #[must_use]
    pub fn generation(&self, index: RowIndex) -> Option<u64> {
        self.rows.generation(index)
    }

    /// Iterates rows in display order.
    pub fn iter(&self) -> impl Iterator<Item = (RowIndex, &ProvisionMedia)> {
        self.rows.iter()
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

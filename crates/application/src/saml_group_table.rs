use authconsole_core::{AppError, AppResult};
use authconsole_domain::{FallbackStatus, GroupMappingKind, ProvisionGroup, RowIndex};
use tracing::debug;

use crate::editable_table::EditableTable;

/// SAML provision groups: sortable regular mappings followed by the fallback.
///
/// Invariants: exactly one fallback row, always last; sortorders are
/// `1..=n` over the regular rows in display order and `n + 1` on the fallback.
#[derive(Debug, Clone)]
pub struct SamlProvisionGroupTable {
    rows: EditableTable<ProvisionGroup>,
    fallback: RowIndex,
}

impl SamlProvisionGroupTable {
    /// Loads page data; row indices follow the supplied order.
    ///
    /// The fallback mapping is moved last if supplied elsewhere.
    pub fn load(groups: Vec<ProvisionGroup>) -> AppResult<Self> {
        let mut rows = EditableTable::new("SAML provision group");
        let mut fallback = None;

        for (position, group) in groups.into_iter().enumerate() {
            let index = RowIndex::new(u32::try_from(position).map_err(|_| {
                AppError::Validation("too many SAML provision groups".to_owned())
            })?);

            if group.is_fallback() {
                if fallback.is_some() {
                    return Err(AppError::Validation(
                        "SAML provisioning allows only one fallback group mapping".to_owned(),
                    ));
                }
                fallback = Some((index, group));
                continue;
            }

            rows.push(index, group)?;
        }

        let Some((fallback_index, fallback_group)) = fallback else {
            return Err(AppError::Validation(
                "SAML provisioning requires a fallback group mapping".to_owned(),
            ));
        };
        rows.push(fallback_index, fallback_group)?;

        let mut table = Self {
            rows,
            fallback: fallback_index,
        };
        table.renumber();
        Ok(table)
    }

    /// Returns the smallest free row index.
    #[must_use]
    pub fn allocate_index(&self) -> RowIndex {
        self.rows.allocate_index()
    }

    /// Adds a regular mapping directly before the fallback row.
    ///
    /// The new row takes the fallback's sortorder and the fallback moves one
    /// position down.
    pub fn insert(
        &mut self,
        reserved: Option<RowIndex>,
        mut group: ProvisionGroup,
    ) -> AppResult<RowIndex> {
        if group.is_fallback() {
            return Err(AppError::Validation(
                "only regular group mappings can be added".to_owned(),
            ));
        }

        let index = reserved
            .filter(|index| !self.rows.contains(*index))
            .unwrap_or_else(|| self.rows.allocate_index());

        let sortorder = self.fallback_group()?.sortorder();
        group.set_sortorder(sortorder);
        self.rows.insert_before(self.fallback, index, group)?;

        if let Some(fallback) = self.rows.get_mut(self.fallback) {
            fallback.set_sortorder(sortorder.saturating_add(1));
        }

        debug!(row_index = %index, sortorder, "inserted SAML provision group");
        Ok(index)
    }

    /// Replaces a mapping, keeping its sortorder and fallback status.
    pub fn update(&mut self, index: RowIndex, mut group: ProvisionGroup) -> AppResult<()> {
        let current = self.rows.require(index)?;
        if current.kind() != group.kind() {
            return Err(AppError::Validation(format!(
                "SAML provision group {index} cannot change between regular and fallback"
            )));
        }

        group.set_sortorder(current.sortorder());
        if let Some(status) = current.fallback_status() {
            group.set_fallback_status(status);
        }

        self.rows.replace(index, group)?;
        Ok(())
    }

    /// Removes a regular mapping and closes the sortorder gap.
    pub fn remove(&mut self, index: RowIndex) -> AppResult<ProvisionGroup> {
        if index == self.fallback {
            return Err(AppError::Conflict(
                "the fallback group mapping cannot be removed".to_owned(),
            ));
        }

        let removed = self.rows.remove(index)?;
        self.renumber();
        Ok(removed)
    }

    /// Sets the fallback status; setting the current status is a no-op.
    pub fn toggle_fallback(&mut self, target: FallbackStatus) -> AppResult<()> {
        let fallback = self.fallback;
        let group = self.rows.get_mut(fallback).ok_or_else(|| {
            AppError::Internal("fallback group mapping row is missing".to_owned())
        })?;
        group.set_fallback_status(target);
        Ok(())
    }

    /// Applies a drag-and-drop result: `order` lists every regular row in
    /// its new display order. Row indices are unchanged.
    pub fn reorder(&mut self, order: &[RowIndex]) -> AppResult<()> {
        if order.contains(&self.fallback) {
            return Err(AppError::Validation(
                "the fallback group mapping is not sortable".to_owned(),
            ));
        }

        if order.len() != self.regular_count() {
            return Err(AppError::Validation(format!(
                "reorder must list all {} regular group mappings",
                self.regular_count()
            )));
        }

        self.rows.reorder_run(order)?;
        self.renumber();
        Ok(())
    }

    /// Returns the fallback row index.
    #[must_use]
    pub fn fallback_row(&self) -> RowIndex {
        self.fallback
    }

    /// Returns the current fallback status.
    pub fn fallback_status(&self) -> AppResult<FallbackStatus> {
        self.fallback_group()?.fallback_status().ok_or_else(|| {
            AppError::Internal("fallback row holds a regular mapping".to_owned())
        })
    }

    /// Returns the number of regular mappings.
    #[must_use]
    pub fn regular_count(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    /// Returns the kind of the mapping at `index`.
    pub fn kind_of(&self, index: RowIndex) -> AppResult<GroupMappingKind> {
        Ok(self.rows.require(index)?.kind())
    }

    /// Returns a row by index.
    pub fn require(&self, index: RowIndex) -> AppResult<&ProvisionGroup> {
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

    /// Iterates rows in display order; the fallback comes last.
    pub fn iter(&self) -> impl Iterator<Item = (RowIndex, &ProvisionGroup)> {
        self.rows.iter()
    }

    fn fallback_group(&self) -> AppResult<&ProvisionGroup> {
        self.rows.get(self.fallback).ok_or_else(|| {
            AppError::Internal("fallback group mapping row is missing".to_owned())
        })
    }

    fn renumber(&mut self) {
        let order = self.rows.order().to_vec();
        for (position, index) in order.into_iter().enumerate() {
            if let Some(group) = self.rows.get_mut(index) {
                group.set_sortorder(u32::try_from(position + 1).unwrap_or(u32::MAX));
            }
        }
    }
}

use std::collections::BTreeMap;

use authconsole_core::{AppError, AppResult};
use authconsole_domain::{RowIndex, allocate_row_index};

/// Ordered arena of rows keyed by page-scoped row index.
///
/// Display order and identity are kept apart: reordering never changes a
/// row's index, and a removed index becomes free for the next allocation.
/// Each inserted row also gets a generation that is never handed out again,
/// so a reused index can be told apart from the row that held it before.
#[derive(Debug, Clone)]
pub struct EditableTable<R> {
    label: &'static str,
    rows: BTreeMap<RowIndex, Slot<R>>,
    order: Vec<RowIndex>,
    next_generation: u64,
}

#[derive(Debug, Clone)]
struct Slot<R> {
    generation: u64,
    row: R,
}

impl<R> EditableTable<R> {
    /// Creates an empty table; `label` names the table in errors.
    #[must_use]
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            rows: BTreeMap::new(),
            order: Vec::new(),
            next_generation: 0,
        }
    }

    /// Returns the smallest row index not held by a live row.
    #[must_use]
    pub fn allocate_index(&self) -> RowIndex {
        allocate_row_index(self.rows.keys().copied())
    }

    /// Returns whether a live row holds `index`.
    #[must_use]
    pub fn contains(&self, index: RowIndex) -> bool {
        self.rows.contains_key(&index)
    }

    /// Returns the generation of the row at `index`.
    #[must_use]
    pub fn generation(&self, index: RowIndex) -> Option<u64> {
        self.rows.get(&index).map(|slot| slot.generation)
    }

    /// Returns the number of live rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns a row by index.
    #[must_use]
    pub fn get(&self, index: RowIndex) -> Option<&R> {
        self.rows.get(&index).map(|slot| &slot.row)
    }

    /// Returns a mutable row by index.
    pub fn get_mut(&mut self, index: RowIndex) -> Option<&mut R> {
        self.rows.get_mut(&index).map(|slot| &mut slot.row)
    }

    /// Returns a row by index or a not-found error.
    pub fn require(&self, index: RowIndex) -> AppResult<&R> {
        self.get(index).ok_or_else(|| self.missing(index))
    }

    /// Returns row indices in display order.
    #[must_use]
    pub fn order(&self) -> &[RowIndex] {
        &self.order
    }

    /// Iterates rows in display order.
    pub fn iter(&self) -> impl Iterator<Item = (RowIndex, &R)> {
        self.order
            .iter()
            .filter_map(|index| self.rows.get(index).map(|slot| (*index, &slot.row)))
    }

    /// Appends a row at the end of the display order.
    pub fn push(&mut self, index: RowIndex, row: R) -> AppResult<()> {
        self.ensure_free(index)?;
        let slot = self.slot(row);
        self.rows.insert(index, slot);
        self.order.push(index);
        Ok(())
    }

    /// Inserts a row directly before `anchor` in display order.
    pub fn insert_before(&mut self, anchor: RowIndex, index: RowIndex, row: R) -> AppResult<()> {
        self.ensure_free(index)?;
        let position = self.position(anchor)?;
        let slot = self.slot(row);
        self.rows.insert(index, slot);
        self.order.insert(position, index);
        Ok(())
    }

    /// Replaces a row wholesale, keeping its index, position and generation.
    pub fn replace(&mut self, index: RowIndex, row: R) -> AppResult<R> {
        let missing = self.missing(index);
        let slot = self.rows.get_mut(&index).ok_or(missing)?;
        Ok(std::mem::replace(&mut slot.row, row))
    }

    /// Removes a row and frees its index.
    pub fn remove(&mut self, index: RowIndex) -> AppResult<R> {
        let position = self.position(index)?;
        self.order.remove(position);
        self.rows
            .remove(&index)
            .map(|slot| slot.row)
            .ok_or_else(|| self.missing(index))
    }

    /// Rearranges the given rows into `new_order`, keeping every other row in place.
    ///
    /// `new_order` must be a permutation of the rows it names, and those rows
    /// must currently occupy a contiguous run of positions.
    pub fn reorder_run(&mut self, new_order: &[RowIndex]) -> AppResult<()> {
        let Some(first) = new_order.first() else {
            return Ok(());
        };

        let mut positions = new_order
            .iter()
            .map(|index| self.position(*index))
            .collect::<AppResult<Vec<_>>>()?;
        positions.sort_unstable();
        positions.dedup();

        if positions.len() != new_order.len() {
            return Err(AppError::Validation(format!(
                "{} reorder names row {first} or another row more than once",
                self.label
            )));
        }

        let start = positions[0];
        if positions
            .iter()
            .enumerate()
            .any(|(offset, position)| *position != start + offset)
        {
            return Err(AppError::Validation(format!(
                "{} reorder must cover a contiguous run of rows",
                self.label
            )));
        }

        self.order[start..start + new_order.len()].copy_from_slice(new_order);
        Ok(())
    }

    fn position(&self, index: RowIndex) -> AppResult<usize> {
        self.order
            .iter()
            .position(|candidate| *candidate == index)
            .ok_or_else(|| self.missing(index))
    }

    fn slot(&mut self, row: R) -> Slot<R> {
        let generation = self.next_generation;
        self.next_generation = self.next_generation.saturating_add(1);
        Slot { generation, row }
    }

    fn ensure_free(&self, index: RowIndex) -> AppResult<()> {
        if self.rows.contains_key(&index) {
            return Err(AppError::Conflict(format!(
                "{} row index {index} is already in use",
                self.label
            )));
        }

        Ok(())
    }

    fn missing(&self, index: RowIndex) -> AppError {
        AppError::NotFound(format!("{} row {index} does not exist", self.label))
    }
}

#[cfg(test)]
mod tests {
    use authconsole_core::AppError;
    use authconsole_domain::RowIndex;

    use super::EditableTable;

    fn table_with(rows: &[(u32, &'static str)]) -> EditableTable<&'static str> {
        let mut table = EditableTable::new("test");
        for (index, value) in rows {
            table
                .push(RowIndex::new(*index), *value)
                .unwrap_or_else(|_| unreachable!());
        }
        table
    }

    fn values(table: &EditableTable<&'static str>) -> Vec<&'static str> {
        table.iter().map(|(_, value)| *value).collect()
    }

    #[test]
    fn removed_index_is_reallocated() {
        let mut table = table_with(&[(0, "a"), (1, "b")]);
        table
            .remove(RowIndex::new(1))
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(table.allocate_index(), RowIndex::new(1));
    }

    #[test]
    fn reused_index_gets_a_new_generation() {
        let mut table = table_with(&[(0, "a"), (1, "b")]);
        let before = table.generation(RowIndex::new(1));
        table
            .remove(RowIndex::new(1))
            .unwrap_or_else(|_| unreachable!());
        table
            .push(RowIndex::new(1), "c")
            .unwrap_or_else(|_| unreachable!());

        assert!(before.is_some());
        assert_ne!(table.generation(RowIndex::new(1)), before);
    }

    #[test]
    fn replace_keeps_generation() {
        let mut table = table_with(&[(0, "a")]);
        let before = table.generation(RowIndex::new(0));
        table
            .replace(RowIndex::new(0), "A")
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(table.generation(RowIndex::new(0)), before);
    }

    #[test]
    fn insert_before_places_row_ahead_of_anchor() {
        let mut table = table_with(&[(0, "a"), (5, "fallback")]);
        table
            .insert_before(RowIndex::new(5), RowIndex::new(1), "b")
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(values(&table), vec!["a", "b", "fallback"]);
    }

    #[test]
    fn duplicate_index_is_a_conflict() {
        let mut table = table_with(&[(0, "a")]);
        let result = table.push(RowIndex::new(0), "b");
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(values(&table), vec!["a"]);
    }

    #[test]
    fn replace_keeps_position() {
        let mut table = table_with(&[(0, "a"), (1, "b"), (2, "c")]);
        let old = table
            .replace(RowIndex::new(1), "B")
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(old, "b");
        assert_eq!(values(&table), vec!["a", "B", "c"]);
    }

    #[test]
    fn missing_row_is_not_found() {
        let mut table = table_with(&[(0, "a")]);
        assert!(matches!(
            table.remove(RowIndex::new(3)),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            table.replace(RowIndex::new(3), "x"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn reorder_run_keeps_identity_and_other_rows() {
        let mut table = table_with(&[(0, "a"), (1, "b"), (2, "c"), (3, "fallback")]);
        table
            .reorder_run(&[RowIndex::new(2), RowIndex::new(0), RowIndex::new(1)])
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(values(&table), vec!["c", "a", "b", "fallback"]);
        assert_eq!(table.get(RowIndex::new(2)), Some(&"c"));
    }

    #[test]
    fn reorder_run_rejects_duplicates_and_gaps() {
        let mut table = table_with(&[(0, "a"), (1, "b"), (2, "c")]);

        assert!(
            table
                .reorder_run(&[RowIndex::new(0), RowIndex::new(0)])
                .is_err()
        );
        assert!(
            table
                .reorder_run(&[RowIndex::new(2), RowIndex::new(0)])
                .is_err()
        );
        assert_eq!(values(&table), vec!["a", "b", "c"]);
    }
}

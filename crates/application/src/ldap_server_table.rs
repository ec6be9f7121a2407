use authconsole_core::{AppError, AppResult};
use authconsole_domain::{LdapServer, RowIndex};
use authconsole_domain::wire::lenient_u32;
use serde::Deserialize;
use tracing::debug;

use crate::editable_table::EditableTable;

/// LDAP server as supplied with the page: record plus usage count.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InitialLdapServer {
    /// Server record.
    #[serde(flatten)]
    pub server: LdapServer,
    /// Number of user groups bound to this server.
    #[serde(default, deserialize_with = "lenient_u32")]
    pub usrgrps: u32,
}

/// One LDAP table row: the record plus read-only table bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdapServerRow {
    server: LdapServer,
    usrgrps: u32,
}

impl LdapServerRow {
    /// Returns the server record.
    #[must_use]
    pub fn server(&self) -> &LdapServer {
        &self.server
    }

    /// Returns the number of user groups bound to this server.
    #[must_use]
    pub fn usrgrps(&self) -> u32 {
        self.usrgrps
    }

    /// Returns whether the row may be removed.
    #[must_use]
    pub fn is_removable(&self) -> bool {
        self.usrgrps == 0
    }
}

/// LDAP servers table with its default-server selection.
#[derive(Debug, Clone)]
pub struct LdapServerTable {
    rows: EditableTable<LdapServerRow>,
    default_row: Option<RowIndex>,
    removed_userdirectoryids: Vec<String>,
}

impl Default for LdapServerTable {
    fn default() -> Self {
        Self::new()
    }
}

impl LdapServerTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: EditableTable::new("LDAP server"),
            default_row: None,
            removed_userdirectoryids: Vec::new(),
        }
    }

    /// Loads page data; row indices follow the supplied order.
    pub fn load(
        servers: Vec<InitialLdapServer>,
        default_row: Option<RowIndex>,
    ) -> AppResult<Self> {
        let mut table = Self::new();
        for (position, initial) in servers.into_iter().enumerate() {
            let index = RowIndex::new(u32::try_from(position).map_err(|_| {
                AppError::Validation("too many LDAP servers".to_owned())
            })?);
            table.rows.push(
                index,
                LdapServerRow {
                    server: initial.server,
                    usrgrps: initial.usrgrps,
                },
            )?;
        }

        table.default_row = default_row.filter(|index| table.rows.contains(*index));
        Ok(table)
    }

    /// Returns the smallest free row index.
    #[must_use]
    pub fn allocate_index(&self) -> RowIndex {
        self.rows.allocate_index()
    }

    /// Adds a new server and returns its row index.
    ///
    /// `reserved` is used when still free, otherwise a fresh index is taken.
    /// The first server of an empty selection becomes the default.
    pub fn insert(&mut self, reserved: Option<RowIndex>, server: LdapServer) -> AppResult<RowIndex> {
        let index = reserved
            .filter(|index| !self.rows.contains(*index))
            .unwrap_or_else(|| self.rows.allocate_index());

        self.rows.push(index, LdapServerRow { server, usrgrps: 0 })?;
        if self.default_row.is_none() {
            self.default_row = Some(index);
        }

        Ok(index)
    }

    /// Replaces a server record, keeping default selection and usage count.
    pub fn update(&mut self, index: RowIndex, server: LdapServer) -> AppResult<()> {
        let usrgrps = self.rows.require(index)?.usrgrps;
        self.rows.replace(index, LdapServerRow { server, usrgrps })?;
        Ok(())
    }

    /// Removes a server that no user group depends on.
    ///
    /// A persisted server is remembered for deletion on submit. Removing the
    /// default promotes the first remaining row.
    pub fn remove(&mut self, index: RowIndex) -> AppResult<LdapServerRow> {
        let row = self.rows.require(index)?;
        if !row.is_removable() {
            return Err(AppError::Conflict(format!(
                "LDAP server '{}' is used by {} user group(s)",
                row.server.name(),
                row.usrgrps
            )));
        }

        let removed = self.rows.remove(index)?;
        if let Some(userdirectoryid) = removed.server.userdirectoryid() {
            self.removed_userdirectoryids
                .push(userdirectoryid.to_owned());
        }

        if self.default_row == Some(index) {
            self.default_row = self.rows.order().first().copied();
            debug!(
                removed = %index,
                promoted = ?self.default_row.map(RowIndex::value),
                "default LDAP server removed"
            );
        }

        Ok(removed)
    }

    /// Marks a row as the default server.
    pub fn set_default(&mut self, index: RowIndex) -> AppResult<()> {
        self.rows.require(index)?;
        self.default_row = Some(index);
        Ok(())
    }

    /// Returns the default row, if any.
    #[must_use]
    pub fn default_row(&self) -> Option<RowIndex> {
        self.default_row
    }

    /// Returns whether `index` is the default row.
    #[must_use]
    pub fn is_default(&self, index: RowIndex) -> bool {
        self.default_row == Some(index)
    }

    /// Returns a row by index.
    pub fn require(&self, index: RowIndex) -> AppResult<&LdapServerRow> {
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
    pub fn iter(&self) -> impl Iterator<Item = (RowIndex, &LdapServerRow)> {
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

    /// Returns user directory ids of removed persisted servers.
    #[must_use]
    pub fn removed_userdirectoryids(&self) -> &[String] {
        &self.removed_userdirectoryids
    }
}

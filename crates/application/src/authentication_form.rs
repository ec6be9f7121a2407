use std::collections::BTreeMap;

use authconsole_core::{AppError, AppResult};
use authconsole_domain::wire::{format_flag, lenient_flag, parse_flag};
use authconsole_domain::{
    AuthenticationType, FallbackStatus, FormField, GroupMappingKind, IdpType, LdapServer,
    LdapServerInput, ProvisionGroup, ProvisionMedia, RowIndex, TRIMMED_SETTINGS,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::form_codec::{
    LDAP_DEFAULT_ROW_INDEX, LDAP_REMOVED_USERDIRECTORYIDS, encode_ldap_server,
    encode_saml_provision_group, encode_saml_provision_media,
};
use crate::ldap_server_table::{InitialLdapServer, LdapServerTable};
use crate::row_templates::{RenderedRow, RowTemplates};
use crate::saml_group_table::SamlProvisionGroupTable;
use crate::saml_media_table::SamlProvisionMediaTable;
use crate::ui_ports::EditorKind;

/// Confirmation asked before submitting a changed authentication type.
pub const SWITCH_AUTHENTICATION_WARNING: &str =
    "Switching authentication method will reset all except this session! Continue?";

const HTTP_AUTH_ENABLED: &str = "http_auth_enabled";

// Inputs owned by the form itself rather than the free settings map.
const OWNED_FIELDS: [&str; 5] = [
    "authentication_type",
    "saml_auth_enabled",
    "saml_provision_status",
    LDAP_DEFAULT_ROW_INDEX,
    LDAP_REMOVED_USERDIRECTORYIDS,
];

/// Data the page is opened with.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticationPageData {
    /// Configured LDAP servers with their usage counts.
    #[serde(default)]
    pub ldap_servers: Vec<InitialLdapServer>,
    /// Position of the default LDAP server.
    #[serde(default)]
    pub ldap_default_row_index: Option<RowIndex>,
    /// Stored authentication type.
    pub db_authentication_type: AuthenticationType,
    /// Selected authentication type; the stored one when absent.
    #[serde(default)]
    pub authentication_type: Option<AuthenticationType>,
    /// Whether SAML authentication is enabled.
    #[serde(default, deserialize_with = "lenient_flag")]
    pub saml_auth_enabled: bool,
    /// Whether SAML JIT provisioning is enabled.
    #[serde(default, deserialize_with = "lenient_flag")]
    pub saml_provision_status: bool,
    /// SAML group mappings, including the fallback mapping.
    pub saml_provision_groups: Vec<ProvisionGroup>,
    /// SAML media type mappings.
    #[serde(default)]
    pub saml_provision_media: Vec<ProvisionMedia>,
    /// Remaining scalar inputs of the form, by name.
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
}

/// Pending popup edit: which editor, which row, and the index reserved for
/// a new row.
///
/// An edit ticket also pins the generation of its target row, so it goes
/// stale when that row is removed even if a later row reuses the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditTicket {
    kind: EditorKind,
    target: Option<RowIndex>,
    generation: Option<u64>,
    reserved: RowIndex,
}

impl EditTicket {
    /// Returns the editor kind.
    #[must_use]
    pub fn kind(&self) -> EditorKind {
        self.kind
    }

    /// Returns the edited row, or `None` for an add.
    #[must_use]
    pub fn target(&self) -> Option<RowIndex> {
        self.target
    }

    /// Returns the row index the editor was opened with.
    #[must_use]
    pub fn row_index(&self) -> RowIndex {
        self.target.unwrap_or(self.reserved)
    }
}

/// Editor about to be opened: its ticket and seed parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorSession {
    /// Ticket to complete the edit with.
    pub ticket: EditTicket,
    /// Editor seed parameters.
    pub params: Map<String, Value>,
}

/// Outcome of the pre-submit step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitCheck {
    /// Whether the user must confirm the authentication type switch.
    pub requires_confirmation: bool,
}

/// The three tables rendered as HTML rows, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTables {
    /// LDAP server rows.
    pub ldap_servers: Vec<RenderedRow>,
    /// SAML group mapping rows; the fallback row is last.
    pub saml_provision_groups: Vec<RenderedRow>,
    /// SAML media type mapping rows.
    pub saml_provision_media: Vec<RenderedRow>,
}

/// Owned model of one authentication settings page.
///
/// Tables are authoritative: editors are seeded from them, and the
/// submitted form is their encoding.
#[derive(Debug, Clone)]
pub struct AuthenticationForm {
    db_authentication_type: AuthenticationType,
    authentication_type: AuthenticationType,
    saml_enabled: bool,
    saml_provision_status: bool,
    settings: BTreeMap<String, String>,
    ldap_servers: LdapServerTable,
    saml_provision_groups: SamlProvisionGroupTable,
    saml_provision_media: SamlProvisionMediaTable,
}

impl AuthenticationForm {
    /// Builds the page model from page data.
    pub fn new(page: AuthenticationPageData) -> AppResult<Self> {
        let ldap_servers = LdapServerTable::load(page.ldap_servers, page.ldap_default_row_index)?;
        let saml_provision_groups = SamlProvisionGroupTable::load(page.saml_provision_groups)?;
        let saml_provision_media = SamlProvisionMediaTable::load(page.saml_provision_media)?;
        let mut settings = page.settings;
        settings.retain(|name, _| !OWNED_FIELDS.contains(&name.as_str()));

        Ok(Self {
            db_authentication_type: page.db_authentication_type,
            authentication_type: page
                .authentication_type
                .unwrap_or(page.db_authentication_type),
            saml_enabled: page.saml_auth_enabled,
            saml_provision_status: page.saml_provision_status,
            settings,
            ldap_servers,
            saml_provision_groups,
            saml_provision_media,
        })
    }

    /// Returns the LDAP server table.
    #[must_use]
    pub fn ldap_servers(&self) -> &LdapServerTable {
        &self.ldap_servers
    }

    /// Returns the SAML group mapping table.
    #[must_use]
    pub fn saml_provision_groups(&self) -> &SamlProvisionGroupTable {
        &self.saml_provision_groups
    }

    /// Returns the SAML media type mapping table.
    #[must_use]
    pub fn saml_provision_media(&self) -> &SamlProvisionMediaTable {
        &self.saml_provision_media
    }

    /// Returns the selected authentication type.
    #[must_use]
    pub fn authentication_type(&self) -> AuthenticationType {
        self.authentication_type
    }

    /// Selects the authentication type.
    pub fn set_authentication_type(&mut self, authentication_type: AuthenticationType) {
        self.authentication_type = authentication_type;
    }

    /// Returns whether SAML authentication is enabled.
    #[must_use]
    pub fn saml_enabled(&self) -> bool {
        self.saml_enabled
    }

    /// Enables or disables SAML authentication and both SAML tables.
    pub fn set_saml_enabled(&mut self, enabled: bool) {
        self.saml_enabled = enabled;
    }

    /// Returns whether the SAML JIT provisioning section is shown.
    #[must_use]
    pub fn jit_provisioning_visible(&self) -> bool {
        self.saml_provision_status
    }

    /// Turns SAML JIT provisioning on or off.
    pub fn set_saml_provision_status(&mut self, enabled: bool) {
        self.saml_provision_status = enabled;
    }

    /// Returns a scalar setting.
    #[must_use]
    pub fn setting(&self, name: &str) -> Option<&str> {
        self.settings.get(name).map(String::as_str)
    }

    /// Sets a scalar setting. Inputs with a dedicated operation are rejected.
    pub fn set_setting(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> AppResult<()> {
        let name = name.into();
        if name.trim().is_empty() || name.contains('[') || OWNED_FIELDS.contains(&name.as_str()) {
            return Err(AppError::Validation(format!(
                "invalid setting name '{name}'"
            )));
        }

        self.settings.insert(name, value.into());
        Ok(())
    }

    /// Captures an editor opening for `kind`; `target` is `None` for an add.
    pub fn begin_edit(
        &self,
        kind: EditorKind,
        target: Option<RowIndex>,
    ) -> AppResult<EditorSession> {
        self.ensure_editable(kind)?;

        let (reserved, params) = match kind {
            EditorKind::LdapServer => self.ldap_editor_params(target)?,
            EditorKind::SamlProvisionGroup => self.saml_group_editor_params(target)?,
            EditorKind::SamlProvisionMedia => self.saml_media_editor_params(target)?,
        };

        let generation = target.and_then(|index| self.generation_of(kind, index));

        Ok(EditorSession {
            ticket: EditTicket {
                kind,
                target,
                generation,
                reserved,
            },
            params,
        })
    }

    /// Incorporates a submitted editor payload and returns the row index.
    ///
    /// A ticket whose target row was removed while the editor was open fails
    /// with `AppError::NotFound` and leaves every table unchanged.
    pub fn complete_edit(&mut self, ticket: EditTicket, payload: Value) -> AppResult<RowIndex> {
        self.ensure_editable(ticket.kind)?;

        let index = match ticket.kind {
            EditorKind::LdapServer => {
                let server: LdapServer = decode_payload(ticket.kind, payload)?;
                match ticket.target {
                    Some(target) => {
                        self.ensure_live(&ticket)?;
                        self.ldap_servers.update(target, server)?;
                        target
                    }
                    None => self.ldap_servers.insert(Some(ticket.reserved), server)?,
                }
            }
            EditorKind::SamlProvisionGroup => {
                let group: ProvisionGroup = decode_payload(ticket.kind, payload)?;
                match ticket.target {
                    Some(target) => {
                        self.ensure_live(&ticket)?;
                        self.saml_provision_groups.update(target, group)?;
                        target
                    }
                    None => self
                        .saml_provision_groups
                        .insert(Some(ticket.reserved), group)?,
                }
            }
            EditorKind::SamlProvisionMedia => {
                let media: ProvisionMedia = decode_payload(ticket.kind, payload)?;
                match ticket.target {
                    Some(target) => {
                        self.ensure_live(&ticket)?;
                        self.saml_provision_media.update(target, media)?;
                        target
                    }
                    None => self
                        .saml_provision_media
                        .insert(Some(ticket.reserved), media)?,
                }
            }
        };

        debug!(
            editor = %ticket.kind,
            row_index = %index,
            added = ticket.target.is_none(),
            "incorporated editor payload"
        );
        Ok(index)
    }

    /// Removes an LDAP server row.
    pub fn remove_ldap_server(&mut self, index: RowIndex) -> AppResult<()> {
        self.ldap_servers.remove(index).map(|_| ())
    }

    /// Marks an LDAP server row as the default.
    pub fn set_default_ldap_server(&mut self, index: RowIndex) -> AppResult<()> {
        self.ldap_servers.set_default(index)
    }

    /// Removes a regular SAML group mapping row.
    pub fn remove_saml_provision_group(&mut self, index: RowIndex) -> AppResult<()> {
        self.ensure_editable(EditorKind::SamlProvisionGroup)?;
        self.saml_provision_groups.remove(index).map(|_| ())
    }

    /// Sets the fallback mapping status.
    pub fn toggle_fallback_status(&mut self, target: FallbackStatus) -> AppResult<()> {
        self.ensure_editable(EditorKind::SamlProvisionGroup)?;
        self.saml_provision_groups.toggle_fallback(target)
    }

    /// Applies a drag reorder of the regular SAML group mapping rows.
    pub fn reorder_saml_provision_groups(&mut self, order: &[RowIndex]) -> AppResult<()> {
        self.ensure_editable(EditorKind::SamlProvisionGroup)?;
        self.saml_provision_groups.reorder(order)
    }

    /// Removes a SAML media type mapping row.
    pub fn remove_saml_provision_media(&mut self, index: RowIndex) -> AppResult<()> {
        self.ensure_editable(EditorKind::SamlProvisionMedia)?;
        self.saml_provision_media.remove(index).map(|_| ())
    }

    /// Trims free-text settings and reports whether submitting needs the
    /// authentication switch confirmation.
    pub fn prepare_submit(&mut self) -> SubmitCheck {
        for name in TRIMMED_SETTINGS {
            if let Some(value) = self.settings.get_mut(name) {
                let trimmed = value.trim();
                if trimmed.len() != value.len() {
                    *value = trimmed.to_owned();
                }
            }
        }

        SubmitCheck {
            requires_confirmation: self.authentication_type != self.db_authentication_type,
        }
    }

    /// Encodes the whole form as submitted fields.
    ///
    /// Unchecked flags are omitted, as are the HTTP settings while HTTP
    /// authentication is off and the SAML settings while SAML is disabled.
    #[must_use]
    pub fn form_fields(&self) -> Vec<FormField> {
        let mut fields = vec![FormField::scalar(
            "authentication_type",
            self.authentication_type.as_str(),
        )];

        let http_enabled = self.setting(HTTP_AUTH_ENABLED).is_some_and(parse_flag);
        fields.extend(
            self.settings
                .iter()
                .filter(|(name, _)| {
                    (http_enabled || !name.starts_with("http_"))
                        && (self.saml_enabled || !name.starts_with("saml_"))
                })
                .map(|(name, value)| {
                    if name.as_str() == HTTP_AUTH_ENABLED {
                        FormField::scalar(name.as_str(), format_flag(true))
                    } else {
                        FormField::scalar(name.as_str(), value.as_str())
                    }
                }),
        );

        if self.saml_enabled {
            fields.push(FormField::scalar("saml_auth_enabled", format_flag(true)));
        }
        if self.saml_enabled && self.saml_provision_status {
            fields.push(FormField::scalar("saml_provision_status", format_flag(true)));
        }

        for (index, row) in self.ldap_servers.iter() {
            fields.extend(encode_ldap_server(index, row.server()));
        }
        if let Some(default_row) = self.ldap_servers.default_row() {
            fields.push(FormField::scalar(
                LDAP_DEFAULT_ROW_INDEX,
                default_row.to_string(),
            ));
        }
        for userdirectoryid in self.ldap_servers.removed_userdirectoryids() {
            fields.push(FormField::scalar(
                format!("{LDAP_REMOVED_USERDIRECTORYIDS}[]"),
                userdirectoryid.as_str(),
            ));
        }

        for (index, group) in self.saml_provision_groups.iter() {
            fields.extend(encode_saml_provision_group(index, group));
        }
        for (index, media) in self.saml_provision_media.iter() {
            fields.extend(encode_saml_provision_media(index, media));
        }

        fields
    }

    /// Renders the three tables.
    pub fn render(&self, templates: &RowTemplates) -> AppResult<RenderedTables> {
        let saml_disabled = !self.saml_enabled;

        Ok(RenderedTables {
            ldap_servers: self
                .ldap_servers
                .iter()
                .map(|(index, row)| {
                    templates.render_ldap_server(index, row, self.ldap_servers.is_default(index))
                })
                .collect::<AppResult<_>>()?,
            saml_provision_groups: self
                .saml_provision_groups
                .iter()
                .map(|(index, group)| {
                    templates.render_saml_provision_group(index, group, saml_disabled)
                })
                .collect::<AppResult<_>>()?,
            saml_provision_media: self
                .saml_provision_media
                .iter()
                .map(|(index, media)| {
                    templates.render_saml_provision_media(index, media, saml_disabled)
                })
                .collect::<AppResult<_>>()?,
        })
    }

    fn ensure_editable(&self, kind: EditorKind) -> AppResult<()> {
        match kind {
            EditorKind::LdapServer => Ok(()),
            EditorKind::SamlProvisionGroup | EditorKind::SamlProvisionMedia
                if !self.saml_enabled =>
            {
                Err(AppError::Forbidden(
                    "SAML tables are read-only while SAML authentication is disabled".to_owned(),
                ))
            }
            EditorKind::SamlProvisionGroup | EditorKind::SamlProvisionMedia => Ok(()),
        }
    }

    fn generation_of(&self, kind: EditorKind, index: RowIndex) -> Option<u64> {
        match kind {
            EditorKind::LdapServer => self.ldap_servers.generation(index),
            EditorKind::SamlProvisionGroup => self.saml_provision_groups.generation(index),
            EditorKind::SamlProvisionMedia => self.saml_provision_media.generation(index),
        }
    }

    fn ensure_live(&self, ticket: &EditTicket) -> AppResult<()> {
        let current = ticket
            .target
            .and_then(|target| self.generation_of(ticket.kind, target));
        if current.is_some() && current == ticket.generation {
            return Ok(());
        }

        warn!(
            editor = %ticket.kind,
            row_index = %ticket.row_index(),
            "editor submitted for a row removed while it was open"
        );
        Err(AppError::NotFound(format!(
            "row {} edited in '{}' no longer exists",
            ticket.row_index(),
            ticket.kind
        )))
    }

    fn ldap_editor_params(
        &self,
        target: Option<RowIndex>,
    ) -> AppResult<(RowIndex, Map<String, Value>)> {
        let Some(index) = target else {
            let reserved = self.ldap_servers.allocate_index();
            let mut params = Map::new();
            params.insert("row_index".to_owned(), json!(reserved.value()));
            params.insert("add_ldap_server".to_owned(), json!(1));
            return Ok((reserved, params));
        };

        let server = self.ldap_servers.require(index)?.server().clone();
        let mut params = match serde_json::to_value(LdapServerInput::from(server)) {
            Ok(Value::Object(params)) => params,
            Ok(_) => Map::new(),
            Err(error) => {
                return Err(AppError::Internal(format!(
                    "failed to encode LDAP editor parameters: {error}"
                )));
            }
        };
        params.insert("row_index".to_owned(), json!(index.value()));
        params.insert("add_ldap_server".to_owned(), json!(0));
        Ok((index, params))
    }

    fn saml_group_editor_params(
        &self,
        target: Option<RowIndex>,
    ) -> AppResult<(RowIndex, Map<String, Value>)> {
        let mut params = Map::new();
        let index = match target {
            Some(index) => {
                let group = self.saml_provision_groups.require(index)?;
                let usrgrpids: Vec<&str> = group
                    .user_groups()
                    .iter()
                    .map(|user_group| user_group.usrgrpid())
                    .collect();
                params.insert("usrgrpid".to_owned(), json!(usrgrpids));
                params.insert("roleid".to_owned(), json!(group.roleid()));
                params.insert("is_fallback".to_owned(), json!(group.kind().as_str()));
                if let Some(name) = group.name() {
                    params.insert("name".to_owned(), json!(name));
                }
                index
            }
            None => {
                params.insert("add_group".to_owned(), json!(1));
                params.insert("is_fallback".to_owned(), json!(GroupMappingKind::Regular.as_str()));
                self.saml_provision_groups.allocate_index()
            }
        };
        params.insert("idp_type".to_owned(), json!(IdpType::Saml.as_str()));
        Ok((index, params))
    }

    fn saml_media_editor_params(
        &self,
        target: Option<RowIndex>,
    ) -> AppResult<(RowIndex, Map<String, Value>)> {
        let mut params = Map::new();
        let index = match target {
            Some(index) => {
                let media = self.saml_provision_media.require(index)?;
                params.insert("name".to_owned(), json!(media.name()));
                params.insert("attribute".to_owned(), json!(media.attribute()));
                params.insert("mediatypeid".to_owned(), json!(media.mediatypeid()));
                index
            }
            None => {
                params.insert("add_media_type_mapping".to_owned(), json!(1));
                self.saml_provision_media.allocate_index()
            }
        };
        Ok((index, params))
    }
}

fn decode_payload<T>(kind: EditorKind, payload: Value) -> AppResult<T>
where
    T: DeserializeOwned,
{
    serde_json::from_value(payload).map_err(|error| {
        AppError::Validation(format!("invalid '{kind}' editor payload: {error}"))
    })
}

#[cfg(test)]
mod tests;

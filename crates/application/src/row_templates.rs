use authconsole_core::{AppError, AppResult};
use authconsole_domain::{FallbackStatus, FormField, ProvisionGroup, ProvisionMedia, RowIndex};
use handlebars::Handlebars;
use serde::Serialize;

use crate::form_codec::{
    encode_ldap_server, encode_saml_provision_group, encode_saml_provision_media,
};
use crate::ldap_server_table::LdapServerRow;

const LDAP_SERVER_ROW: &str = "ldap_server_row";
const SAML_GROUP_ROW: &str = "saml_provision_group_row";
const SAML_FALLBACK_ROW: &str = "saml_provision_fallback_row";
const SAML_MEDIA_ROW: &str = "saml_provision_media_row";

const HIDDEN_FIELDS: &str = r#"{{#each fields}}
		<input type="hidden" name="{{this.name}}" value="{{this.value}}">{{/each}}"#;

const LDAP_SERVER_ROW_TEMPLATE: &str = r#"<tr data-row_index="{{row_index}}">
	<td>
		<a href="javascript:void(0);" class="wordwrap js-edit">{{name}}</a>{{> hidden_fields}}
	</td>
	<td class="wordbreak">{{host}}</td>
	<td class="js-ldap-usergroups">{{usrgrps}}</td>
	<td>
		<input type="radio" class="radio-list-control" name="ldap_default_row_index" value="{{row_index}}"{{#if is_default}} checked{{/if}}>
	</td>
	<td>
		<button type="button" class="btn-link js-remove"{{#if remove_disabled}} disabled{{/if}}>{{remove_label}}</button>
	</td>
</tr>"#;

const SAML_GROUP_ROW_TEMPLATE: &str = r#"<tr data-row_index="{{row_index}}" class="sortable">
	<td class="td-drag-icon">
		<div class="drag-icon{{#if disabled}} disabled{{/if}}"></div>
	</td>
	<td>
		<a href="javascript:void(0);" class="wordwrap js-edit{{#if disabled}} disabled{{/if}}">{{name}}</a>{{> hidden_fields}}
	</td>
	<td class="wordbreak">{{user_group_names}}</td>
	<td class="wordbreak">{{role_name}}</td>
	<td>
		<button type="button" class="btn-link js-remove"{{#if disabled}} disabled{{/if}}>{{remove_label}}</button>
	</td>
</tr>"#;

const SAML_FALLBACK_ROW_TEMPLATE: &str = r#"<tr data-row_index="{{row_index}}" data-row_fallback="1">
	<td></td>
	<td>
		<a href="javascript:void(0);" class="wordwrap js-edit{{#if disabled}} disabled{{/if}}">{{name}}</a>{{> hidden_fields}}
	</td>
	<td class="wordbreak">{{user_group_names}}</td>
	<td class="wordbreak">{{role_name}}</td>
	<td>
		<button type="button" class="btn-link {{status_class}}"{{#if disabled}} disabled{{/if}}>{{status_label}}</button>
	</td>
</tr>"#;

const SAML_MEDIA_ROW_TEMPLATE: &str = r#"<tr data-row_index="{{row_index}}">
	<td>
		<a href="javascript:void(0);" class="wordwrap js-edit{{#if disabled}} disabled{{/if}}">{{name}}</a>{{> hidden_fields}}
	</td>
	<td class="wordbreak">{{mediatype_name}}</td>
	<td class="wordbreak">{{attribute}}</td>
	<td>
		<button type="button" class="btn-link js-remove"{{#if disabled}} disabled{{/if}}>{{remove_label}}</button>
	</td>
</tr>"#;

/// Visible texts used in rendered rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowLabels {
    /// Remove button caption.
    pub remove: String,
    /// Caption of an enabled fallback mapping toggle.
    pub enabled: String,
    /// Caption of a disabled fallback mapping toggle.
    pub disabled: String,
    /// Name shown for the fallback mapping.
    pub fallback_group: String,
}

impl Default for RowLabels {
    fn default() -> Self {
        Self {
            remove: "Remove".to_owned(),
            enabled: "Enabled".to_owned(),
            disabled: "Disabled".to_owned(),
            fallback_group: "Fallback group".to_owned(),
        }
    }
}

/// Rendered table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRow {
    row_index: RowIndex,
    html: String,
}

impl RenderedRow {
    /// Returns the row index the row was rendered for.
    #[must_use]
    pub fn row_index(&self) -> RowIndex {
        self.row_index
    }

    /// Returns the row markup.
    #[must_use]
    pub fn html(&self) -> &str {
        self.html.as_str()
    }
}

#[derive(Serialize)]
struct LdapServerRowContext<'a> {
    row_index: RowIndex,
    name: &'a str,
    host: &'a str,
    usrgrps: u32,
    is_default: bool,
    remove_disabled: bool,
    remove_label: &'a str,
    fields: Vec<FormField>,
}

#[derive(Serialize)]
struct SamlGroupRowContext<'a> {
    row_index: RowIndex,
    name: &'a str,
    user_group_names: String,
    role_name: &'a str,
    disabled: bool,
    remove_label: &'a str,
    status_class: &'static str,
    status_label: &'a str,
    fields: Vec<FormField>,
}

#[derive(Serialize)]
struct SamlMediaRowContext<'a> {
    row_index: RowIndex,
    name: &'a str,
    mediatype_name: &'a str,
    attribute: &'a str,
    disabled: bool,
    remove_label: &'a str,
    fields: Vec<FormField>,
}

/// Renders table rows from row records.
///
/// Every row embeds its record as hidden inputs produced by the form codec, so
/// the submitted body is always the encoding of the rows on screen. Values are
/// HTML-escaped; templates are strict, so a missing context value is an error.
#[derive(Debug, Clone)]
pub struct RowTemplates {
    registry: Handlebars<'static>,
    labels: RowLabels,
}

impl RowTemplates {
    /// Creates the renderer with default labels.
    pub fn new() -> AppResult<Self> {
        Self::with_labels(RowLabels::default())
    }

    /// Creates the renderer with custom labels.
    pub fn with_labels(labels: RowLabels) -> AppResult<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);

        for (name, template) in [
            ("hidden_fields", HIDDEN_FIELDS),
            (LDAP_SERVER_ROW, LDAP_SERVER_ROW_TEMPLATE),
            (SAML_GROUP_ROW, SAML_GROUP_ROW_TEMPLATE),
            (SAML_FALLBACK_ROW, SAML_FALLBACK_ROW_TEMPLATE),
            (SAML_MEDIA_ROW, SAML_MEDIA_ROW_TEMPLATE),
        ] {
            registry
                .register_template_string(name, template)
                .map_err(|error| {
                    AppError::Internal(format!("failed to register template '{name}': {error}"))
                })?;
        }

        Ok(Self { registry, labels })
    }

    /// Returns the labels in use.
    #[must_use]
    pub fn labels(&self) -> &RowLabels {
        &self.labels
    }

    /// Renders an LDAP server row. Removal is disabled while user groups
    /// still reference the server.
    pub fn render_ldap_server(
        &self,
        row_index: RowIndex,
        row: &LdapServerRow,
        is_default: bool,
    ) -> AppResult<RenderedRow> {
        let server = row.server();
        let context = LdapServerRowContext {
            row_index,
            name: server.name(),
            host: server.host(),
            usrgrps: row.usrgrps(),
            is_default,
            remove_disabled: !row.is_removable(),
            remove_label: self.labels.remove.as_str(),
            fields: encode_ldap_server(row_index, server),
        };

        self.render(LDAP_SERVER_ROW, row_index, &context)
    }

    /// Renders a SAML group mapping row, picking the fallback layout when
    /// the mapping is the fallback one.
    pub fn render_saml_provision_group(
        &self,
        row_index: RowIndex,
        group: &ProvisionGroup,
        disabled: bool,
    ) -> AppResult<RenderedRow> {
        let (template, name, status_class, status_label) = match group.fallback_status() {
            None => (SAML_GROUP_ROW, group.name().unwrap_or_default(), "", ""),
            Some(FallbackStatus::On) => (
                SAML_FALLBACK_ROW,
                self.labels.fallback_group.as_str(),
                "js-enabled green",
                self.labels.enabled.as_str(),
            ),
            Some(FallbackStatus::Off) => (
                SAML_FALLBACK_ROW,
                self.labels.fallback_group.as_str(),
                "js-disabled red",
                self.labels.disabled.as_str(),
            ),
        };

        let context = SamlGroupRowContext {
            row_index,
            name,
            user_group_names: group.user_group_names(),
            role_name: group.role_name().unwrap_or_default(),
            disabled,
            remove_label: self.labels.remove.as_str(),
            status_class,
            status_label,
            fields: encode_saml_provision_group(row_index, group),
        };

        self.render(template, row_index, &context)
    }

    /// Renders a SAML media type mapping row.
    pub fn render_saml_provision_media(
        &self,
        row_index: RowIndex,
        media: &ProvisionMedia,
        disabled: bool,
    ) -> AppResult<RenderedRow> {
        let context = SamlMediaRowContext {
            row_index,
            name: media.name(),
            mediatype_name: media.mediatype_name().unwrap_or(media.mediatypeid()),
            attribute: media.attribute(),
            disabled,
            remove_label: self.labels.remove.as_str(),
            fields: encode_saml_provision_media(row_index, media),
        };

        self.render(SAML_MEDIA_ROW, row_index, &context)
    }

    fn render<T>(&self, template: &str, row_index: RowIndex, context: &T) -> AppResult<RenderedRow>
    where
        T: Serialize,
    {
        let html = self.registry.render(template, context).map_err(|error| {
            AppError::Internal(format!("failed to render '{template}' row {row_index}: {error}"))
        })?;

        Ok(RenderedRow { row_index, html })
    }
}

use authconsole_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::provisioning::{ProvisionGroup, ProvisionMedia};
use crate::wire::{format_flag, lenient_optional_string, lenient_string, parse_flag};

/// Popup payload shape of an LDAP server.
///
/// Optional values are absent (not empty) when the corresponding input does
/// not exist; a missing `bind_password` means the secret must be re-entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LdapServerInput {
    /// Persisted user directory identifier.
    #[serde(
        default,
        deserialize_with = "lenient_optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub userdirectoryid: Option<String>,
    /// Server display name.
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    /// Server host or URI.
    #[serde(default, deserialize_with = "lenient_string")]
    pub host: String,
    /// Server port.
    #[serde(default, deserialize_with = "lenient_string")]
    pub port: String,
    /// Base DN.
    #[serde(default, deserialize_with = "lenient_string")]
    pub base_dn: String,
    /// Attribute used to look users up.
    #[serde(default, deserialize_with = "lenient_string")]
    pub search_attribute: String,
    /// Optional search filter.
    #[serde(
        default,
        deserialize_with = "lenient_optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub search_filter: Option<String>,
    /// Optional StartTLS flag.
    #[serde(
        default,
        deserialize_with = "lenient_optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_tls: Option<String>,
    /// Bind DN.
    #[serde(default, deserialize_with = "lenient_string")]
    pub bind_dn: String,
    /// Bind password, when entered in this session.
    #[serde(
        default,
        deserialize_with = "lenient_optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub bind_password: Option<String>,
    /// Free-form description.
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    /// JIT provisioning flag (`0`/`1`).
    #[serde(default, deserialize_with = "lenient_string")]
    pub provision_status: String,
    /// Group search base DN.
    #[serde(default, deserialize_with = "lenient_string")]
    pub group_basedn: String,
    /// Group name attribute.
    #[serde(default, deserialize_with = "lenient_string")]
    pub group_name: String,
    /// Group member attribute.
    #[serde(default, deserialize_with = "lenient_string")]
    pub group_member: String,
    /// Group search filter.
    #[serde(default, deserialize_with = "lenient_string")]
    pub group_filter: String,
    /// User group membership attribute.
    #[serde(default, deserialize_with = "lenient_string")]
    pub group_membership: String,
    /// User first-name attribute.
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_username: String,
    /// User last-name attribute.
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_lastname: String,
    /// Nested group mappings.
    #[serde(default)]
    pub provision_groups: Vec<ProvisionGroup>,
    /// Nested media type mappings.
    #[serde(default)]
    pub provision_media: Vec<ProvisionMedia>,
}

/// Validated LDAP server record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LdapServerInput", into = "LdapServerInput")]
pub struct LdapServer {
    userdirectoryid: Option<String>,
    name: NonEmptyString,
    host: NonEmptyString,
    port: u16,
    base_dn: NonEmptyString,
    search_attribute: NonEmptyString,
    search_filter: Option<String>,
    start_tls: Option<String>,
    bind_dn: String,
    bind_password: Option<String>,
    description: String,
    provision_status: bool,
    group_basedn: String,
    group_name: String,
    group_member: String,
    group_filter: String,
    group_membership: String,
    user_username: String,
    user_lastname: String,
    provision_groups: Vec<ProvisionGroup>,
    provision_media: Vec<ProvisionMedia>,
}

impl LdapServer {
    /// Flat fields in rendering order, excluding nested mappings.
    pub const SCALAR_FIELDS: [&'static str; 19] = [
        "userdirectoryid",
        "name",
        "host",
        "port",
        "base_dn",
        "search_attribute",
        "search_filter",
        "start_tls",
        "bind_dn",
        "bind_password",
        "description",
        "provision_status",
        "group_basedn",
        "group_name",
        "group_member",
        "group_filter",
        "group_membership",
        "user_username",
        "user_lastname",
    ];

    /// Creates a validated LDAP server.
    ///
    /// Nested group mappings are renumbered to their 1-based position.
    pub fn new(input: LdapServerInput) -> AppResult<Self> {
        let port = input.port.trim().parse::<u16>().map_err(|_| {
            AppError::Validation(format!("invalid LDAP port '{}'", input.port))
        })?;
        if port == 0 {
            return Err(AppError::Validation(
                "LDAP port must be greater than zero".to_owned(),
            ));
        }

        let mut provision_groups = input.provision_groups;
        let fallback_count = provision_groups
            .iter()
            .filter(|group| group.is_fallback())
            .count();
        if fallback_count > 1 {
            return Err(AppError::Validation(
                "LDAP server may define at most one fallback group mapping".to_owned(),
            ));
        }
        for (position, group) in provision_groups.iter_mut().enumerate() {
            group.set_sortorder(u32::try_from(position + 1).unwrap_or(u32::MAX));
        }

        Ok(Self {
            userdirectoryid: input
                .userdirectoryid
                .filter(|value| !value.trim().is_empty()),
            name: NonEmptyString::for_field("name", input.name)?,
            host: NonEmptyString::for_field("host", input.host)?,
            port,
            base_dn: NonEmptyString::for_field("base_dn", input.base_dn)?,
            search_attribute: NonEmptyString::for_field(
                "search_attribute",
                input.search_attribute,
            )?,
            search_filter: input.search_filter,
            start_tls: input.start_tls,
            bind_dn: input.bind_dn,
            bind_password: input.bind_password,
            description: input.description,
            provision_status: parse_flag(input.provision_status.as_str()),
            group_basedn: input.group_basedn,
            group_name: input.group_name,
            group_member: input.group_member,
            group_filter: input.group_filter,
            group_membership: input.group_membership,
            user_username: input.user_username,
            user_lastname: input.user_lastname,
            provision_groups,
            provision_media: input.provision_media,
        })
    }

    /// Returns the persisted user directory identifier.
    #[must_use]
    pub fn userdirectoryid(&self) -> Option<&str> {
        self.userdirectoryid.as_deref()
    }

    /// Returns the server display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the server host.
    #[must_use]
    pub fn host(&self) -> &str {
        self.host.as_str()
    }

    /// Returns the server port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns whether JIT provisioning is enabled.
    #[must_use]
    pub fn provision_status(&self) -> bool {
        self.provision_status
    }

    /// Returns whether a bind password is held for this server.
    #[must_use]
    pub fn has_bind_password(&self) -> bool {
        self.bind_password.is_some()
    }

    /// Returns nested group mappings.
    #[must_use]
    pub fn provision_groups(&self) -> &[ProvisionGroup] {
        &self.provision_groups
    }

    /// Returns nested media type mappings.
    #[must_use]
    pub fn provision_media(&self) -> &[ProvisionMedia] {
        &self.provision_media
    }

    /// Returns the value of a flat field; `None` for absent optional inputs.
    #[must_use]
    pub fn scalar(&self, field: &str) -> Option<String> {
        match field {
            "userdirectoryid" => self.userdirectoryid.clone(),
            "name" => Some(self.name.to_string()),
            "host" => Some(self.host.to_string()),
            "port" => Some(self.port.to_string()),
            "base_dn" => Some(self.base_dn.to_string()),
            "search_attribute" => Some(self.search_attribute.to_string()),
            "search_filter" => self.search_filter.clone(),
            "start_tls" => self.start_tls.clone(),
            "bind_dn" => Some(self.bind_dn.clone()),
            "bind_password" => self.bind_password.clone(),
            "description" => Some(self.description.clone()),
            "provision_status" => Some(format_flag(self.provision_status).to_owned()),
            "group_basedn" => Some(self.group_basedn.clone()),
            "group_name" => Some(self.group_name.clone()),
            "group_member" => Some(self.group_member.clone()),
            "group_filter" => Some(self.group_filter.clone()),
            "group_membership" => Some(self.group_membership.clone()),
            "user_username" => Some(self.user_username.clone()),
            "user_lastname" => Some(self.user_lastname.clone()),
            _ => None,
        }
    }

    /// Returns a copy without display-only values in nested mappings.
    #[must_use]
    pub fn without_display(&self) -> Self {
        Self {
            provision_groups: self
                .provision_groups
                .iter()
                .map(ProvisionGroup::without_display)
                .collect(),
            provision_media: self
                .provision_media
                .iter()
                .map(ProvisionMedia::without_display)
                .collect(),
            ..self.clone()
        }
    }
}

impl TryFrom<LdapServerInput> for LdapServer {
    type Error = AppError;

    fn try_from(value: LdapServerInput) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LdapServer> for LdapServerInput {
    fn from(value: LdapServer) -> Self {
        Self {
            userdirectoryid: value.userdirectoryid,
            name: value.name.into(),
            host: value.host.into(),
            port: value.port.to_string(),
            base_dn: value.base_dn.into(),
            search_attribute: value.search_attribute.into(),
            search_filter: value.search_filter,
            start_tls: value.start_tls,
            bind_dn: value.bind_dn,
            bind_password: value.bind_password,
            description: value.description,
            provision_status: format_flag(value.provision_status).to_owned(),
            group_basedn: value.group_basedn,
            group_name: value.group_name,
            group_member: value.group_member,
            group_filter: value.group_filter,
            group_membership: value.group_membership,
            user_username: value.user_username,
            user_lastname: value.user_lastname,
            provision_groups: value.provision_groups,
            provision_media: value.provision_media,
        }
    }
}

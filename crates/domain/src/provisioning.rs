//! Identity-provider provisioning mappings shared by SAML and LDAP settings.

use std::str::FromStr;

use authconsole_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::wire::{WireScalar, lenient_optional_string, lenient_string};

/// Whether a group mapping matches by name or applies when nothing matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "WireScalar", into = "u8")]
pub enum GroupMappingKind {
    /// Mapping applied when the IdP group name matches.
    #[default]
    Regular,
    /// Mapping applied when no regular mapping matches.
    Fallback,
}

impl GroupMappingKind {
    /// Returns the wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "0",
            Self::Fallback => "1",
        }
    }
}

impl FromStr for GroupMappingKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "0" => Ok(Self::Regular),
            "1" => Ok(Self::Fallback),
            _ => Err(AppError::Validation(format!(
                "unknown group mapping kind '{value}'"
            ))),
        }
    }
}

impl TryFrom<WireScalar> for GroupMappingKind {
    type Error = AppError;

    fn try_from(value: WireScalar) -> Result<Self, Self::Error> {
        value.into_text().parse()
    }
}

impl From<GroupMappingKind> for u8 {
    fn from(value: GroupMappingKind) -> Self {
        match value {
            GroupMappingKind::Regular => 0,
            GroupMappingKind::Fallback => 1,
        }
    }
}

/// Enabled state of the fallback group mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "WireScalar", into = "u8")]
pub enum FallbackStatus {
    /// Fallback mapping is not applied.
    #[default]
    Off,
    /// Fallback mapping is applied.
    On,
}

impl FallbackStatus {
    /// Returns the wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "0",
            Self::On => "1",
        }
    }
}

impl FromStr for FallbackStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "0" => Ok(Self::Off),
            "1" => Ok(Self::On),
            _ => Err(AppError::Validation(format!(
                "unknown fallback status '{value}'"
            ))),
        }
    }
}

impl TryFrom<WireScalar> for FallbackStatus {
    type Error = AppError;

    fn try_from(value: WireScalar) -> Result<Self, Self::Error> {
        value.into_text().parse()
    }
}

impl From<FallbackStatus> for u8 {
    fn from(value: FallbackStatus) -> Self {
        match value {
            FallbackStatus::Off => 0,
            FallbackStatus::On => 1,
        }
    }
}

/// Reference to a user group assigned by a mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UserGroupRefPayload")]
pub struct UserGroupRef {
    usrgrpid: NonEmptyString,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UserGroupRefPayload {
    Id(WireScalar),
    Object {
        #[serde(deserialize_with = "lenient_string")]
        usrgrpid: String,
        #[serde(default)]
        name: Option<String>,
    },
}

impl TryFrom<UserGroupRefPayload> for UserGroupRef {
    type Error = AppError;

    fn try_from(value: UserGroupRefPayload) -> Result<Self, Self::Error> {
        match value {
            UserGroupRefPayload::Id(id) => Self::new(id.into_text(), None),
            UserGroupRefPayload::Object { usrgrpid, name } => Self::new(usrgrpid, name),
        }
    }
}

impl UserGroupRef {
    /// Creates a user group reference; the name is display-only.
    pub fn new(usrgrpid: impl Into<String>, name: Option<String>) -> AppResult<Self> {
        Ok(Self {
            usrgrpid: NonEmptyString::for_field("usrgrpid", usrgrpid)?,
            name,
        })
    }

    /// Returns the user group identifier.
    #[must_use]
    pub fn usrgrpid(&self) -> &str {
        self.usrgrpid.as_str()
    }

    /// Returns the display name, if known.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Regular-versus-fallback specific part of a group mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupMappingRule {
    /// Matches IdP groups by name pattern.
    Regular {
        /// IdP group name pattern.
        name: NonEmptyString,
    },
    /// Applies when no regular mapping matches.
    Fallback {
        /// Whether the fallback applies.
        status: FallbackStatus,
    },
}

/// Popup payload shape of a group mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionGroupInput {
    /// IdP group name pattern; regular mappings only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Assigned user role.
    #[serde(deserialize_with = "lenient_string")]
    pub roleid: String,
    /// Role display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_name: Option<String>,
    /// Regular or fallback marker.
    #[serde(default)]
    pub is_fallback: GroupMappingKind,
    /// Fallback status; fallback mappings only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_status: Option<FallbackStatus>,
    /// Position among the mappings, 1-based.
    #[serde(
        default,
        deserialize_with = "lenient_optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub sortorder: Option<String>,
    /// Assigned user groups.
    #[serde(default)]
    pub user_groups: Vec<UserGroupRef>,
}

/// Validated group mapping: IdP group to user groups plus role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ProvisionGroupInput", into = "ProvisionGroupInput")]
pub struct ProvisionGroup {
    rule: GroupMappingRule,
    roleid: NonEmptyString,
    role_name: Option<String>,
    sortorder: u32,
    user_groups: Vec<UserGroupRef>,
}

impl ProvisionGroup {
    /// Creates a validated group mapping.
    pub fn new(input: ProvisionGroupInput) -> AppResult<Self> {
        let ProvisionGroupInput {
            name,
            roleid,
            role_name,
            is_fallback,
            fallback_status,
            sortorder,
            user_groups,
        } = input;

        let rule = match is_fallback {
            GroupMappingKind::Regular => GroupMappingRule::Regular {
                name: NonEmptyString::for_field("name", name.unwrap_or_default())?,
            },
            GroupMappingKind::Fallback => GroupMappingRule::Fallback {
                status: fallback_status.unwrap_or_default(),
            },
        };

        if user_groups.is_empty() {
            return Err(AppError::Validation(
                "group mapping must assign at least one user group".to_owned(),
            ));
        }

        let sortorder = match sortorder.as_deref().map(str::trim) {
            None | Some("") => 0,
            Some(value) => value.parse::<u32>().map_err(|_| {
                AppError::Validation(format!("invalid group mapping sortorder '{value}'"))
            })?,
        };

        Ok(Self {
            rule,
            roleid: NonEmptyString::for_field("roleid", roleid)?,
            role_name,
            sortorder,
            user_groups,
        })
    }

    /// Returns the regular/fallback rule.
    #[must_use]
    pub fn rule(&self) -> &GroupMappingRule {
        &self.rule
    }

    /// Returns the mapping kind.
    #[must_use]
    pub fn kind(&self) -> GroupMappingKind {
        match self.rule {
            GroupMappingRule::Regular { .. } => GroupMappingKind::Regular,
            GroupMappingRule::Fallback { .. } => GroupMappingKind::Fallback,
        }
    }

    /// Returns whether this is the fallback mapping.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.kind() == GroupMappingKind::Fallback
    }

    /// Returns the IdP group name pattern of a regular mapping.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match &self.rule {
            GroupMappingRule::Regular { name } => Some(name.as_str()),
            GroupMappingRule::Fallback { .. } => None,
        }
    }

    /// Returns the fallback status of a fallback mapping.
    #[must_use]
    pub fn fallback_status(&self) -> Option<FallbackStatus> {
        match self.rule {
            GroupMappingRule::Regular { .. } => None,
            GroupMappingRule::Fallback { status } => Some(status),
        }
    }

    /// Sets the fallback status. Regular mappings are left unchanged.
    pub fn set_fallback_status(&mut self, target: FallbackStatus) {
        if let GroupMappingRule::Fallback { status } = &mut self.rule {
            *status = target;
        }
    }

    /// Returns the assigned role identifier.
    #[must_use]
    pub fn roleid(&self) -> &str {
        self.roleid.as_str()
    }

    /// Returns the role display name, if known.
    #[must_use]
    pub fn role_name(&self) -> Option<&str> {
        self.role_name.as_deref()
    }

    /// Returns the 1-based sort position; zero when not yet placed.
    #[must_use]
    pub fn sortorder(&self) -> u32 {
        self.sortorder
    }

    /// Sets the sort position.
    pub fn set_sortorder(&mut self, sortorder: u32) {
        self.sortorder = sortorder;
    }

    /// Returns assigned user groups.
    #[must_use]
    pub fn user_groups(&self) -> &[UserGroupRef] {
        &self.user_groups
    }

    /// Returns user group display names joined for a table cell.
    #[must_use]
    pub fn user_group_names(&self) -> String {
        self.user_groups
            .iter()
            .map(|group| group.name().unwrap_or(group.usrgrpid()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Returns a copy without display-only values.
    #[must_use]
    pub fn without_display(&self) -> Self {
        Self {
            rule: self.rule.clone(),
            roleid: self.roleid.clone(),
            role_name: None,
            sortorder: self.sortorder,
            user_groups: self
                .user_groups
                .iter()
                .map(|group| UserGroupRef {
                    usrgrpid: group.usrgrpid.clone(),
                    name: None,
                })
                .collect(),
        }
    }
}

impl TryFrom<ProvisionGroupInput> for ProvisionGroup {
    type Error = AppError;

    fn try_from(value: ProvisionGroupInput) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProvisionGroup> for ProvisionGroupInput {
    fn from(value: ProvisionGroup) -> Self {
        let kind = value.kind();
        let (name, fallback_status) = match value.rule {
            GroupMappingRule::Regular { name } => (Some(String::from(name)), None),
            GroupMappingRule::Fallback { status } => (None, Some(status)),
        };

        Self {
            name,
            roleid: value.roleid.into(),
            role_name: value.role_name,
            is_fallback: kind,
            fallback_status,
            sortorder: (value.sortorder > 0).then(|| value.sortorder.to_string()),
            user_groups: value.user_groups,
        }
    }
}

/// Popup payload shape of a media type mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionMediaInput {
    /// Mapping name.
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    /// Target media type.
    #[serde(deserialize_with = "lenient_string")]
    pub mediatypeid: String,
    /// IdP attribute holding the send-to address.
    #[serde(deserialize_with = "lenient_string")]
    pub attribute: String,
    /// Media type display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mediatype_name: Option<String>,
}

/// Validated media type mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ProvisionMediaInput", into = "ProvisionMediaInput")]
pub struct ProvisionMedia {
    name: NonEmptyString,
    mediatypeid: NonEmptyString,
    attribute: NonEmptyString,
    mediatype_name: Option<String>,
}

impl ProvisionMedia {
    /// Creates a validated media type mapping.
    pub fn new(input: ProvisionMediaInput) -> AppResult<Self> {
        Ok(Self {
            name: NonEmptyString::for_field("name", input.name)?,
            mediatypeid: NonEmptyString::for_field("mediatypeid", input.mediatypeid)?,
            attribute: NonEmptyString::for_field("attribute", input.attribute)?,
            mediatype_name: input.mediatype_name,
        })
    }

    /// Returns the mapping name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the media type identifier.
    #[must_use]
    pub fn mediatypeid(&self) -> &str {
        self.mediatypeid.as_str()
    }

    /// Returns the IdP attribute name.
    #[must_use]
    pub fn attribute(&self) -> &str {
        self.attribute.as_str()
    }

    /// Returns the media type display name, if known.
    #[must_use]
    pub fn mediatype_name(&self) -> Option<&str> {
        self.mediatype_name.as_deref()
    }

    /// Returns a copy without display-only values.
    #[must_use]
    pub fn without_display(&self) -> Self {
        Self {
            mediatype_name: None,
            ..self.clone()
        }
    }
}

impl TryFrom<ProvisionMediaInput> for ProvisionMedia {
    type Error = AppError;

    fn try_from(value: ProvisionMediaInput) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProvisionMedia> for ProvisionMediaInput {
    fn from(value: ProvisionMedia) -> Self {
        Self {
            name: value.name.into(),
            mediatypeid: value.mediatypeid.into(),
            attribute: value.attribute.into(),
            mediatype_name: value.mediatype_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{FallbackStatus, GroupMappingKind, ProvisionGroup, ProvisionMedia};

    #[test]
    fn regular_mapping_requires_name() {
        let result = serde_json::from_value::<ProvisionGroup>(json!({
            "roleid": "3",
            "is_fallback": 0,
            "user_groups": [{"usrgrpid": "7", "name": "Admins"}]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn fallback_mapping_has_no_name_and_defaults_to_off() {
        let group: ProvisionGroup = serde_json::from_value(json!({
            "roleid": 3,
            "is_fallback": "1",
            "user_groups": ["7"]
        }))
        .unwrap_or_else(|_| unreachable!());

        assert_eq!(group.kind(), GroupMappingKind::Fallback);
        assert_eq!(group.name(), None);
        assert_eq!(group.fallback_status(), Some(FallbackStatus::Off));
        assert_eq!(group.user_groups()[0].usrgrpid(), "7");
    }

    #[test]
    fn mapping_requires_user_groups() {
        let result = serde_json::from_value::<ProvisionGroup>(json!({
            "name": "admins",
            "roleid": "3",
            "user_groups": []
        }));
        assert!(result.is_err());
    }

    #[test]
    fn user_group_names_fall_back_to_ids() {
        let group: ProvisionGroup = serde_json::from_value(json!({
            "name": "ops*",
            "roleid": "1",
            "user_groups": [{"usrgrpid": "7", "name": "Admins"}, "9"]
        }))
        .unwrap_or_else(|_| unreachable!());

        assert_eq!(group.user_group_names(), "Admins, 9");
    }

    #[test]
    fn set_fallback_status_ignores_regular_mappings() {
        let mut group: ProvisionGroup = serde_json::from_value(json!({
            "name": "ops*",
            "roleid": "1",
            "user_groups": ["9"]
        }))
        .unwrap_or_else(|_| unreachable!());

        group.set_fallback_status(FallbackStatus::On);
        assert_eq!(group.fallback_status(), None);
    }

    #[test]
    fn media_mapping_requires_all_fields() {
        let result = serde_json::from_value::<ProvisionMedia>(json!({
            "name": "Email",
            "mediatypeid": "1",
            "attribute": ""
        }));
        assert!(result.is_err());
    }

    #[test]
    fn media_display_name_is_optional() {
        let media: ProvisionMedia = serde_json::from_value(json!({
            "name": "Email",
            "mediatypeid": 1,
            "attribute": "mail",
            "mediatype_name": "Email (HTML)"
        }))
        .unwrap_or_else(|_| unreachable!());

        assert_eq!(media.mediatypeid(), "1");
        assert_eq!(media.without_display().mediatype_name(), None);
    }
}

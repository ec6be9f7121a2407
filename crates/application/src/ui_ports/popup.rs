use std::fmt::{Display, Formatter};

use async_trait::async_trait;
use authconsole_core::AppResult;
use serde_json::{Map, Value};

/// Modal editor kinds opened from the authentication form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EditorKind {
    /// LDAP server editor.
    LdapServer,
    /// SAML user group mapping editor.
    SamlProvisionGroup,
    /// SAML media type mapping editor.
    SamlProvisionMedia,
}

impl EditorKind {
    /// Returns the server action rendering the editor.
    #[must_use]
    pub fn action(&self) -> &'static str {
        match self {
            Self::LdapServer => "popup.ldap.edit",
            Self::SamlProvisionGroup => "popup.usergroupmapping.edit",
            Self::SamlProvisionMedia => "popup.mediatypemapping.edit",
        }
    }

    /// Returns the dialogue identifier of the editor.
    #[must_use]
    pub fn dialogue_id(&self) -> &'static str {
        match self {
            Self::LdapServer => "ldap_edit",
            Self::SamlProvisionGroup => "user_group_edit",
            Self::SamlProvisionMedia => "media_type_mapping_edit",
        }
    }
}

impl Display for EditorKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.dialogue_id())
    }
}

/// Request to open one modal editor.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupRequest {
    /// Editor to open.
    pub kind: EditorKind,
    /// Seed parameters for the editor form.
    pub params: Map<String, Value>,
}

/// Port for modal editors.
#[async_trait]
pub trait PopupHost: Send + Sync {
    /// Opens an editor and waits for it to close.
    ///
    /// Returns the submitted payload, or `None` when the editor was dismissed.
    async fn open(&self, request: PopupRequest) -> AppResult<Option<Value>>;
}

use std::str::FromStr;

use authconsole_core::AppError;
use serde::{Deserialize, Serialize};

use crate::wire::WireScalar;

/// Default authentication method of the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireScalar", into = "u8")]
pub enum AuthenticationType {
    /// Internal user database.
    Internal,
    /// LDAP directory.
    Ldap,
}

impl AuthenticationType {
    /// Returns the wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internal => "0",
            Self::Ldap => "1",
        }
    }
}

impl FromStr for AuthenticationType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "0" => Ok(Self::Internal),
            "1" => Ok(Self::Ldap),
            _ => Err(AppError::Validation(format!(
                "unknown authentication type '{value}'"
            ))),
        }
    }
}

impl TryFrom<WireScalar> for AuthenticationType {
    type Error = AppError;

    fn try_from(value: WireScalar) -> Result<Self, Self::Error> {
        value.into_text().parse()
    }
}

impl From<AuthenticationType> for u8 {
    fn from(value: AuthenticationType) -> Self {
        match value {
            AuthenticationType::Internal => 0,
            AuthenticationType::Ldap => 1,
        }
    }
}

/// Identity provider family a mapping editor is opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdpType {
    /// LDAP directory.
    Ldap,
    /// SAML identity provider.
    Saml,
}

impl IdpType {
    /// Returns the wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ldap => "1",
            Self::Saml => "2",
        }
    }
}

/// Settings whose values are trimmed before the form is submitted.
pub const TRIMMED_SETTINGS: [&str; 7] = [
    "http_strip_domains",
    "saml_idp_entityid",
    "saml_sso_url",
    "saml_slo_url",
    "saml_username_attribute",
    "saml_sp_entityid",
    "saml_nameid_format",
];

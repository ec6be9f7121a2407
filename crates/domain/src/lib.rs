//! Domain records and invariants of the authentication settings form.

#![forbid(unsafe_code)]

mod authentication;
mod field_path;
mod form_fields;
mod ldap;
mod provisioning;
mod response;
mod row_index;
pub mod wire;

pub use authentication::{AuthenticationType, IdpType, TRIMMED_SETTINGS};
pub use field_path::{FieldPath, PathSegment};
pub use form_fields::{FormField, FormFieldTree};
pub use ldap::{LdapServer, LdapServerInput};
pub use provisioning::{
    FallbackStatus, GroupMappingKind, GroupMappingRule, ProvisionGroup, ProvisionGroupInput,
    ProvisionMedia, ProvisionMediaInput, UserGroupRef,
};
pub use response::{MessageBox, MessageKind, ServerResponse, UNEXPECTED_SERVER_ERROR};
pub use row_index::{RowIndex, allocate_row_index};

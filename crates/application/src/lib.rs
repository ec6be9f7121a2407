//! Table synchronization, rendering, and page services of the
//! authentication settings form.

#![forbid(unsafe_code)]

mod authentication_form;
mod authentication_form_service;
mod editable_table;
pub mod form_codec;
mod ldap_server_table;
mod list_page_service;
mod popup_mediator;
mod row_templates;
mod saml_group_table;
mod saml_media_table;
mod ui_ports;

pub use authentication_form::{
    AuthenticationForm, AuthenticationPageData, EditTicket, EditorSession, RenderedTables,
    SWITCH_AUTHENTICATION_WARNING, SubmitCheck,
};
pub use authentication_form_service::{AuthenticationFormService, SubmitOutcome};
pub use editable_table::EditableTable;
pub use form_codec::DecodedAuthenticationForm;
pub use ldap_server_table::{InitialLdapServer, LdapServerRow, LdapServerTable};
pub use list_page_service::{
    DELETE_ACTIONS_CONFIRMATION, ListPageService, MassDeleteRequest, PageOutcome,
};
pub use popup_mediator::PopupMediator;
pub use row_templates::{RenderedRow, RowLabels, RowTemplates};
pub use saml_group_table::SamlProvisionGroupTable;
pub use saml_media_table::SamlProvisionMediaTable;
pub use ui_ports::{ConfirmPrompt, EditorKind, PopupHost, PopupRequest, ServerGateway, ServerRequest};

use authconsole_core::AppError;
use authconsole_domain::{AuthenticationType, FallbackStatus, RowIndex};
use serde_json::{Value, json};

use crate::form_codec::decode_authentication_form;
use crate::row_templates::RowTemplates;
use crate::ui_ports::EditorKind;

use super::{AuthenticationForm, AuthenticationPageData};

fn ldap_server(name: &str, userdirectoryid: &str, usrgrps: u32) -> Value {
    json!({
        "userdirectoryid": userdirectoryid,
        "name": name,
        "host": format!("{name}.example.com"),
        "port": 389,
        "base_dn": "dc=example,dc=com",
        "search_attribute": "uid",
        "search_filter": "",
        "start_tls": "0",
        "bind_dn": "cn=reader",
        "description": "",
        "provision_status": "0",
        "group_basedn": "",
        "group_name": "",
        "group_member": "",
        "group_filter": "",
        "group_membership": "",
        "user_username": "",
        "user_lastname": "",
        "provision_groups": [],
        "provision_media": [],
        "usrgrps": usrgrps
    })
}

fn page_data() -> AuthenticationPageData {
    serde_json::from_value(json!({
        "ldap_servers": [
            ldap_server("corp", "11", 0),
            ldap_server("branch", "12", 0),
            ldap_server("legacy", "13", 3)
        ],
        "ldap_default_row_index": 0,
        "db_authentication_type": 1,
        "saml_auth_enabled": 1,
        "saml_provision_status": "1",
        "saml_provision_groups": [
            {
                "roleid": "2",
                "is_fallback": 1,
                "fallback_status": 1,
                "user_groups": [{"usrgrpid": "8", "name": "Guests"}]
            },
            {
                "name": "admins",
                "roleid": "3",
                "role_name": "Super admin role",
                "is_fallback": 0,
                "user_groups": [{"usrgrpid": "7", "name": "Zabbix administrators"}]
            },
            {
                "name": "ops",
                "roleid": "1",
                "is_fallback": 0,
                "user_groups": [{"usrgrpid": "9", "name": "Operators"}]
            }
        ],
        "saml_provision_media": [
            {"name": "Email", "mediatypeid": "1", "attribute": "mail", "mediatype_name": "Email"}
        ],
        "settings": {
            "http_auth_enabled": "0",
            "http_strip_domains": "  example.com ",
            "saml_sso_url": " https://idp.example.com/sso ",
            "authentication_type": "0"
        }
    }))
    .unwrap_or_else(|_| unreachable!())
}

fn form() -> AuthenticationForm {
    AuthenticationForm::new(page_data()).unwrap_or_else(|_| unreachable!())
}

fn sortorders(form: &AuthenticationForm) -> Vec<(u32, u32)> {
    form.saml_provision_groups()
        .iter()
        .map(|(index, group)| (index.value(), group.sortorder()))
        .collect()
}

fn regular_group(name: &str) -> Value {
    json!({
        "name": name,
        "roleid": "4",
        "role_name": "User role",
        "is_fallback": "0",
        "user_groups": [{"usrgrpid": "15", "name": "Developers"}]
    })
}

#[test]
fn page_load_pins_fallback_last_and_numbers_rows() {
    let form = form();

    assert_eq!(sortorders(&form), vec![(1, 1), (2, 2), (0, 3)]);
    assert_eq!(form.ldap_servers().default_row(), Some(RowIndex::new(0)));
    assert!(form.jit_provisioning_visible());
    assert_eq!(form.authentication_type(), AuthenticationType::Ldap);
    assert_eq!(form.setting("authentication_type"), None);
}

#[test]
fn added_group_lands_before_fallback() {
    let mut form = form();

    let session = form
        .begin_edit(EditorKind::SamlProvisionGroup, None)
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(session.params.get("add_group"), Some(&json!(1)));
    assert_eq!(session.params.get("idp_type"), Some(&json!("2")));
    assert_eq!(session.ticket.row_index(), RowIndex::new(3));

    let index = form
        .complete_edit(session.ticket, regular_group("devs"))
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(index, RowIndex::new(3));
    assert_eq!(sortorders(&form), vec![(1, 1), (2, 2), (3, 3), (0, 4)]);
}

#[test]
fn edited_group_keeps_bookkeeping() {
    let mut form = form();

    let session = form
        .begin_edit(EditorKind::SamlProvisionGroup, Some(RowIndex::new(0)))
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(session.params.get("usrgrpid"), Some(&json!(["8"])));
    assert_eq!(session.params.get("is_fallback"), Some(&json!("1")));
    assert!(session.params.get("name").is_none());

    let payload = json!({
        "roleid": "5",
        "is_fallback": 1,
        "user_groups": [{"usrgrpid": "8"}, {"usrgrpid": "21"}]
    });
    form.complete_edit(session.ticket, payload)
        .unwrap_or_else(|_| unreachable!());

    let fallback = form
        .saml_provision_groups()
        .require(RowIndex::new(0))
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(fallback.roleid(), "5");
    assert_eq!(fallback.sortorder(), 3);
    assert_eq!(fallback.fallback_status(), Some(FallbackStatus::On));
}

#[test]
fn stale_ticket_is_rejected_without_mutation() {
    let mut form = form();

    let session = form
        .begin_edit(EditorKind::SamlProvisionMedia, Some(RowIndex::new(0)))
        .unwrap_or_else(|_| unreachable!());
    form.remove_saml_provision_media(RowIndex::new(0))
        .unwrap_or_else(|_| unreachable!());

    let result = form.complete_edit(
        session.ticket,
        json!({"name": "SMS", "mediatypeid": "3", "attribute": "mobile"}),
    );

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert!(form.saml_provision_media().is_empty());
}

#[test]
fn disabled_saml_tables_reject_edits() {
    let mut form = form();
    form.set_saml_enabled(false);

    assert!(matches!(
        form.begin_edit(EditorKind::SamlProvisionGroup, None),
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        form.toggle_fallback_status(FallbackStatus::Off),
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        form.reorder_saml_provision_groups(&[RowIndex::new(2), RowIndex::new(1)]),
        Err(AppError::Forbidden(_))
    ));
    assert!(form.begin_edit(EditorKind::LdapServer, None).is_ok());
    assert_eq!(sortorders(&form), vec![(1, 1), (2, 2), (0, 3)]);
}

#[test]
fn removed_ldap_index_is_reused_by_next_add() {
    let mut form = form();

    form.remove_ldap_server(RowIndex::new(1))
        .unwrap_or_else(|_| unreachable!());
    let session = form
        .begin_edit(EditorKind::LdapServer, None)
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(session.params.get("row_index"), Some(&json!(1)));
    assert_eq!(session.params.get("add_ldap_server"), Some(&json!(1)));

    let index = form
        .complete_edit(session.ticket, ldap_server("new", "", 0))
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(index, RowIndex::new(1));
    assert_eq!(
        form.ldap_servers()
            .require(index)
            .map(|row| row.usrgrps())
            .unwrap_or(u32::MAX),
        0
    );
}

#[test]
fn ldap_server_in_use_cannot_be_removed() {
    let mut form = form();

    let result = form.remove_ldap_server(RowIndex::new(2));

    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert_eq!(form.ldap_servers().len(), 3);
}

#[test]
fn removing_default_ldap_server_promotes_first_remaining() {
    let mut form = form();

    form.remove_ldap_server(RowIndex::new(0))
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(form.ldap_servers().default_row(), Some(RowIndex::new(1)));
    let fields = form.form_fields();
    assert!(fields.iter().any(|field| {
        field.name() == "ldap_removed_userdirectoryids[]" && field.value() == "11"
    }));
    assert!(
        fields
            .iter()
            .any(|field| field.name() == "ldap_default_row_index" && field.value() == "1")
    );
}

#[test]
fn ldap_edit_params_are_seeded_from_the_model() {
    let form = form();

    let session = form
        .begin_edit(EditorKind::LdapServer, Some(RowIndex::new(1)))
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(session.params.get("name"), Some(&json!("branch")));
    assert_eq!(session.params.get("userdirectoryid"), Some(&json!("12")));
    assert_eq!(session.params.get("add_ldap_server"), Some(&json!(0)));
    assert!(session.params.get("bind_password").is_none());
}

#[test]
fn submit_trims_settings_and_asks_before_switching() {
    let mut form = form();

    assert!(!form.prepare_submit().requires_confirmation);
    assert_eq!(form.setting("http_strip_domains"), Some("example.com"));
    assert_eq!(form.setting("saml_sso_url"), Some("https://idp.example.com/sso"));

    form.set_authentication_type(AuthenticationType::Internal);
    assert!(form.prepare_submit().requires_confirmation);
}

#[test]
fn form_fields_decode_back_to_the_tables() {
    let mut form = form();
    form.reorder_saml_provision_groups(&[RowIndex::new(2), RowIndex::new(1)])
        .unwrap_or_else(|_| unreachable!());

    let fields = form.form_fields();
    let decoded = decode_authentication_form(&fields).unwrap_or_else(|_| unreachable!());

    let groups: Vec<_> = form
        .saml_provision_groups()
        .iter()
        .map(|(index, group)| (index, group.without_display()))
        .collect();
    let servers: Vec<_> = form
        .ldap_servers()
        .iter()
        .map(|(index, row)| (index, row.server().without_display()))
        .collect();

    assert_eq!(decoded.saml_provision_groups, groups);
    assert_eq!(decoded.ldap_servers, servers);
    assert_eq!(decoded.ldap_default_row_index, Some(RowIndex::new(0)));
    assert!(
        fields
            .iter()
            .all(|field| field.name() != "http_strip_domains")
    );
    assert!(
        fields
            .iter()
            .any(|field| field.name() == "saml_auth_enabled" && field.value() == "1")
    );
}

#[test]
fn fallback_toggle_is_idempotent() {
    let mut form = form();

    form.toggle_fallback_status(FallbackStatus::Off)
        .unwrap_or_else(|_| unreachable!());
    let once = form.form_fields();
    form.toggle_fallback_status(FallbackStatus::Off)
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(form.form_fields(), once);
    assert_eq!(
        form.saml_provision_groups().fallback_status().ok(),
        Some(FallbackStatus::Off)
    );
}

#[test]
fn rendered_tables_follow_display_order() {
    let mut form = form();
    form.set_saml_enabled(false);
    let templates = RowTemplates::new().unwrap_or_else(|_| unreachable!());

    let tables = form.render(&templates).unwrap_or_else(|_| unreachable!());

    let group_rows: Vec<u32> = tables
        .saml_provision_groups
        .iter()
        .map(|row| row.row_index().value())
        .collect();
    assert_eq!(group_rows, vec![1, 2, 0]);
    assert!(tables.saml_provision_groups[2].html().contains("data-row_fallback"));
    assert!(tables.saml_provision_media[0].html().contains(" disabled"));
    assert_eq!(tables.ldap_servers.len(), 3);
}

#[test]
fn owned_inputs_cannot_be_set_as_settings() {
    let mut form = form();

    assert!(matches!(
        form.set_setting("saml_auth_enabled", "0"),
        Err(AppError::Validation(_))
    ));
    assert!(form.set_setting("saml_idp_entityid", "urn:idp").is_ok());
    assert_eq!(form.setting("saml_idp_entityid"), Some("urn:idp"));
}

#[test]
fn edit_of_removed_row_does_not_touch_a_row_reusing_its_index() {
    let mut form = form();

    let stale = form
        .begin_edit(EditorKind::LdapServer, Some(RowIndex::new(1)))
        .unwrap_or_else(|_| unreachable!());
    form.remove_ldap_server(RowIndex::new(1))
        .unwrap_or_else(|_| unreachable!());
    let add = form
        .begin_edit(EditorKind::LdapServer, None)
        .unwrap_or_else(|_| unreachable!());
    let added = form
        .complete_edit(add.ticket, ldap_server("replacement", "", 0))
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(added, RowIndex::new(1));

    let result = form.complete_edit(stale.ticket, ldap_server("stale", "12", 0));

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert_eq!(
        form.ldap_servers()
            .require(RowIndex::new(1))
            .map(|row| row.server().name().to_owned())
            .ok(),
        Some("replacement".to_owned())
    );
}

#[test]
fn disabled_saml_settings_are_not_submitted() {
    let mut form = form();
    form.set_saml_enabled(false);

    let fields = form.form_fields();

    assert!(fields.iter().all(|field| {
        !matches!(
            field.name(),
            "saml_sso_url" | "saml_auth_enabled" | "saml_provision_status"
        )
    }));
    assert!(
        fields
            .iter()
            .any(|field| field.name().starts_with("saml_provision_groups["))
    );
}

#[test]
fn http_settings_follow_the_http_checkbox() {
    let mut form = form();

    let unchecked = form.form_fields();
    assert!(
        unchecked
            .iter()
            .all(|field| !field.name().starts_with("http_"))
    );

    form.set_setting("http_auth_enabled", "1")
        .unwrap_or_else(|_| unreachable!());
    let checked = form.form_fields();
    assert!(
        checked
            .iter()
            .any(|field| field.name() == "http_auth_enabled" && field.value() == "1")
    );
    assert!(
        checked
            .iter()
            .any(|field| field.name() == "http_strip_domains")
    );
}

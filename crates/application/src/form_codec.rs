//! Row records to bracketed form fields and back.
//!
//! Encoding produces exactly the hidden inputs a row carries, so the rendered
//! HTML and the submitted body share one source. Decoding reads the keyed
//! [`FormFieldTree`] instead of slicing field names.

use authconsole_core::{AppError, AppResult};
use authconsole_domain::{
    FallbackStatus, FieldPath, FormField, FormFieldTree, GroupMappingKind, LdapServer,
    LdapServerInput, ProvisionGroup, ProvisionGroupInput, ProvisionMedia, ProvisionMediaInput,
    RowIndex, UserGroupRef,
};

/// Root name of the LDAP server table fields.
pub const LDAP_SERVERS: &str = "ldap_servers";
/// Root name of the SAML provision group table fields.
pub const SAML_PROVISION_GROUPS: &str = "saml_provision_groups";
/// Root name of the SAML provision media table fields.
pub const SAML_PROVISION_MEDIA: &str = "saml_provision_media";
/// Field holding the default LDAP server row index.
pub const LDAP_DEFAULT_ROW_INDEX: &str = "ldap_default_row_index";
/// Field list of persisted LDAP servers removed in this session.
pub const LDAP_REMOVED_USERDIRECTORYIDS: &str = "ldap_removed_userdirectoryids";

/// Encodes one LDAP server row including its nested mappings.
#[must_use]
pub fn encode_ldap_server(row_index: RowIndex, server: &LdapServer) -> Vec<FormField> {
    let base = FieldPath::row(LDAP_SERVERS, row_index);
    let mut fields: Vec<FormField> = LdapServer::SCALAR_FIELDS
        .iter()
        .filter_map(|field| {
            server
                .scalar(field)
                .map(|value| FormField::new(&base.clone().key(*field), value))
        })
        .collect();

    for (position, group) in (0_u32..).zip(server.provision_groups()) {
        let path = base.clone().key("provision_groups").index(position);
        fields.extend(encode_group_fields(&path, group));
    }

    for (position, media) in (0_u32..).zip(server.provision_media()) {
        let path = base.clone().key("provision_media").index(position);
        fields.extend(encode_media_fields(&path, media));
    }

    fields
}

/// Encodes one SAML provision group row.
#[must_use]
pub fn encode_saml_provision_group(row_index: RowIndex, group: &ProvisionGroup) -> Vec<FormField> {
    encode_group_fields(&FieldPath::row(SAML_PROVISION_GROUPS, row_index), group)
}

/// Encodes one SAML provision media row.
#[must_use]
pub fn encode_saml_provision_media(row_index: RowIndex, media: &ProvisionMedia) -> Vec<FormField> {
    encode_media_fields(&FieldPath::row(SAML_PROVISION_MEDIA, row_index), media)
}

fn encode_group_fields(base: &FieldPath, group: &ProvisionGroup) -> Vec<FormField> {
    let mut fields = Vec::with_capacity(4 + group.user_groups().len());

    if let Some(name) = group.name() {
        fields.push(FormField::new(&base.clone().key("name"), name));
    }
    fields.push(FormField::new(&base.clone().key("roleid"), group.roleid()));
    fields.push(FormField::new(
        &base.clone().key("is_fallback"),
        group.kind().as_str(),
    ));
    if let Some(status) = group.fallback_status() {
        fields.push(FormField::new(
            &base.clone().key("fallback_status"),
            status.as_str(),
        ));
    }
    fields.push(FormField::new(
        &base.clone().key("sortorder"),
        group.sortorder().to_string(),
    ));

    for user_group in group.user_groups() {
        let path = base.clone().key("user_groups").append().key("usrgrpid");
        fields.push(FormField::new(&path, user_group.usrgrpid()));
    }

    fields
}

fn encode_media_fields(base: &FieldPath, media: &ProvisionMedia) -> Vec<FormField> {
    vec![
        FormField::new(&base.clone().key("name"), media.name()),
        FormField::new(&base.clone().key("mediatypeid"), media.mediatypeid()),
        FormField::new(&base.clone().key("attribute"), media.attribute()),
    ]
}

/// Rebuilds an LDAP server from its row node.
pub fn extract_ldap_server(node: &FormFieldTree) -> AppResult<LdapServer> {
    const CONTEXT: &str = "LDAP server row";

    let required = |field: &str| node.required_text(field, CONTEXT);
    let optional = |field: &str| node.text(field).map(str::to_owned);

    let mut input = LdapServerInput {
        userdirectoryid: optional("userdirectoryid"),
        name: required("name")?,
        host: required("host")?,
        port: required("port")?,
        base_dn: required("base_dn")?,
        search_attribute: required("search_attribute")?,
        search_filter: optional("search_filter"),
        start_tls: optional("start_tls"),
        bind_dn: required("bind_dn")?,
        bind_password: optional("bind_password"),
        description: required("description")?,
        provision_status: required("provision_status")?,
        group_basedn: required("group_basedn")?,
        group_name: required("group_name")?,
        group_member: required("group_member")?,
        group_filter: required("group_filter")?,
        group_membership: required("group_membership")?,
        user_username: required("user_username")?,
        user_lastname: required("user_lastname")?,
        provision_groups: Vec::new(),
        provision_media: Vec::new(),
    };

    if let Some(groups) = node.child("provision_groups") {
        input.provision_groups = groups
            .indexed()
            .map(|(_, group)| extract_provision_group(group))
            .collect::<AppResult<_>>()?;
    }
    if let Some(media) = node.child("provision_media") {
        input.provision_media = media
            .indexed()
            .map(|(_, media)| extract_provision_media(media))
            .collect::<AppResult<_>>()?;
    }

    LdapServer::new(input)
}

/// Rebuilds a group mapping from its row node.
pub fn extract_provision_group(node: &FormFieldTree) -> AppResult<ProvisionGroup> {
    const CONTEXT: &str = "group mapping row";

    let is_fallback = node
        .required_text("is_fallback", CONTEXT)?
        .parse::<GroupMappingKind>()?;
    let fallback_status = node
        .text("fallback_status")
        .map(str::parse::<FallbackStatus>)
        .transpose()?;
    let user_groups = node
        .child("user_groups")
        .map(|groups| {
            groups
                .indexed()
                .filter_map(|(_, group)| group.text("usrgrpid"))
                .map(|usrgrpid| UserGroupRef::new(usrgrpid, None))
                .collect::<AppResult<Vec<_>>>()
        })
        .transpose()?
        .unwrap_or_default();

    ProvisionGroup::new(ProvisionGroupInput {
        name: node.text("name").map(str::to_owned),
        roleid: node.required_text("roleid", CONTEXT)?,
        role_name: None,
        is_fallback,
        fallback_status,
        sortorder: node.text("sortorder").map(str::to_owned),
        user_groups,
    })
}

/// Rebuilds a media type mapping from its row node.
pub fn extract_provision_media(node: &FormFieldTree) -> AppResult<ProvisionMedia> {
    const CONTEXT: &str = "media type mapping row";

    ProvisionMedia::new(ProvisionMediaInput {
        name: node.required_text("name", CONTEXT)?,
        mediatypeid: node.required_text("mediatypeid", CONTEXT)?,
        attribute: node.required_text("attribute", CONTEXT)?,
        mediatype_name: None,
    })
}

/// Table rows and bookkeeping decoded from a submitted authentication form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedAuthenticationForm {
    /// LDAP servers by row index.
    pub ldap_servers: Vec<(RowIndex, LdapServer)>,
    /// Selected default LDAP server row.
    pub ldap_default_row_index: Option<RowIndex>,
    /// Persisted LDAP servers removed in this session.
    pub ldap_removed_userdirectoryids: Vec<String>,
    /// SAML group mappings ordered by sortorder.
    pub saml_provision_groups: Vec<(RowIndex, ProvisionGroup)>,
    /// SAML media type mappings by row index.
    pub saml_provision_media: Vec<(RowIndex, ProvisionMedia)>,
}

/// Decodes table rows from a submitted authentication form.
///
/// Unrelated fields are ignored.
pub fn decode_authentication_form(fields: &[FormField]) -> AppResult<DecodedAuthenticationForm> {
    let tree = FormFieldTree::from_fields(fields)?;

    let ldap_servers = decode_rows(&tree, LDAP_SERVERS, extract_ldap_server)?;
    let mut saml_provision_groups =
        decode_rows(&tree, SAML_PROVISION_GROUPS, extract_provision_group)?;
    saml_provision_groups.sort_by_key(|(index, group)| (group.sortorder(), *index));
    let saml_provision_media = decode_rows(&tree, SAML_PROVISION_MEDIA, extract_provision_media)?;

    let ldap_default_row_index = tree
        .text(LDAP_DEFAULT_ROW_INDEX)
        .filter(|value| !value.trim().is_empty())
        .map(str::parse::<RowIndex>)
        .transpose()?;

    let ldap_removed_userdirectoryids = tree
        .child(LDAP_REMOVED_USERDIRECTORYIDS)
        .map(|removed| {
            removed
                .indexed()
                .filter_map(|(_, node)| node.value())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();

    Ok(DecodedAuthenticationForm {
        ldap_servers,
        ldap_default_row_index,
        ldap_removed_userdirectoryids,
        saml_provision_groups,
        saml_provision_media,
    })
}

fn decode_rows<R>(
    tree: &FormFieldTree,
    table: &str,
    extract: fn(&FormFieldTree) -> AppResult<R>,
) -> AppResult<Vec<(RowIndex, R)>> {
    let Some(rows) = tree.child(table) else {
        return Ok(Vec::new());
    };

    rows.indexed()
        .map(|(index, node)| {
            extract(node)
                .map(|row| (RowIndex::new(index), row))
                .map_err(|error| match error {
                    AppError::Validation(message) => {
                        AppError::Validation(format!("{table}[{index}]: {message}"))
                    }
                    other => other,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use authconsole_domain::{
        FallbackStatus, FormField, FormFieldTree, GroupMappingKind, LdapServer, LdapServerInput,
        ProvisionGroup, ProvisionGroupInput, ProvisionMedia, ProvisionMediaInput, RowIndex,
        UserGroupRef,
    };

    use super::{
        LDAP_DEFAULT_ROW_INDEX, decode_authentication_form, encode_ldap_server,
        encode_saml_provision_group, encode_saml_provision_media, extract_ldap_server,
        extract_provision_group,
    };

    fn group(name: Option<&str>, kind: GroupMappingKind, sortorder: u32) -> ProvisionGroup {
        ProvisionGroup::new(ProvisionGroupInput {
            name: name.map(str::to_owned),
            roleid: "3".to_owned(),
            role_name: Some("Super admin role".to_owned()),
            is_fallback: kind,
            fallback_status: (kind == GroupMappingKind::Fallback).then_some(FallbackStatus::On),
            sortorder: Some(sortorder.to_string()),
            user_groups: vec![
                UserGroupRef::new("7", Some("Zabbix administrators".to_owned()))
                    .unwrap_or_else(|_| unreachable!()),
                UserGroupRef::new("12", None).unwrap_or_else(|_| unreachable!()),
            ],
        })
        .unwrap_or_else(|_| unreachable!())
    }

    fn media() -> ProvisionMedia {
        ProvisionMedia::new(ProvisionMediaInput {
            name: "Email".to_owned(),
            mediatypeid: "1".to_owned(),
            attribute: "mail".to_owned(),
            mediatype_name: Some("Email (HTML)".to_owned()),
        })
        .unwrap_or_else(|_| unreachable!())
    }

    fn ldap_server() -> LdapServer {
        LdapServer::new(LdapServerInput {
            userdirectoryid: Some("4".to_owned()),
            name: "corp".to_owned(),
            host: "ldap://corp.example.com".to_owned(),
            port: "389".to_owned(),
            base_dn: "dc=example,dc=com".to_owned(),
            search_attribute: "uid".to_owned(),
            bind_dn: "cn=admin".to_owned(),
            provision_status: "1".to_owned(),
            group_name: "cn".to_owned(),
            provision_groups: vec![
                group(Some("ops*"), GroupMappingKind::Regular, 0),
                group(None, GroupMappingKind::Fallback, 0),
            ],
            provision_media: vec![media()],
            ..LdapServerInput::default()
        })
        .unwrap_or_else(|_| unreachable!())
    }

    fn tree(fields: &[FormField]) -> FormFieldTree {
        FormFieldTree::from_fields(fields).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn saml_group_fields_use_bracketed_names() {
        let fields = encode_saml_provision_group(
            RowIndex::new(2),
            &group(Some("devs"), GroupMappingKind::Regular, 1),
        );
        let names: Vec<(&str, &str)> = fields
            .iter()
            .map(|field| (field.name(), field.value()))
            .collect();

        assert_eq!(
            names,
            vec![
                ("saml_provision_groups[2][name]", "devs"),
                ("saml_provision_groups[2][roleid]", "3"),
                ("saml_provision_groups[2][is_fallback]", "0"),
                ("saml_provision_groups[2][sortorder]", "1"),
                ("saml_provision_groups[2][user_groups][][usrgrpid]", "7"),
                ("saml_provision_groups[2][user_groups][][usrgrpid]", "12"),
            ]
        );
    }

    #[test]
    fn fallback_group_carries_status_instead_of_name() {
        let fields = encode_saml_provision_group(
            RowIndex::new(0),
            &group(None, GroupMappingKind::Fallback, 4),
        );

        assert!(
            fields
                .iter()
                .any(|field| field.name() == "saml_provision_groups[0][fallback_status]"
                    && field.value() == "1")
        );
        assert!(
            fields
                .iter()
                .all(|field| field.name() != "saml_provision_groups[0][name]")
        );
    }

    #[test]
    fn ldap_server_nested_rows_survive_encoding() {
        let server = ldap_server();
        let fields = encode_ldap_server(RowIndex::new(3), &server);

        assert!(fields.iter().any(|field| {
            field.name() == "ldap_servers[3][provision_groups][1][is_fallback]"
                && field.value() == "1"
        }));
        assert!(
            fields
                .iter()
                .all(|field| field.name() != "ldap_servers[3][bind_password]")
        );

        let decoded = tree(&fields);
        let node = decoded
            .child("ldap_servers")
            .and_then(|servers| servers.at(3))
            .unwrap_or_else(|| unreachable!());
        let extracted = extract_ldap_server(node).unwrap_or_else(|_| unreachable!());

        assert_eq!(extracted, server.without_display());
        assert_eq!(extracted.provision_groups()[1].sortorder(), 2);
    }

    #[test]
    fn extraction_reports_missing_required_inputs() {
        let fields = vec![FormField::scalar("saml_provision_groups[0][name]", "devs")];
        let decoded = tree(&fields);
        let node = decoded
            .child("saml_provision_groups")
            .and_then(|groups| groups.at(0))
            .unwrap_or_else(|| unreachable!());

        let error = extract_provision_group(node).err();
        assert!(
            error
                .map(|error| error.to_string().contains("is_fallback"))
                .unwrap_or(false)
        );
    }

    #[test]
    fn decoding_orders_groups_by_sortorder() {
        let mut fields = encode_saml_provision_group(
            RowIndex::new(0),
            &group(None, GroupMappingKind::Fallback, 3),
        );
        fields.extend(encode_saml_provision_group(
            RowIndex::new(1),
            &group(Some("b"), GroupMappingKind::Regular, 2),
        ));
        fields.extend(encode_saml_provision_group(
            RowIndex::new(5),
            &group(Some("a"), GroupMappingKind::Regular, 1),
        ));
        fields.extend(encode_saml_provision_media(RowIndex::new(0), &media()));
        fields.push(FormField::scalar(LDAP_DEFAULT_ROW_INDEX, "0"));
        fields.push(FormField::scalar("ldap_removed_userdirectoryids[]", "9"));
        fields.push(FormField::scalar("saml_auth_enabled", "1"));

        let decoded = decode_authentication_form(&fields).unwrap_or_else(|_| unreachable!());
        let order: Vec<u32> = decoded
            .saml_provision_groups
            .iter()
            .map(|(index, _)| index.value())
            .collect();

        assert_eq!(order, vec![5, 1, 0]);
        assert_eq!(decoded.saml_provision_media.len(), 1);
        assert_eq!(decoded.saml_provision_media[0].1, media().without_display());
        assert_eq!(decoded.ldap_default_row_index, Some(RowIndex::new(0)));
        assert_eq!(decoded.ldap_removed_userdirectoryids, vec!["9".to_owned()]);
        assert!(decoded.ldap_servers.is_empty());
    }

    #[test]
    fn decoding_prefixes_errors_with_the_row() {
        let fields = vec![
            FormField::scalar("saml_provision_media[4][name]", "Email"),
            FormField::scalar("saml_provision_media[4][mediatypeid]", "1"),
        ];

        let error = decode_authentication_form(&fields).err();
        assert!(
            error
                .map(|error| error.to_string().contains("saml_provision_media[4]"))
                .unwrap_or(false)
        );
    }
}

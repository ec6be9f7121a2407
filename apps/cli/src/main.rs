//! Console front end of the authentication settings form and the list page
//! mass deletes.

#![forbid(unsafe_code)]

mod cli_config;
mod edit_script;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use authconsole_application::{
    AuthenticationForm, AuthenticationFormService, AuthenticationPageData, ConfirmPrompt,
    ListPageService, MassDeleteRequest, PageOutcome, PopupMediator, RowTemplates, SubmitOutcome,
};
use authconsole_core::{AppError, AppResult};
use authconsole_domain::{FormField, MessageBox};
use authconsole_infrastructure::{HttpServerGateway, ScriptedPopupHost, StaticConfirmPrompt};
use clap::Parser;
use tracing::{info, warn};
use url::form_urlencoded;

use crate::cli_config::{Cli, Command, FormArgs, HttpArgs, ServerArgs, init_tracing};
use crate::edit_script::{EditStep, apply_steps, editor_answers, parse_script};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let confirm_prompt: Arc<dyn ConfirmPrompt> = Arc::new(StaticConfirmPrompt::new(cli.confirm));

    match cli.command {
        Command::Form(args) => run_form(&args, confirm_prompt).await,
        Command::DeleteActions {
            server,
            eventsource,
            actionids,
        } => {
            let request = MassDeleteRequest::Actions {
                eventsource,
                actionids,
            };
            run_mass_delete(&server, &cli.http, request, confirm_prompt).await
        }
        Command::DeleteHosts { server, hostids } => {
            let request = MassDeleteRequest::Hosts { hostids };
            run_mass_delete(&server, &cli.http, request, confirm_prompt).await
        }
    }
}

async fn run_form(args: &FormArgs, confirm_prompt: Arc<dyn ConfirmPrompt>) -> AppResult<()> {
    let page: AuthenticationPageData = serde_json::from_str(&read_file(&args.page_data)?)
        .map_err(|error| AppError::Validation(format!("invalid page data: {error}")))?;

    let steps: Vec<EditStep> = match args.edit_script.as_deref() {
        Some(path) => parse_script(&read_file(path)?)?,
        None => Vec::new(),
    };

    let popup_host = Arc::new(ScriptedPopupHost::new(editor_answers(&steps)));
    let service = AuthenticationFormService::new(PopupMediator::new(popup_host), confirm_prompt);
    let mut form = AuthenticationForm::new(page)?;

    info!(steps = steps.len(), "replaying edit script");
    apply_steps(&service, &mut form, steps).await?;

    if args.render_html {
        let tables = form.render(&RowTemplates::new()?)?;
        for row in tables
            .ldap_servers
            .iter()
            .chain(&tables.saml_provision_groups)
            .chain(&tables.saml_provision_media)
        {
            println!("{}", row.html());
        }
    }

    match service.submit(&mut form).await? {
        SubmitOutcome::Submitted(fields) => println!("{}", encode_fields(&fields)),
        SubmitOutcome::Cancelled => warn!("submit cancelled"),
    }

    Ok(())
}

async fn run_mass_delete(
    server: &ServerArgs,
    http: &HttpArgs,
    request: MassDeleteRequest,
    confirm_prompt: Arc<dyn ConfirmPrompt>,
) -> AppResult<()> {
    let http_client = reqwest::Client::builder()
        .timeout(http.timeout())
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;
    let gateway = HttpServerGateway::new(
        http_client,
        server.server_url.clone(),
        http.http_max_attempts,
        http.http_retry_backoff_ms,
    );
    let service = ListPageService::new(Arc::new(gateway), confirm_prompt);

    match service.mass_delete(request).await? {
        PageOutcome::Reload { message } => {
            info!("page reload requested");
            if let Some(message) = message {
                print_message(&message);
            }
        }
        PageOutcome::Stay { message } => print_message(&message),
        PageOutcome::Cancelled => warn!("mass delete cancelled"),
    }

    Ok(())
}

fn print_message(message: &MessageBox) {
    println!(
        "[{:?}] {}",
        message.kind(),
        message.title().unwrap_or_default()
    );
    for line in message.messages() {
        println!("  {line}");
    }
}

fn read_file(path: &Path) -> AppResult<String> {
    fs::read_to_string(path).map_err(|error| {
        AppError::Validation(format!("failed to read '{}': {error}", path.display()))
    })
}

fn encode_fields(fields: &[FormField]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for field in fields {
        serializer.append_pair(field.name(), field.value());
    }

    serializer.finish()
}

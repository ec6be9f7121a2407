//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_server_gateway;
mod scripted_popup_host;
mod static_confirm_prompt;

pub use http_server_gateway::HttpServerGateway;
pub use scripted_popup_host::ScriptedPopupHost;
pub use static_confirm_prompt::StaticConfirmPrompt;

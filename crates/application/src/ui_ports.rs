mod confirm;
mod gateway;
mod popup;

pub use confirm::ConfirmPrompt;
pub use gateway::{ServerGateway, ServerRequest};
pub use popup::{EditorKind, PopupHost, PopupRequest};

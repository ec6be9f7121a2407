use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use authconsole_core::{AppError, AppResult};
use serde_json::{Map, Value};
use tracing::debug;

use crate::ui_ports::{EditorKind, PopupHost, PopupRequest};

/// Opens modal editors and routes their results back to the caller.
///
/// At most one editor of each kind is open at a time; a second request for an
/// open kind fails with `AppError::Conflict` and does not reach the host.
#[derive(Clone)]
pub struct PopupMediator {
    host: Arc<dyn PopupHost>,
    open: Arc<Mutex<BTreeSet<EditorKind>>>,
}

impl PopupMediator {
    /// Creates a mediator over a popup host.
    #[must_use]
    pub fn new(host: Arc<dyn PopupHost>) -> Self {
        Self {
            host,
            open: Arc::new(Mutex::new(BTreeSet::new())),
        }
    }

    /// Opens an editor and waits for its payload; `None` means dismissed.
    pub async fn open_editor(
        &self,
        kind: EditorKind,
        params: Map<String, Value>,
    ) -> AppResult<Option<Value>> {
        let _guard = OpenEditorGuard::acquire(&self.open, kind)?;
        debug!(editor = %kind, action = kind.action(), "opening editor");

        let payload = self.host.open(PopupRequest { kind, params }).await?;
        debug!(editor = %kind, submitted = payload.is_some(), "editor closed");
        Ok(payload)
    }

    /// Returns whether an editor of `kind` is currently open.
    #[must_use]
    pub fn is_open(&self, kind: EditorKind) -> bool {
        self.open
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&kind)
    }
}

struct OpenEditorGuard {
    open: Arc<Mutex<BTreeSet<EditorKind>>>,
    kind: EditorKind,
}

impl OpenEditorGuard {
    fn acquire(open: &Arc<Mutex<BTreeSet<EditorKind>>>, kind: EditorKind) -> AppResult<Self> {
        let inserted = open
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind);
        if !inserted {
            return Err(AppError::Conflict(format!(
                "editor '{kind}' is already open"
            )));
        }

        Ok(Self {
            open: Arc::clone(open),
            kind,
        })
    }
}

impl Drop for OpenEditorGuard {
    fn drop(&mut self) {
        self.open
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.kind);
    }
}

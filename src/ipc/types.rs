use std::path::{Path, PathBuf};

use crate::session::Session;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Sidecar state between requests.
///
/// `session` is only ever open on `workspace`. The path can outlive the
/// session while the database file is being replaced.
#[derive(Default)]
pub struct AppState {
    workspace: Option<PathBuf>,
    session: Option<Session>,
}

impl AppState {
    pub fn workspace(&self) -> Option<&Path> {
        self.workspace.as_deref()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        self.session.as_mut()
    }

    /// Closes whatever is open, then opens `path`.
    pub fn open_workspace(&mut self, path: PathBuf) -> anyhow::Result<&Session> {
        self.close_workspace();
        let session = Session::open(&path)?;
        self.workspace = Some(path);
        Ok(self.session.insert(session))
    }

    /// Returns whether a session was open.
    pub fn close_workspace(&mut self) -> bool {
        let was_open = self.suspend();
        self.workspace = None;
        was_open
    }

    /// Drops the connection but keeps the workspace path for `resume`.
    pub fn suspend(&mut self) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };
        if let Err(e) = session.close() {
            log::warn!("closing workspace failed: {e:#}");
        }
        true
    }

    /// Reopens the suspended workspace. On failure the workspace is forgotten.
    pub fn resume(&mut self) -> anyhow::Result<()> {
        let Some(path) = self.workspace.clone() else {
            return Ok(());
        };
        match Session::open(&path) {
            Ok(session) => {
                self.session = Some(session);
                Ok(())
            }
            Err(e) => {
                self.workspace = None;
                Err(e)
            }
        }
    }
}

//! Top-level view model: resolves the docente, loads the profile once and
//! tracks which tab is showing.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::backend::PortalBackend;
use crate::error::PortalError;
use crate::liveness::Liveness;
use crate::model::DocenteProfile;
use crate::profile;
use crate::session_store::{KeyValueStore, StoreError, read_docente_id};

pub const MISSING_DOCENTE_MESSAGE: &str = "No se encontró ID de docente";
pub const INVALID_DOCENTE_MESSAGE: &str = "ID de docente inválido";
pub const LOAD_FAILED_MESSAGE: &str = "Error al cargar datos del servidor";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveTab {
    Profile,
    #[default]
    Incidencias,
}

impl ActiveTab {
    pub fn as_str(self) -> &'static str {
        match self {
            ActiveTab::Profile => "profile",
            ActiveTab::Incidencias => "incidencias",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ActiveTab::Profile => ActiveTab::Incidencias,
            ActiveTab::Incidencias => ActiveTab::Profile,
        }
    }
}

impl std::str::FromStr for ActiveTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "profile" | "perfil" => Ok(ActiveTab::Profile),
            "incidencias" => Ok(ActiveTab::Incidencias),
            other => Err(format!("pestaña desconocida: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DashboardState {
    #[default]
    Loading,
    Ready {
        docente_id: i64,
        profile: DocenteProfile,
    },
    /// Terminal; mounting again does not retry.
    Failed { message: String },
}

impl DashboardState {
    pub fn error(&self) -> Option<&str> {
        match self {
            DashboardState::Failed { message } => Some(message),
            _ => None,
        }
    }
}

struct ViewState {
    state: DashboardState,
    tab: ActiveTab,
    /// Set while a `mount` owns the profile fetch.
    mounting: bool,
}

pub struct DashboardView {
    backend: Arc<dyn PortalBackend>,
    store: Arc<dyn KeyValueStore>,
    docente_id_key: String,
    liveness: Liveness,
    inner: Mutex<ViewState>,
}

impl DashboardView {
    pub fn new(
        backend: Arc<dyn PortalBackend>,
        store: Arc<dyn KeyValueStore>,
        docente_id_key: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            store,
            docente_id_key: docente_id_key.into(),
            liveness: Liveness::new(),
            inner: Mutex::new(ViewState {
                state: DashboardState::Loading,
                tab: ActiveTab::default(),
                mounting: false,
            }),
        }
    }

    pub fn with_tab(self, tab: ActiveTab) -> Self {
        self.lock().tab = tab;
        self
    }

    fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> DashboardState {
        self.lock().state.clone()
    }

    pub fn active_tab(&self) -> ActiveTab {
        self.lock().tab
    }

    /// Handle for child controllers whose results should stop once the
    /// dashboard goes away.
    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    pub fn docente_id(&self) -> Option<i64> {
        match self.lock().state {
            DashboardState::Ready { docente_id, .. } => Some(docente_id),
            _ => None,
        }
    }

    pub fn select_tab(&self, tab: ActiveTab) {
        let mut inner = self.lock();
        if inner.tab != tab {
            debug!(from = inner.tab.as_str(), to = tab.as_str(), "Tab changed");
            inner.tab = tab;
        }
    }

    /// Resolve the docente id and fetch the profile. Runs once; later or
    /// concurrent calls return the current state without fetching.
    #[instrument(skip(self))]
    pub async fn mount(&self) -> DashboardState {
        {
            let mut inner = self.lock();
            if inner.mounting || !matches!(inner.state, DashboardState::Loading) {
                return inner.state.clone();
            }
            inner.mounting = true;
        }

        let docente_id = match read_docente_id(self.store.as_ref(), &self.docente_id_key) {
            Ok(id) => id,
            Err(err) => {
                let message = match err {
                    StoreError::Missing { .. } => MISSING_DOCENTE_MESSAGE,
                    _ => INVALID_DOCENTE_MESSAGE,
                };
                warn!(error = %err, "Cannot resolve docente id");
                return self.settle(DashboardState::Failed {
                    message: message.to_string(),
                });
            }
        };

        let next = match self.backend.fetch_docente(docente_id).await {
            Ok(profile) => {
                info!(docente_id, "Profile loaded");
                DashboardState::Ready {
                    docente_id,
                    profile,
                }
            }
            Err(err) => {
                warn!(docente_id, error = %err, "Profile load failed");
                DashboardState::Failed {
                    message: LOAD_FAILED_MESSAGE.to_string(),
                }
            }
        };

        if !self.liveness.is_alive() {
            debug!("Dashboard unmounted; dropping profile result");
            return next;
        }
        self.settle(next)
    }

    fn settle(&self, next: DashboardState) -> DashboardState {
        self.lock().state = next.clone();
        next
    }

    pub fn unmount(&self) {
        self.liveness.detach();
    }

    /// Change the logged-in docente's password from the profile tab.
    pub async fn change_password(
        &self,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<String, PortalError> {
        let docente_id = match self.docente_id() {
            Some(id) => id,
            None => read_docente_id(self.store.as_ref(), &self.docente_id_key)?,
        };
        profile::change_password(
            self.backend.as_ref(),
            docente_id,
            new_password,
            confirm_password,
        )
        .await
    }
}

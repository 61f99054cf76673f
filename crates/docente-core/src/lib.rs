//! Core library crate for the docente portal client: data model, session
//! access, backend transport and the form/dashboard workflow.

pub mod attachment;
pub mod auth;
pub mod backend;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod fallback;
pub mod format;
pub mod forms;
pub mod liveness;
pub mod logging;
pub mod model;
pub mod profile;
pub mod repository;
pub mod session_store;
pub mod validation;

pub use attachment::{AttachmentEncoder, ImageSource, MultipartEncoder, UploadPayload};
pub use auth::{AuthToken, TokenAccessor};
pub use backend::{HttpBackend, PortalBackend};
pub use config::{
    BackendPreferences, ConfigError, ConfigLoadResult, ConfigSource, FileConfig, SessionBackend,
    SessionPreferences, UiPreferences, config_directory, config_path, load_config, save_config,
};
pub use dashboard::{ActiveTab, DashboardState, DashboardView};
pub use error::PortalError;
pub use forms::{
    CumpleanosDraft, DiaEconomicoDraft, FormController, FormDraft, FormPhase, IncidenciaDraft,
    PermisoDraft,
};
pub use liveness::Liveness;
pub use logging::{LoggingDestination, LoggingError, init_logging};
pub use model::{
    DiaCumpleanos, DiaEconomico, DocenteProfile, Estado, Incidencia, PermisoEspecial, Stats,
    TipoIncidencia, TipoPermiso,
};
pub use repository::{DataSource, IncidenceRepository, PortalSnapshot};
pub use session_store::{FileStore, KeyValueStore, KeyringStore, MemoryStore, StoreError};
pub use validation::ValidationError;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, instrument, warn};

use crate::attachment::{AttachmentEncoder, ImageSource, MultipartEncoder};
use crate::backend::PortalBackend;
use crate::error::PortalError;
use crate::fallback;
use crate::model::{
    DiaCumpleanos, DiaEconomico, Estado, Incidencia, NewDiaCumpleanos, NewDiaEconomico,
    NewIncidencia, NewPermiso, PermisoEspecial, Stats,
};
use crate::validation::ValidationError;

/// How fresh the cached lists are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataSource {
    /// Nothing loaded yet.
    #[default]
    Empty,
    /// Every slice came from the latest load.
    Live,
    /// Some slices failed and kept their previous value.
    Partial,
    /// The backend was unreachable; sample records are shown.
    Fallback,
    /// At least one request came back 401; previous values are kept.
    SessionExpired,
}

/// Cached copy of the docente's server-side state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PortalSnapshot {
    pub incidencias: Vec<Incidencia>,
    pub dias_economicos: Vec<DiaEconomico>,
    pub permisos_especiales: Vec<PermisoEspecial>,
    pub dias_cumpleanos: Vec<DiaCumpleanos>,
    pub stats: Stats,
    pub source: DataSource,
    /// One message per slice that failed on the last load.
    pub failures: Vec<String>,
}

impl PortalSnapshot {
    pub fn fallback() -> Self {
        Self {
            incidencias: fallback::sample_incidencias(),
            dias_economicos: fallback::sample_dias_economicos(),
            permisos_especiales: fallback::sample_permisos_especiales(),
            dias_cumpleanos: Vec::new(),
            stats: fallback::sample_stats(),
            source: DataSource::Fallback,
            failures: Vec::new(),
        }
    }
}

/// CRUD-style access to incidences and leave requests.
///
/// Mutations never touch the cache; callers refresh with [`load_all`](Self::load_all).
pub struct IncidenceRepository {
    backend: Arc<dyn PortalBackend>,
    encoder: Arc<dyn AttachmentEncoder>,
    docente_id: Option<i64>,
    next_generation: AtomicU64,
    cache: Mutex<Cache>,
}

#[derive(Default)]
struct Cache {
    snapshot: PortalSnapshot,
    /// Generation of the load that last wrote `snapshot`.
    generation: u64,
}

impl IncidenceRepository {
    pub fn new(backend: Arc<dyn PortalBackend>) -> Self {
        Self {
            backend,
            encoder: Arc::new(MultipartEncoder),
            docente_id: None,
            next_generation: AtomicU64::new(0),
            cache: Mutex::new(Cache::default()),
        }
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn AttachmentEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    /// Docente id stamped on new incidences that lack one.
    pub fn with_docente_id(mut self, docente_id: Option<i64>) -> Self {
        self.docente_id = docente_id;
        self
    }

    pub fn backend(&self) -> &Arc<dyn PortalBackend> {
        &self.backend
    }

    pub fn snapshot(&self) -> PortalSnapshot {
        self.lock().snapshot.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Cache> {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fetch every list and the stats concurrently.
    ///
    /// A failed slice keeps its previous value. The sample dataset replaces
    /// the snapshot only when every request failed to reach the server. A 401
    /// on any slice marks the snapshot [`DataSource::SessionExpired`].
    ///
    /// Loads may overlap; a load that finishes after a newer one has written
    /// the cache leaves it untouched and returns the newer snapshot.
    #[instrument(skip(self), fields(backend = self.backend.backend_tag()))]
    pub async fn load_all(&self) -> PortalSnapshot {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (incidencias, dias, permisos, cumpleanos, stats) = tokio::join!(
            self.backend.list_incidencias(),
            self.backend.list_dias_economicos(),
            self.backend.list_permisos_especiales(),
            self.backend.list_dias_cumpleanos(),
            self.backend.fetch_stats(),
        );

        let mut cache = self.lock();
        if cache.generation > generation {
            debug!(
                generation,
                latest = cache.generation,
                "Newer load already applied; discarding this one"
            );
            return cache.snapshot.clone();
        }

        let mut next = cache.snapshot.clone();
        let mut report = LoadReport::default();
        report.merge(&mut next.incidencias, incidencias, "incidencias");
        report.merge(&mut next.dias_economicos, dias, "dias economicos");
        report.merge(&mut next.permisos_especiales, permisos, "permisos especiales");
        report.merge(&mut next.dias_cumpleanos, cumpleanos, "dias de cumpleanos");
        report.merge(&mut next.stats, stats, "estadisticas");

        if report.session_expired {
            warn!(failures = ?report.failures, "Session rejected; keeping previous data");
            next.source = DataSource::SessionExpired;
            next.failures = report.failures;
        } else if report.loaded == 0 && report.offline == report.failures.len() {
            warn!(failures = ?report.failures, "Backend unreachable; showing sample data");
            next = PortalSnapshot {
                failures: report.failures,
                ..PortalSnapshot::fallback()
            };
        } else {
            next.source = if report.failures.is_empty() {
                DataSource::Live
            } else {
                DataSource::Partial
            };
            next.failures = report.failures;
            info!(
                incidencias = next.incidencias.len(),
                dias_economicos = next.dias_economicos.len(),
                permisos = next.permisos_especiales.len(),
                dias_cumpleanos = next.dias_cumpleanos.len(),
                source = ?next.source,
                "Loaded portal data"
            );
        }

        cache.snapshot = next.clone();
        cache.generation = generation;
        next
    }

    /// Validate, attach the optional image, and POST.
    #[instrument(skip(self, body, image), fields(tipo = %body.tipo))]
    pub async fn create_incidencia(
        &self,
        mut body: NewIncidencia,
        image: Option<&ImageSource>,
    ) -> Result<Incidencia, PortalError> {
        body.validate()?;
        if body.docente_id.is_none() {
            body.docente_id = self.docente_id;
        }
        let upload = image.map(|img| self.encoder.encode(img)).transpose()?;
        let created = self.backend.create_incidencia(&body, upload).await?;
        info!(id = created.id, estado = ?created.estado, "Incidence created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn delete_incidencia(&self, id: i64) -> Result<(), PortalError> {
        self.backend.delete_incidencia(id).await?;
        info!(id, "Incidence deleted");
        Ok(())
    }

    /// Cancel an economic-day request. Requests the cache shows as already
    /// decided are refused without a network call.
    #[instrument(skip(self))]
    pub async fn delete_dia_economico(&self, id: i64) -> Result<(), PortalError> {
        let estado = self
            .lock()
            .snapshot
            .dias_economicos
            .iter()
            .find(|dia| dia.id == id)
            .map(|dia| dia.estado);
        ensure_pending(estado)?;
        self.backend.delete_dia_economico(id).await?;
        info!(id, "Economic day cancelled");
        Ok(())
    }

    /// Same pending-only rule as [`delete_dia_economico`](Self::delete_dia_economico).
    #[instrument(skip(self))]
    pub async fn delete_dia_cumpleanos(&self, id: i64) -> Result<(), PortalError> {
        let estado = self
            .lock()
            .snapshot
            .dias_cumpleanos
            .iter()
            .find(|dia| dia.id == id)
            .map(|dia| dia.estado);
        ensure_pending(estado)?;
        self.backend.delete_dia_cumpleanos(id).await?;
        info!(id, "Birthday day cancelled");
        Ok(())
    }

    #[instrument(skip(self, body))]
    pub async fn create_dia_economico(
        &self,
        body: NewDiaEconomico,
    ) -> Result<DiaEconomico, PortalError> {
        body.validate()?;
        let created = self.backend.create_dia_economico(&body).await?;
        info!(id = created.id, "Economic day requested");
        Ok(created)
    }

    #[instrument(skip(self, body))]
    pub async fn create_dia_cumpleanos(
        &self,
        body: NewDiaCumpleanos,
    ) -> Result<DiaCumpleanos, PortalError> {
        body.validate()?;
        let created = self.backend.create_dia_cumpleanos(&body).await?;
        info!(id = created.id, "Birthday day requested");
        Ok(created)
    }

    #[instrument(skip(self, body), fields(tipo = %body.tipo))]
    pub async fn create_permiso(&self, body: NewPermiso) -> Result<PermisoEspecial, PortalError> {
        body.validate()?;
        let created = self.backend.create_permiso(&body).await?;
        info!(id = created.id, "Special permit requested");
        Ok(created)
    }
}

/// Unknown records pass; the server has the final word on them.
fn ensure_pending(estado: Option<Estado>) -> Result<(), ValidationError> {
    match estado {
        Some(estado) if estado != Estado::Pendiente => Err(ValidationError::SoloPendientes),
        _ => Ok(()),
    }
}

#[derive(Default)]
struct LoadReport {
    loaded: usize,
    /// Failures that never reached the server.
    offline: usize,
    session_expired: bool,
    failures: Vec<String>,
}

impl LoadReport {
    fn merge<T>(&mut self, slot: &mut T, result: Result<T, PortalError>, label: &str) {
        match result {
            Ok(value) => {
                *slot = value;
                self.loaded += 1;
            }
            Err(err) => {
                warn!(slice = label, error = %err, "Keeping previous value");
                if err.is_transport() {
                    self.offline += 1;
                }
                if err.is_session_expired() {
                    self.session_expired = true;
                }
                self.failures.push(format!("{label}: {err}"));
            }
        }
    }
}

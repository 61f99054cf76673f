//! Per-form state machines behind the request modals.
//!
//! Each form moves `Editing -> Validating -> Submitting -> {Success, Failed}`.
//! A failure keeps the draft, records the message and settles back in
//! `Editing`. A success clears the draft, closes the modal and re-fetches
//! every list through [`IncidenceRepository::load_all`].

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use crate::attachment::ImageSource;
use crate::error::PortalError;
use crate::liveness::Liveness;
use crate::model::{
    DiaCumpleanos, DiaEconomico, Incidencia, NewDiaCumpleanos, NewDiaEconomico, NewIncidencia,
    NewPermiso, PermisoEspecial, TipoIncidencia, TipoPermiso,
};
use crate::repository::IncidenceRepository;
use crate::validation::ValidationError;

pub const CUMPLEANOS_MOTIVO_DEFAULT: &str = "Día de cumpleaños según cláusula 27 del CCT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormPhase {
    #[default]
    Editing,
    Validating,
    Submitting,
    Success,
    Failed,
}

/// Field values a form collects before submission.
#[async_trait]
pub trait FormDraft: Default + Clone + Send + Sync + 'static {
    type Output: Send;

    /// Short name used in log lines.
    const KIND: &'static str;

    fn validate(&self) -> Result<(), ValidationError>;

    async fn submit(&self, repo: &IncidenceRepository) -> Result<Self::Output, PortalError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncidenciaDraft {
    pub tipo: TipoIncidencia,
    pub motivo: String,
    pub fecha: String,
    /// `None` uses the type's estimated minutes.
    pub minutos: Option<u32>,
    pub hora_entrada: Option<String>,
    pub hora_salida: Option<String>,
    pub imagen: Option<ImageSource>,
}

impl IncidenciaDraft {
    pub fn to_request(&self) -> NewIncidencia {
        NewIncidencia {
            tipo: self.tipo,
            motivo: self.motivo.trim().to_string(),
            fecha: self.fecha.trim().to_string(),
            minutos: self
                .minutos
                .unwrap_or_else(|| self.tipo.minutos_estimados()),
            hora_entrada: non_blank(self.hora_entrada.as_deref()),
            hora_salida: non_blank(self.hora_salida.as_deref()),
            docente_id: None,
        }
    }
}

#[async_trait]
impl FormDraft for IncidenciaDraft {
    type Output = Incidencia;
    const KIND: &'static str = "incidencia";

    fn validate(&self) -> Result<(), ValidationError> {
        self.to_request().validate()
    }

    async fn submit(&self, repo: &IncidenceRepository) -> Result<Incidencia, PortalError> {
        repo.create_incidencia(self.to_request(), self.imagen.as_ref())
            .await
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiaEconomicoDraft {
    pub motivo: String,
    pub fecha: String,
}

impl DiaEconomicoDraft {
    pub fn to_request(&self) -> NewDiaEconomico {
        NewDiaEconomico {
            motivo: self.motivo.trim().to_string(),
            fecha: self.fecha.trim().to_string(),
            tipo: DiaEconomico::TIPO.to_string(),
        }
    }
}

#[async_trait]
impl FormDraft for DiaEconomicoDraft {
    type Output = DiaEconomico;
    const KIND: &'static str = "dia_economico";

    fn validate(&self) -> Result<(), ValidationError> {
        self.to_request().validate()
    }

    async fn submit(&self, repo: &IncidenceRepository) -> Result<DiaEconomico, PortalError> {
        repo.create_dia_economico(self.to_request()).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CumpleanosDraft {
    pub fecha: String,
    pub motivo: String,
}

impl Default for CumpleanosDraft {
    fn default() -> Self {
        Self {
            fecha: String::new(),
            motivo: CUMPLEANOS_MOTIVO_DEFAULT.to_string(),
        }
    }
}

impl CumpleanosDraft {
    pub fn to_request(&self) -> NewDiaCumpleanos {
        let motivo = match self.motivo.trim() {
            "" => CUMPLEANOS_MOTIVO_DEFAULT,
            other => other,
        };
        NewDiaCumpleanos {
            fecha: self.fecha.trim().to_string(),
            motivo: motivo.to_string(),
        }
    }
}

#[async_trait]
impl FormDraft for CumpleanosDraft {
    type Output = DiaCumpleanos;
    const KIND: &'static str = "cumpleanos";

    fn validate(&self) -> Result<(), ValidationError> {
        self.to_request().validate()
    }

    async fn submit(&self, repo: &IncidenceRepository) -> Result<DiaCumpleanos, PortalError> {
        repo.create_dia_cumpleanos(self.to_request()).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermisoDraft {
    pub tipo: TipoPermiso,
    pub motivo: String,
    pub fecha: String,
    pub duracion: u32,
}

impl Default for PermisoDraft {
    fn default() -> Self {
        Self {
            tipo: TipoPermiso::default(),
            motivo: String::new(),
            fecha: String::new(),
            duracion: 1,
        }
    }
}

impl PermisoDraft {
    pub fn to_request(&self) -> NewPermiso {
        NewPermiso {
            tipo: self.tipo,
            motivo: self.motivo.trim().to_string(),
            fecha: self.fecha.trim().to_string(),
            duracion: self.duracion,
        }
    }
}

#[async_trait]
impl FormDraft for PermisoDraft {
    type Output = PermisoEspecial;
    const KIND: &'static str = "permiso";

    fn validate(&self) -> Result<(), ValidationError> {
        self.to_request().validate()
    }

    async fn submit(&self, repo: &IncidenceRepository) -> Result<PermisoEspecial, PortalError> {
        repo.create_permiso(self.to_request()).await
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone)]
struct FormState<D> {
    draft: D,
    phase: FormPhase,
    error: Option<String>,
    modal_open: bool,
}

/// Drives one form instance. Instances share nothing but the repository.
pub struct FormController<D: FormDraft> {
    repo: Arc<IncidenceRepository>,
    liveness: Liveness,
    state: Mutex<FormState<D>>,
}

impl<D: FormDraft> FormController<D> {
    pub fn new(repo: Arc<IncidenceRepository>) -> Self {
        Self::with_liveness(repo, Liveness::new())
    }

    /// Tie the controller to an owner's lifetime, e.g. the dashboard's.
    pub fn with_liveness(repo: Arc<IncidenceRepository>, liveness: Liveness) -> Self {
        Self {
            repo,
            liveness,
            state: Mutex::new(FormState {
                draft: D::default(),
                phase: FormPhase::Editing,
                error: None,
                modal_open: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FormState<D>> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn phase(&self) -> FormPhase {
        self.lock().phase
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn draft(&self) -> D {
        self.lock().draft.clone()
    }

    pub fn is_open(&self) -> bool {
        self.lock().modal_open
    }

    pub fn can_submit(&self) -> bool {
        !matches!(
            self.lock().phase,
            FormPhase::Validating | FormPhase::Submitting
        )
    }

    pub fn liveness(&self) -> &Liveness {
        &self.liveness
    }

    pub fn open(&self) {
        let mut state = self.lock();
        state.modal_open = true;
        if state.phase == FormPhase::Success {
            state.phase = FormPhase::Editing;
        }
    }

    pub fn close(&self) {
        self.lock().modal_open = false;
    }

    /// Apply a field change. Ignored while a submission is in flight.
    pub fn edit(&self, change: impl FnOnce(&mut D)) {
        let mut state = self.lock();
        if state.phase == FormPhase::Submitting {
            debug!(form = D::KIND, "Edit ignored while submitting");
            return;
        }
        change(&mut state.draft);
        state.phase = FormPhase::Editing;
    }

    /// Stop writing results back; in-flight work finishes silently.
    pub fn detach(&self) {
        self.liveness.detach();
    }

    #[instrument(skip(self), fields(form = D::KIND))]
    pub async fn submit(&self) -> Result<D::Output, PortalError> {
        let draft = {
            let mut state = self.lock();
            if matches!(state.phase, FormPhase::Validating | FormPhase::Submitting) {
                warn!("Submission already in flight");
                return Err(PortalError::SubmissionInFlight);
            }
            state.phase = FormPhase::Validating;
            state.error = None;
            if let Err(err) = state.draft.validate() {
                debug!(error = %err, "Draft rejected locally");
                settle_failed(&mut state, err.to_string());
                return Err(err.into());
            }
            state.phase = FormPhase::Submitting;
            state.draft.clone()
        };

        let outcome = draft.submit(&self.repo).await;

        if !self.liveness.is_alive() {
            debug!("Form detached; dropping result");
            return outcome;
        }

        match outcome {
            Ok(created) => {
                {
                    let mut state = self.lock();
                    state.draft = D::default();
                    state.modal_open = false;
                    state.phase = FormPhase::Success;
                }
                info!("Submission accepted; refreshing lists");
                self.repo.load_all().await;
                Ok(created)
            }
            Err(err) => {
                settle_failed(&mut self.lock(), err.to_string());
                Err(err)
            }
        }
    }
}

fn settle_failed<D>(state: &mut FormState<D>, message: String) {
    state.phase = FormPhase::Failed;
    debug!(%message, "Form failed");
    state.error = Some(message);
    state.phase = FormPhase::Editing;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incidencia_draft_fills_estimated_minutes() {
        let draft = IncidenciaDraft {
            tipo: TipoIncidencia::SalidaAnticipada,
            motivo: " Cita médica ".into(),
            fecha: "2024-01-20".into(),
            hora_entrada: Some("  ".into()),
            ..Default::default()
        };
        let request = draft.to_request();
        assert_eq!(request.minutos, 30);
        assert_eq!(request.motivo, "Cita médica");
        assert!(request.hora_entrada.is_none());

        let explicit = IncidenciaDraft {
            minutos: Some(0),
            ..draft
        };
        assert_eq!(explicit.to_request().minutos, 0);
    }

    #[test]
    fn cumpleanos_draft_defaults_motivo() {
        let draft = CumpleanosDraft {
            fecha: "2024-05-10".into(),
            motivo: String::new(),
        };
        assert_eq!(draft.to_request().motivo, CUMPLEANOS_MOTIVO_DEFAULT);
        assert_eq!(CumpleanosDraft::default().motivo, CUMPLEANOS_MOTIVO_DEFAULT);
    }

    #[test]
    fn permiso_draft_rejects_zero_days() {
        let draft = PermisoDraft {
            motivo: "Titulación".into(),
            fecha: "2024-06-01".into(),
            duracion: 0,
            ..Default::default()
        };
        assert_eq!(draft.validate(), Err(ValidationError::DuracionInvalida));
    }
}

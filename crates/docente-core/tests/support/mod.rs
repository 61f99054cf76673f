#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use docente_core::attachment::UploadPayload;
use docente_core::backend::PortalBackend;
use docente_core::error::PortalError;
use docente_core::model::{
    DiaCumpleanos, DiaEconomico, DocenteProfile, Estado, Incidencia, NewDiaCumpleanos,
    NewDiaEconomico, NewIncidencia, NewPermiso, PasswordChange, PermisoEspecial, Stats,
};

/// In-memory backend that records calls and can be told to fail.
#[derive(Default)]
pub struct FakeBackend {
    pub calls: AtomicU64,
    pub list_calls: AtomicU64,
    pub post_calls: AtomicU64,
    pub fail_lists: AtomicBool,
    pub expired_session: AtomicBool,
    pub fail_stats_only: AtomicBool,
    pub fail_posts: AtomicBool,
    pub delay: Mutex<Option<Duration>>,
    /// Applied once, after the incidence list has been read.
    pub stale_list_delay: Mutex<Option<Duration>>,
    pub incidencias: Mutex<Vec<Incidencia>>,
    pub dias: Mutex<Vec<DiaEconomico>>,
    pub permisos: Mutex<Vec<PermisoEspecial>>,
    pub cumpleanos: Mutex<Vec<DiaCumpleanos>>,
    pub uploads: Mutex<Vec<UploadPayload>>,
    pub last_incidencia: Mutex<Option<NewIncidencia>>,
    pub last_password: Mutex<Option<PasswordChange>>,
    pub profile: Mutex<Option<DocenteProfile>>,
    next_id: AtomicU64,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(100),
            ..Self::default()
        }
    }

    pub fn offline() -> Self {
        let backend = Self::new();
        backend.fail_lists.store(true, Ordering::SeqCst);
        backend.fail_posts.store(true, Ordering::SeqCst);
        backend
    }

    /// Every GET is rejected with a bare 401.
    pub fn expired() -> Self {
        let backend = Self::new();
        backend.expired_session.store(true, Ordering::SeqCst);
        backend
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn with_profile(self, profile: DocenteProfile) -> Self {
        *self.profile.lock().unwrap() = Some(profile);
        self
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn post_calls(&self) -> u64 {
        self.post_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    async fn list_guard(&self) -> Result<(), PortalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.expired_session.load(Ordering::SeqCst) {
            return Err(PortalError::Unauthorized);
        }
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(transport_error().await);
        }
        Ok(())
    }

    async fn post_guard(&self) -> Result<i64, PortalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.post_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_posts.load(Ordering::SeqCst) {
            return Err(PortalError::Backend {
                status: 500,
                message: "Error interno".to_string(),
            });
        }
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst) as i64)
    }
}

/// A genuine connection-refused error from a port nothing listens on.
pub async fn transport_error() -> PortalError {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    reqwest::get(format!("http://{addr}/"))
        .await
        .expect_err("nothing listening")
        .into()
}

fn not_found(message: &str) -> PortalError {
    PortalError::Backend {
        status: 404,
        message: message.to_string(),
    }
}

fn offline_error() -> PortalError {
    PortalError::Backend {
        status: 503,
        message: "servicio no disponible".to_string(),
    }
}

#[async_trait]
impl PortalBackend for FakeBackend {
    fn backend_tag(&self) -> &'static str {
        "fake"
    }

    async fn list_incidencias(&self) -> Result<Vec<Incidencia>, PortalError> {
        let listed = self.incidencias.lock().unwrap().clone();
        let stale = self.stale_list_delay.lock().unwrap().take();
        if let Some(delay) = stale {
            tokio::time::sleep(delay).await;
        }
        self.list_guard().await?;
        Ok(listed)
    }

    async fn list_dias_economicos(&self) -> Result<Vec<DiaEconomico>, PortalError> {
        self.list_guard().await?;
        Ok(self.dias.lock().unwrap().clone())
    }

    async fn list_permisos_especiales(&self) -> Result<Vec<PermisoEspecial>, PortalError> {
        self.list_guard().await?;
        Ok(self.permisos.lock().unwrap().clone())
    }

    async fn list_dias_cumpleanos(&self) -> Result<Vec<DiaCumpleanos>, PortalError> {
        self.list_guard().await?;
        Ok(self.cumpleanos.lock().unwrap().clone())
    }

    async fn fetch_stats(&self) -> Result<Stats, PortalError> {
        self.list_guard().await?;
        if self.fail_stats_only.load(Ordering::SeqCst) {
            return Err(offline_error());
        }
        let incidencias = self.incidencias.lock().unwrap();
        Ok(Stats {
            total_incidencias: incidencias.len() as u32,
            incidencias_pendientes: incidencias
                .iter()
                .filter(|i| i.estado == Estado::Pendiente)
                .count() as u32,
            dias_disponibles: 15,
            ..Stats::default()
        })
    }

    async fn create_incidencia(
        &self,
        body: &NewIncidencia,
        image: Option<UploadPayload>,
    ) -> Result<Incidencia, PortalError> {
        let id = self.post_guard().await?;
        *self.last_incidencia.lock().unwrap() = Some(body.clone());
        if let Some(image) = image {
            self.uploads.lock().unwrap().push(image);
        }
        let created = Incidencia {
            id,
            tipo: body.tipo,
            motivo: body.motivo.clone(),
            fecha: body.fecha.clone(),
            estado: Estado::Pendiente,
            minutos: body.minutos,
            hora_entrada: body.hora_entrada.clone(),
            hora_salida: body.hora_salida.clone(),
            imagen_url: None,
            justificaciones: None,
        };
        self.incidencias.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn delete_incidencia(&self, id: i64) -> Result<(), PortalError> {
        self.post_guard().await?;
        let mut incidencias = self.incidencias.lock().unwrap();
        let before = incidencias.len();
        incidencias.retain(|i| i.id != id);
        if incidencias.len() == before {
            return Err(not_found("Incidencia no encontrada"));
        }
        Ok(())
    }

    async fn delete_dia_economico(&self, id: i64) -> Result<(), PortalError> {
        self.post_guard().await?;
        let mut dias = self.dias.lock().unwrap();
        let before = dias.len();
        dias.retain(|d| d.id != id);
        if dias.len() == before {
            return Err(not_found("Solicitud de día económico no encontrada"));
        }
        Ok(())
    }

    async fn delete_dia_cumpleanos(&self, id: i64) -> Result<(), PortalError> {
        self.post_guard().await?;
        let mut cumpleanos = self.cumpleanos.lock().unwrap();
        let before = cumpleanos.len();
        cumpleanos.retain(|d| d.id != id);
        if cumpleanos.len() == before {
            return Err(not_found("Solicitud de cumpleaños no encontrada"));
        }
        Ok(())
    }

    async fn create_dia_economico(
        &self,
        body: &NewDiaEconomico,
    ) -> Result<DiaEconomico, PortalError> {
        let id = self.post_guard().await?;
        let created = DiaEconomico {
            id,
            motivo: body.motivo.clone(),
            fecha: body.fecha.clone(),
            estado: Estado::Pendiente,
            tipo: body.tipo.clone(),
        };
        self.dias.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn create_dia_cumpleanos(
        &self,
        body: &NewDiaCumpleanos,
    ) -> Result<DiaCumpleanos, PortalError> {
        let id = self.post_guard().await?;
        let created = DiaCumpleanos {
            id,
            fecha: body.fecha.clone(),
            motivo: body.motivo.clone(),
            estado: Estado::Pendiente,
        };
        self.cumpleanos.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn create_permiso(&self, body: &NewPermiso) -> Result<PermisoEspecial, PortalError> {
        let id = self.post_guard().await?;
        let created = PermisoEspecial {
            id,
            tipo: body.tipo,
            motivo: body.motivo.clone(),
            fecha: body.fecha.clone(),
            duracion: body.duracion,
            estado: Estado::Pendiente,
        };
        self.permisos.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn fetch_docente(&self, _id: i64) -> Result<DocenteProfile, PortalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.profile
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(offline_error)
    }

    async fn change_password(&self, body: &PasswordChange) -> Result<String, PortalError> {
        self.post_guard().await?;
        *self.last_password.lock().unwrap() = Some(body.clone());
        Ok("Contraseña actualizada correctamente".to_string())
    }
}

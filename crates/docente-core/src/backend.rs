//! The seam between the client workflow and the portal's REST API.

use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::attachment::{IMAGE_FIELD, UploadPayload};
use crate::auth::TokenAccessor;
use crate::config::BackendPreferences;
use crate::error::{PortalError, extract_error_message};
use crate::model::{
    DiaCumpleanos, DiaEconomico, DocenteProfile, Incidencia, NewDiaCumpleanos, NewDiaEconomico,
    NewIncidencia, NewPermiso, PasswordChange, PermisoEspecial, Stats,
};

pub const INCIDENCIAS_PATH: &str = "/formulario/incidencias";
pub const DIAS_ECONOMICOS_PATH: &str = "/formulario/dias-economicos";
pub const ESTADISTICAS_PATH: &str = "/formulario/estadisticas";
pub const PERMISOS_ESPECIALES_PATH: &str = "/formulario/permisos-especiales";
pub const CUMPLEANOS_PATH: &str = "/cumpleaños/cumpleanos";
pub const DIAS_ECONOMICOS_DELETE_PATH: &str = "/dias_economicos/dias-economicos";
pub const DOCENTES_PATH: &str = "/docente/api/docentes";
pub const CAMBIAR_CONTRASENA_PATH: &str = "/docente/api/docentes/cambiar-contrasena";

const PASSWORD_CHANGED_MESSAGE: &str = "Contraseña actualizada correctamente";

#[async_trait]
pub trait PortalBackend: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    async fn list_incidencias(&self) -> Result<Vec<Incidencia>, PortalError>;

    async fn list_dias_economicos(&self) -> Result<Vec<DiaEconomico>, PortalError>;

    async fn list_permisos_especiales(&self) -> Result<Vec<PermisoEspecial>, PortalError>;

    async fn list_dias_cumpleanos(&self) -> Result<Vec<DiaCumpleanos>, PortalError>;

    async fn fetch_stats(&self) -> Result<Stats, PortalError>;

    /// Multipart when `image` is present, JSON otherwise.
    async fn create_incidencia(
        &self,
        body: &NewIncidencia,
        image: Option<UploadPayload>,
    ) -> Result<Incidencia, PortalError>;

    async fn delete_incidencia(&self, id: i64) -> Result<(), PortalError>;

    async fn delete_dia_economico(&self, id: i64) -> Result<(), PortalError>;

    async fn delete_dia_cumpleanos(&self, id: i64) -> Result<(), PortalError>;

    async fn create_dia_economico(
        &self,
        body: &NewDiaEconomico,
    ) -> Result<DiaEconomico, PortalError>;

    async fn create_dia_cumpleanos(
        &self,
        body: &NewDiaCumpleanos,
    ) -> Result<DiaCumpleanos, PortalError>;

    async fn create_permiso(&self, body: &NewPermiso) -> Result<PermisoEspecial, PortalError>;

    async fn fetch_docente(&self, id: i64) -> Result<DocenteProfile, PortalError>;

    /// Returns the server's confirmation message.
    async fn change_password(&self, body: &PasswordChange) -> Result<String, PortalError>;
}

/// [`PortalBackend`] over HTTP with a bearer token on every call.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    tokens: TokenAccessor,
}

impl HttpBackend {
    pub fn new(prefs: &BackendPreferences, tokens: TokenAccessor) -> Result<Self, PortalError> {
        let mut builder = Client::builder().user_agent(concat!(
            "docente-portal/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = prefs.request_timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?, &prefs.base_url, tokens))
    }

    pub fn with_client(client: Client, base_url: &str, tokens: TokenAccessor) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);
        let token = self.tokens.get_token();
        if token.is_empty() {
            builder
        } else {
            builder.bearer_auth(token)
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, PortalError> {
        let response = self.request(Method::GET, path).send().await?;
        decode(Method::GET, path, response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, PortalError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self.request(Method::POST, path).json(body).send().await?;
        decode(Method::POST, path, response).await
    }

    /// DELETE `path`; the reply body is only read for its error message.
    async fn delete(&self, path: &str) -> Result<(), PortalError> {
        let response = self.request(Method::DELETE, path).send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(method = %Method::DELETE, path, status = status.as_u16(), "Backend responded");
        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        Ok(())
    }
}

/// Turn a response into `T`, or into the error its body describes.
async fn decode<T: DeserializeOwned>(
    method: Method,
    path: &str,
    response: Response,
) -> Result<T, PortalError> {
    let status = response.status();
    let body = response.text().await?;
    debug!(%method, path, status = status.as_u16(), "Backend responded");
    if !status.is_success() {
        return Err(status_error(status, &body));
    }
    Ok(serde_json::from_str(&body)?)
}

fn status_error(status: StatusCode, body: &str) -> PortalError {
    let message = extract_error_message(status.as_u16(), body);
    warn!(status = status.as_u16(), %message, "Backend rejected request");
    if status == StatusCode::UNAUTHORIZED && message == format!("Error {}", status.as_u16()) {
        return PortalError::Unauthorized;
    }
    PortalError::Backend {
        status: status.as_u16(),
        message,
    }
}

fn incidencia_form(body: &NewIncidencia, image: UploadPayload) -> Result<Form, PortalError> {
    let mut form = Form::new()
        .text("tipo", body.tipo.as_str())
        .text("motivo", body.motivo.clone())
        .text("fecha", body.fecha.clone())
        .text("minutos", body.minutos.to_string());
    if let Some(hora) = body.hora_entrada.clone() {
        form = form.text("horaEntrada", hora);
    }
    if let Some(hora) = body.hora_salida.clone() {
        form = form.text("horaSalida", hora);
    }
    if let Some(id) = body.docente_id {
        form = form.text("docente_id", id.to_string());
    }
    Ok(form.part(IMAGE_FIELD, image.into_part()?))
}

#[async_trait]
impl PortalBackend for HttpBackend {
    fn backend_tag(&self) -> &'static str {
        "http"
    }

    #[instrument(skip(self))]
    async fn list_incidencias(&self) -> Result<Vec<Incidencia>, PortalError> {
        self.get_json(INCIDENCIAS_PATH).await
    }

    #[instrument(skip(self))]
    async fn list_dias_economicos(&self) -> Result<Vec<DiaEconomico>, PortalError> {
        self.get_json(DIAS_ECONOMICOS_PATH).await
    }

    #[instrument(skip(self))]
    async fn list_permisos_especiales(&self) -> Result<Vec<PermisoEspecial>, PortalError> {
        self.get_json(PERMISOS_ESPECIALES_PATH).await
    }

    #[instrument(skip(self))]
    async fn list_dias_cumpleanos(&self) -> Result<Vec<DiaCumpleanos>, PortalError> {
        match self.get_json(CUMPLEANOS_PATH).await {
            Err(PortalError::Backend { status: 404, .. }) => {
                debug!("No birthday requests on record");
                Ok(Vec::new())
            }
            other => other,
        }
    }

    #[instrument(skip(self))]
    async fn fetch_stats(&self) -> Result<Stats, PortalError> {
        self.get_json(ESTADISTICAS_PATH).await
    }

    #[instrument(skip(self, body, image), fields(tipo = %body.tipo, with_image = image.is_some()))]
    async fn create_incidencia(
        &self,
        body: &NewIncidencia,
        image: Option<UploadPayload>,
    ) -> Result<Incidencia, PortalError> {
        match image {
            None => self.post_json(INCIDENCIAS_PATH, body).await,
            Some(image) => {
                let form = incidencia_form(body, image)?;
                let response = self
                    .request(Method::POST, INCIDENCIAS_PATH)
                    .multipart(form)
                    .send()
                    .await?;
                decode(Method::POST, INCIDENCIAS_PATH, response).await
            }
        }
    }

    #[instrument(skip(self))]
    async fn delete_incidencia(&self, id: i64) -> Result<(), PortalError> {
        self.delete(&format!("{INCIDENCIAS_PATH}/{id}")).await
    }

    #[instrument(skip(self))]
    async fn delete_dia_economico(&self, id: i64) -> Result<(), PortalError> {
        self.delete(&format!("{DIAS_ECONOMICOS_DELETE_PATH}/{id}")).await
    }

    #[instrument(skip(self))]
    async fn delete_dia_cumpleanos(&self, id: i64) -> Result<(), PortalError> {
        self.delete(&format!("{CUMPLEANOS_PATH}/{id}")).await
    }

    #[instrument(skip(self, body))]
    async fn create_dia_economico(
        &self,
        body: &NewDiaEconomico,
    ) -> Result<DiaEconomico, PortalError> {
        self.post_json(DIAS_ECONOMICOS_PATH, body).await
    }

    #[instrument(skip(self, body))]
    async fn create_dia_cumpleanos(
        &self,
        body: &NewDiaCumpleanos,
    ) -> Result<DiaCumpleanos, PortalError> {
        self.post_json(CUMPLEANOS_PATH, body).await
    }

    #[instrument(skip(self, body), fields(tipo = %body.tipo))]
    async fn create_permiso(&self, body: &NewPermiso) -> Result<PermisoEspecial, PortalError> {
        self.post_json(PERMISOS_ESPECIALES_PATH, body).await
    }

    #[instrument(skip(self))]
    async fn fetch_docente(&self, id: i64) -> Result<DocenteProfile, PortalError> {
        self.get_json(&format!("{DOCENTES_PATH}/{id}")).await
    }

    #[instrument(skip(self, body), fields(docente_id = body.docente_id))]
    async fn change_password(&self, body: &PasswordChange) -> Result<String, PortalError> {
        let reply: serde_json::Value = self.post_json(CAMBIAR_CONTRASENA_PATH, body).await?;
        Ok(reply
            .get("message")
            .and_then(serde_json::Value::as_str)
            .unwrap_or(PASSWORD_CHANGED_MESSAGE)
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_without_message_maps_to_session_expired() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, ""),
            PortalError::Unauthorized
        ));
        match status_error(StatusCode::UNAUTHORIZED, r#"{"error": "No autorizado"}"#) {
            PortalError::Backend { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "No autorizado");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn server_errors_carry_raw_text() {
        match status_error(StatusCode::INTERNAL_SERVER_ERROR, "boom") {
            PortalError::Backend { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

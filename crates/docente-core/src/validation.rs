//! Client-side checks that run before any request leaves the device.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::model::{NewDiaCumpleanos, NewDiaEconomico, NewIncidencia, NewPermiso, PasswordChange};

static FECHA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));
static HORA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]?\d|2[0-3]):[0-5]\d$").expect("valid time regex"));

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("El motivo es requerido")]
    MotivoRequerido,
    #[error("La fecha es requerida")]
    FechaRequerida,
    #[error("Formato de fecha incorrecto. Use YYYY-MM-DD")]
    FechaFormato,
    #[error("Formato de hora incorrecto en {campo}. Use HH:MM")]
    HoraFormato { campo: &'static str },
    #[error("La duración debe ser de al menos 1 día")]
    DuracionInvalida,
    #[error("Por favor, completa todos los campos")]
    PasswordCamposVacios,
    #[error("Las contraseñas nuevas no coinciden")]
    PasswordNoCoincide,
    #[error("La contraseña debe tener al menos 8 caracteres")]
    PasswordCorta,
    #[error("Solo se pueden eliminar solicitudes pendientes")]
    SoloPendientes,
}

pub fn validate_motivo(motivo: &str) -> Result<(), ValidationError> {
    if motivo.trim().is_empty() {
        return Err(ValidationError::MotivoRequerido);
    }
    Ok(())
}

pub fn validate_fecha(fecha: &str) -> Result<(), ValidationError> {
    if fecha.trim().is_empty() {
        return Err(ValidationError::FechaRequerida);
    }
    if !FECHA_RE.is_match(fecha) {
        return Err(ValidationError::FechaFormato);
    }
    Ok(())
}

/// Optional 24-hour `HH:MM`; blank counts as absent.
pub fn validate_hora(campo: &'static str, hora: Option<&str>) -> Result<(), ValidationError> {
    match hora.map(str::trim) {
        None | Some("") => Ok(()),
        Some(value) if HORA_RE.is_match(value) => Ok(()),
        Some(_) => Err(ValidationError::HoraFormato { campo }),
    }
}

pub fn validate_duracion(duracion: u32) -> Result<(), ValidationError> {
    if duracion == 0 {
        return Err(ValidationError::DuracionInvalida);
    }
    Ok(())
}

pub fn validate_password_change(new_password: &str, confirm: &str) -> Result<(), ValidationError> {
    if new_password.is_empty() || confirm.is_empty() {
        return Err(ValidationError::PasswordCamposVacios);
    }
    if new_password != confirm {
        return Err(ValidationError::PasswordNoCoincide);
    }
    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordCorta);
    }
    Ok(())
}

impl NewIncidencia {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_motivo(&self.motivo)?;
        validate_fecha(&self.fecha)?;
        validate_hora("horaEntrada", self.hora_entrada.as_deref())?;
        validate_hora("horaSalida", self.hora_salida.as_deref())
    }
}

impl NewDiaEconomico {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_motivo(&self.motivo)?;
        validate_fecha(&self.fecha)
    }
}

impl NewDiaCumpleanos {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fecha(&self.fecha)?;
        validate_motivo(&self.motivo)
    }
}

impl NewPermiso {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_motivo(&self.motivo)?;
        validate_fecha(&self.fecha)?;
        validate_duracion(self.duracion)
    }
}

impl PasswordChange {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_password_change(&self.new_password, &self.confirm_password)
    }
}

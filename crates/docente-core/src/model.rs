//! Records exchanged with the portal backend.
//!
//! Every list held client-side is a cache of server state; nothing here is
//! authoritative.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of attendance exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TipoIncidencia {
    #[default]
    Retardo,
    RetardoMayor,
    SalidaAnticipada,
}

impl TipoIncidencia {
    pub const ALL: [TipoIncidencia; 3] = [
        TipoIncidencia::Retardo,
        TipoIncidencia::RetardoMayor,
        TipoIncidencia::SalidaAnticipada,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TipoIncidencia::Retardo => "retardo",
            TipoIncidencia::RetardoMayor => "retardo_mayor",
            TipoIncidencia::SalidaAnticipada => "salida_anticipada",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TipoIncidencia::Retardo => "Retardo (11-15 min)",
            TipoIncidencia::RetardoMayor => "Retardo mayor (16-20 min)",
            TipoIncidencia::SalidaAnticipada => "Salida anticipada",
        }
    }

    /// Minutes assumed when the form leaves `minutos` blank.
    pub fn minutos_estimados(self) -> u32 {
        match self {
            TipoIncidencia::Retardo => 15,
            TipoIncidencia::RetardoMayor => 20,
            TipoIncidencia::SalidaAnticipada => 30,
        }
    }
}

impl fmt::Display for TipoIncidencia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TipoIncidencia {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        TipoIncidencia::ALL
            .into_iter()
            .find(|tipo| tipo.as_str() == value.trim().to_ascii_lowercase())
            .ok_or_else(|| format!("Tipo de incidencia desconocido: '{value}'"))
    }
}

/// Cause of a special-permit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TipoPermiso {
    #[default]
    Paternidad,
    Defuncion,
    Titulacion,
}

impl TipoPermiso {
    pub const ALL: [TipoPermiso; 3] = [
        TipoPermiso::Paternidad,
        TipoPermiso::Defuncion,
        TipoPermiso::Titulacion,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TipoPermiso::Paternidad => "paternidad",
            TipoPermiso::Defuncion => "defuncion",
            TipoPermiso::Titulacion => "titulacion",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TipoPermiso::Paternidad => "Paternidad",
            TipoPermiso::Defuncion => "Defunción",
            TipoPermiso::Titulacion => "Titulación",
        }
    }
}

impl fmt::Display for TipoPermiso {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TipoPermiso {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        TipoPermiso::ALL
            .into_iter()
            .find(|tipo| tipo.as_str() == value.trim().to_ascii_lowercase())
            .ok_or_else(|| format!("Tipo de permiso desconocido: '{value}'"))
    }
}

/// Review status, transitioned server-side only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Estado {
    #[default]
    Pendiente,
    Aprobado,
    Rechazado,
}

impl Estado {
    pub fn label(self) -> &'static str {
        match self {
            Estado::Pendiente => "Pendiente",
            Estado::Aprobado => "Aprobado",
            Estado::Rechazado => "Rechazado",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incidencia {
    pub id: i64,
    #[serde(alias = "tipo_incidencia")]
    pub tipo: TipoIncidencia,
    #[serde(default)]
    pub motivo: String,
    pub fecha: String,
    #[serde(default)]
    pub estado: Estado,
    #[serde(default)]
    pub minutos: u32,
    #[serde(default, alias = "hora_entrada", rename = "horaEntrada")]
    pub hora_entrada: Option<String>,
    #[serde(default, alias = "hora_salida", rename = "horaSalida")]
    pub hora_salida: Option<String>,
    /// Location of the uploaded justification, when the server kept one.
    #[serde(default)]
    pub imagen_url: Option<String>,
    #[serde(default)]
    pub justificaciones: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiaEconomico {
    pub id: i64,
    #[serde(default)]
    pub motivo: String,
    pub fecha: String,
    #[serde(default)]
    pub estado: Estado,
    #[serde(default = "DiaEconomico::default_tipo")]
    pub tipo: String,
}

impl DiaEconomico {
    pub const TIPO: &'static str = "economico";

    fn default_tipo() -> String {
        Self::TIPO.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermisoEspecial {
    pub id: i64,
    #[serde(alias = "tipo_permiso")]
    pub tipo: TipoPermiso,
    #[serde(default)]
    pub motivo: String,
    pub fecha: String,
    #[serde(default = "PermisoEspecial::default_duracion", alias = "duracion_dias")]
    pub duracion: u32,
    #[serde(default)]
    pub estado: Estado,
}

impl PermisoEspecial {
    const fn default_duracion() -> u32 {
        1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiaCumpleanos {
    pub id: i64,
    #[serde(alias = "fecha_disfrute")]
    pub fecha: String,
    #[serde(default)]
    pub motivo: String,
    #[serde(default)]
    pub estado: Estado,
}

/// Aggregate counters, recomputed by the backend on every load.
///
/// `dias_disponibles` is opaque: the yearly quota rule lives server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    #[serde(default)]
    pub total_incidencias: u32,
    #[serde(default)]
    pub incidencias_pendientes: u32,
    #[serde(default)]
    pub dias_economicos_usados: u32,
    #[serde(default)]
    pub dias_disponibles: u32,
    #[serde(default = "Stats::default_dias_cumpleanos")]
    pub dias_cumpleanos: u32,
}

impl Stats {
    const fn default_dias_cumpleanos() -> u32 {
        1
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            total_incidencias: 0,
            incidencias_pendientes: 0,
            dias_economicos_usados: 0,
            dias_disponibles: 0,
            dias_cumpleanos: Self::default_dias_cumpleanos(),
        }
    }
}

/// Docente profile as returned by `/docente/api/docentes/:id`.
///
/// Only the fields the dashboard renders are typed; the rest is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DocenteProfile {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub apellido: Option<String>,
    #[serde(default)]
    pub nombre_completo: Option<String>,
    #[serde(default)]
    pub correo_institucional: Option<String>,
    #[serde(default)]
    pub tipo_contrato: Option<String>,
    #[serde(default)]
    pub docencia: Option<String>,
    #[serde(default, alias = "cumpleaños")]
    pub cumpleanos: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DocenteProfile {
    pub fn display_name(&self) -> String {
        if let Some(full) = self.nombre_completo.as_deref().filter(|s| !s.trim().is_empty()) {
            return full.trim().to_string();
        }
        let parts: Vec<&str> = [self.nombre.as_deref(), self.apellido.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            "Docente".to_string()
        } else {
            parts.join(" ")
        }
    }
}

/// Body of a new incidence, as sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIncidencia {
    pub tipo: TipoIncidencia,
    pub motivo: String,
    pub fecha: String,
    pub minutos: u32,
    #[serde(rename = "horaEntrada")]
    pub hora_entrada: Option<String>,
    #[serde(rename = "horaSalida")]
    pub hora_salida: Option<String>,
    pub docente_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewDiaEconomico {
    pub motivo: String,
    pub fecha: String,
    pub tipo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewDiaCumpleanos {
    pub fecha: String,
    pub motivo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPermiso {
    pub tipo: TipoPermiso,
    pub motivo: String,
    pub fecha: String,
    pub duracion: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordChange {
    pub docente_id: i64,
    #[serde(rename = "newPassword")]
    pub new_password: String,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incidencia_accepts_server_column_names() {
        let raw = r#"{
            "id": 7,
            "tipo_incidencia": "retardo_mayor",
            "motivo": "Tráfico",
            "fecha": "2024-01-15",
            "estado": "aprobado",
            "minutos": 18,
            "hora_entrada": "08:18",
            "hora_salida": null
        }"#;
        let parsed: Incidencia = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.tipo, TipoIncidencia::RetardoMayor);
        assert_eq!(parsed.estado, Estado::Aprobado);
        assert_eq!(parsed.hora_entrada.as_deref(), Some("08:18"));
        assert!(parsed.hora_salida.is_none());
    }

    #[test]
    fn missing_estado_defaults_to_pendiente() {
        let raw = r#"{"id": 1, "tipo": "retardo", "fecha": "2024-01-15"}"#;
        let parsed: Incidencia = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.estado, Estado::Pendiente);
        assert_eq!(parsed.minutos, 0);
    }

    #[test]
    fn new_incidencia_uses_camel_case_hours() {
        let body = NewIncidencia {
            tipo: TipoIncidencia::Retardo,
            motivo: "Tráfico".into(),
            fecha: "2024-01-15".into(),
            minutos: 15,
            hora_entrada: Some("08:10".into()),
            hora_salida: None,
            docente_id: Some(3),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["tipo"], "retardo");
        assert_eq!(value["horaEntrada"], "08:10");
        assert!(value["horaSalida"].is_null());
    }

    #[test]
    fn stats_parse_camel_case() {
        let raw = r#"{"totalIncidencias": 4, "incidenciasPendientes": 2, "diasEconomicosUsados": 1, "diasDisponibles": 14}"#;
        let stats: Stats = serde_json::from_str(raw).unwrap();
        assert_eq!(stats.total_incidencias, 4);
        assert_eq!(stats.dias_disponibles, 14);
        assert_eq!(stats.dias_cumpleanos, 1);
    }

    #[test]
    fn tipo_parsing_is_case_insensitive() {
        assert_eq!("Salida_Anticipada".parse::<TipoIncidencia>(), Ok(TipoIncidencia::SalidaAnticipada));
        assert!("vacaciones".parse::<TipoPermiso>().is_err());
    }

    #[test]
    fn profile_display_name_prefers_full_name() {
        let mut profile = DocenteProfile {
            nombre: Some("Ana".into()),
            apellido: Some("López".into()),
            ..DocenteProfile::default()
        };
        assert_eq!(profile.display_name(), "Ana López");
        profile.nombre_completo = Some("Ana María López".into());
        assert_eq!(profile.display_name(), "Ana María López");
    }
}

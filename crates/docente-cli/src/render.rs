//! Plain-text rendering of the portal screens.

use std::fmt::Write;

use docente_core::error::SESSION_EXPIRED_MESSAGE;
use docente_core::format::{format_fecha, minutos_label};
use docente_core::model::{DocenteProfile, Stats};
use docente_core::repository::{DataSource, PortalSnapshot};

pub fn render_snapshot(snapshot: &PortalSnapshot) -> String {
    let mut out = String::new();

    match snapshot.source {
        DataSource::Fallback => {
            let _ = writeln!(
                out,
                "Aviso: no se pudo conectar con el servidor; se muestran datos de ejemplo."
            );
        }
        DataSource::Partial => {
            let _ = writeln!(out, "Aviso: algunos datos no se pudieron actualizar:");
            for failure in &snapshot.failures {
                let _ = writeln!(out, "  - {failure}");
            }
        }
        DataSource::SessionExpired => {
            let _ = writeln!(out, "Aviso: {SESSION_EXPIRED_MESSAGE}");
            let _ = writeln!(out, "Se muestran los últimos datos cargados.");
        }
        DataSource::Live | DataSource::Empty => {}
    }

    out.push_str(&render_stats(&snapshot.stats));

    let _ = writeln!(out, "\nIncidencias ({})", snapshot.incidencias.len());
    if snapshot.incidencias.is_empty() {
        let _ = writeln!(out, "  (sin registros)");
    }
    for inc in &snapshot.incidencias {
        let _ = writeln!(
            out,
            "  #{id:<5} {fecha:<10}  {tipo:<25}  {minutos:<11}  {estado:<9}  {motivo}",
            id = inc.id,
            fecha = format_fecha(&inc.fecha),
            tipo = inc.tipo.label(),
            minutos = minutos_label(inc.minutos),
            estado = inc.estado.label(),
            motivo = inc.motivo,
        );
    }

    let _ = writeln!(out, "\nDías económicos ({})", snapshot.dias_economicos.len());
    if snapshot.dias_economicos.is_empty() {
        let _ = writeln!(out, "  (sin registros)");
    }
    for dia in &snapshot.dias_economicos {
        let _ = writeln!(
            out,
            "  #{id:<5} {fecha:<10}  {estado:<9}  {motivo}",
            id = dia.id,
            fecha = format_fecha(&dia.fecha),
            estado = dia.estado.label(),
            motivo = dia.motivo,
        );
    }

    let _ = writeln!(
        out,
        "\nPermisos especiales ({})",
        snapshot.permisos_especiales.len()
    );
    if snapshot.permisos_especiales.is_empty() {
        let _ = writeln!(out, "  (sin registros)");
    }
    for permiso in &snapshot.permisos_especiales {
        let _ = writeln!(
            out,
            "  #{id:<5} {fecha:<10}  {tipo:<12}  {dias} día(s)  {estado:<9}  {motivo}",
            id = permiso.id,
            fecha = format_fecha(&permiso.fecha),
            tipo = permiso.tipo.label(),
            dias = permiso.duracion,
            estado = permiso.estado.label(),
            motivo = permiso.motivo,
        );
    }

    let _ = writeln!(
        out,
        "\nDías de cumpleaños ({})",
        snapshot.dias_cumpleanos.len()
    );
    if snapshot.dias_cumpleanos.is_empty() {
        let _ = writeln!(out, "  (sin registros)");
    }
    for dia in &snapshot.dias_cumpleanos {
        let _ = writeln!(
            out,
            "  #{id:<5} {fecha:<10}  {estado:<9}  {motivo}",
            id = dia.id,
            fecha = format_fecha(&dia.fecha),
            estado = dia.estado.label(),
            motivo = dia.motivo,
        );
    }

    out
}

pub fn render_stats(stats: &Stats) -> String {
    format!(
        "Incidencias: {total} ({pendientes} pendientes) | Días económicos usados: {usados} | Disponibles: {disponibles} | Cumpleaños: {cumple}\n",
        total = stats.total_incidencias,
        pendientes = stats.incidencias_pendientes,
        usados = stats.dias_economicos_usados,
        disponibles = stats.dias_disponibles,
        cumple = stats.dias_cumpleanos,
    )
}

pub fn render_profile(profile: &DocenteProfile) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", profile.display_name());
    let rows = [
        ("ID", profile.id.map(|id| id.to_string())),
        ("Correo", profile.correo_institucional.clone()),
        ("Contrato", profile.tipo_contrato.clone()),
        ("Docencia", profile.docencia.clone()),
        ("Cumpleaños", profile.cumpleanos.as_deref().map(format_fecha)),
    ];
    for (label, value) in rows {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            let _ = writeln!(out, "  {label:<11} {value}");
        }
    }
    out
}

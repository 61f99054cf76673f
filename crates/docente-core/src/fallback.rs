//! Sample records shown when the backend cannot be reached at all, so the
//! screens stay populated in demo/offline mode.

use crate::model::{
    DiaEconomico, Estado, Incidencia, PermisoEspecial, Stats, TipoIncidencia, TipoPermiso,
};

pub fn sample_incidencias() -> Vec<Incidencia> {
    vec![
        sample_incidencia(1, TipoIncidencia::Retardo, "Tráfico pesado", "2024-01-15", Estado::Aprobado, 15),
        sample_incidencia(2, TipoIncidencia::SalidaAnticipada, "Cita médica", "2024-01-20", Estado::Pendiente, 30),
        sample_incidencia(3, TipoIncidencia::RetardoMayor, "Problemas familiares", "2024-02-01", Estado::Aprobado, 18),
    ]
}

pub fn sample_dias_economicos() -> Vec<DiaEconomico> {
    vec![
        DiaEconomico {
            id: 1,
            motivo: "Vacaciones familiares".to_string(),
            fecha: "2024-01-10".to_string(),
            estado: Estado::Aprobado,
            tipo: DiaEconomico::TIPO.to_string(),
        },
        DiaEconomico {
            id: 2,
            motivo: "Descanso personal".to_string(),
            fecha: "2024-02-05".to_string(),
            estado: Estado::Pendiente,
            tipo: DiaEconomico::TIPO.to_string(),
        },
    ]
}

pub fn sample_permisos_especiales() -> Vec<PermisoEspecial> {
    vec![PermisoEspecial {
        id: 1,
        tipo: TipoPermiso::Paternidad,
        motivo: "Permiso de paternidad".to_string(),
        fecha: "2024-03-01".to_string(),
        duracion: 1,
        estado: Estado::Aprobado,
    }]
}

/// Counters matching the sample lists: one approved economic day out of a
/// fifteen-day quota.
pub fn sample_stats() -> Stats {
    Stats {
        total_incidencias: 3,
        incidencias_pendientes: 1,
        dias_economicos_usados: 1,
        dias_disponibles: 14,
        dias_cumpleanos: 1,
    }
}

fn sample_incidencia(
    id: i64,
    tipo: TipoIncidencia,
    motivo: &str,
    fecha: &str,
    estado: Estado,
    minutos: u32,
) -> Incidencia {
    Incidencia {
        id,
        tipo,
        motivo: motivo.to_string(),
        fecha: fecha.to_string(),
        estado,
        minutos,
        hora_entrada: None,
        hora_salida: None,
        imagen_url: None,
        justificaciones: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_stats_agree_with_sample_lists() {
        let stats = sample_stats();
        let incidencias = sample_incidencias();
        assert_eq!(stats.total_incidencias as usize, incidencias.len());
        assert_eq!(
            stats.incidencias_pendientes as usize,
            incidencias.iter().filter(|i| i.estado == Estado::Pendiente).count()
        );
        assert_eq!(
            stats.dias_economicos_usados as usize,
            sample_dias_economicos()
                .iter()
                .filter(|d| d.estado == Estado::Aprobado)
                .count()
        );
    }
}

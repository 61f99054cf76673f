use clap::Parser;
use docente_cli::cli_args::{
    Cli, Command, ConfigCommand, CumpleanosCommand, DiaEconomicoCommand, IncidenciaCommand,
    SessionCommand,
};
use docente_core::dashboard::ActiveTab;
use docente_core::model::{TipoIncidencia, TipoPermiso};

// Argument parsing for every subcommand the terminal front-end exposes.

#[test]
fn test_incidencia_create_full() {
    let cli = Cli::try_parse_from([
        "docente",
        "incidencia",
        "create",
        "--tipo",
        "retardo_mayor",
        "--motivo",
        "Tráfico",
        "--fecha",
        "2024-01-15",
        "--hora-entrada",
        "08:18",
        "--imagen",
        "/tmp/evidencia.jpg",
    ])
    .expect("valid invocation");

    match cli.command {
        Command::Incidencia(IncidenciaCommand::Create(args)) => {
            assert_eq!(args.tipo, TipoIncidencia::RetardoMayor);
            assert_eq!(args.motivo, "Tráfico");
            assert_eq!(args.fecha.as_deref(), Some("2024-01-15"));
            assert_eq!(args.hora_entrada.as_deref(), Some("08:18"));
            assert!(args.hora_salida.is_none());
            assert!(args.minutos.is_none(), "minutos should default to the type estimate");
            assert!(args.imagen.is_some());
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_incidencia_rejects_unknown_tipo() {
    let result = Cli::try_parse_from([
        "docente",
        "incidencia",
        "create",
        "--tipo",
        "ausencia",
        "--motivo",
        "x",
    ]);
    assert!(result.is_err(), "unknown incidence types must be rejected");
}

#[test]
fn test_incidencia_delete_alias() {
    let cli = Cli::try_parse_from(["docente", "incidencia", "remove", "42"]).expect("alias");
    assert!(matches!(
        cli.command,
        Command::Incidencia(IncidenciaCommand::Delete(ref args)) if args.id == 42
    ));
}

#[test]
fn test_permiso_defaults_to_one_day() {
    let cli = Cli::try_parse_from([
        "docente",
        "permiso",
        "--tipo",
        "titulacion",
        "--motivo",
        "Ceremonia",
    ])
    .expect("valid invocation");
    match cli.command {
        Command::Permiso(args) => {
            assert_eq!(args.tipo, TipoPermiso::Titulacion);
            assert_eq!(args.duracion, 1);
            assert!(args.fecha.is_none());
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_cumpleanos_requires_fecha() {
    assert!(Cli::try_parse_from(["docente", "cumpleanos", "create"]).is_err());
    let cli = Cli::try_parse_from(["docente", "cumpleanos", "create", "--fecha", "2024-05-10"])
        .expect("valid invocation");
    assert!(matches!(
        cli.command,
        Command::Cumpleanos(CumpleanosCommand::Create(ref args)) if args.motivo.is_none()
    ));
}

#[test]
fn test_dia_economico_subcommand_name() {
    let cli = Cli::try_parse_from(["docente", "dia-economico", "add", "--motivo", "Trámite"])
        .expect("kebab-case subcommand");
    assert!(matches!(
        cli.command,
        Command::DiaEconomico(DiaEconomicoCommand::Create(_))
    ));
}

#[test]
fn test_leave_requests_can_be_cancelled() {
    let cli = Cli::try_parse_from(["docente", "dia-economico", "delete", "12"]).expect("delete");
    assert!(matches!(
        cli.command,
        Command::DiaEconomico(DiaEconomicoCommand::Delete(ref args)) if args.id == 12
    ));

    let cli = Cli::try_parse_from(["docente", "cumpleanos", "remove", "3"]).expect("alias");
    assert!(matches!(
        cli.command,
        Command::Cumpleanos(CumpleanosCommand::Delete(ref args)) if args.id == 3
    ));

    assert!(Cli::try_parse_from(["docente", "cumpleanos", "delete"]).is_err());
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "docente",
        "list",
        "--base-url",
        "http://10.0.0.5:5000",
        "--verbose",
    ])
    .expect("global flags");
    assert!(cli.verbose);
    assert_eq!(cli.base_url.as_deref(), Some("http://10.0.0.5:5000"));
    assert!(matches!(cli.command, Command::List));
}

#[test]
fn test_dashboard_tab() {
    let cli = Cli::try_parse_from(["docente", "dashboard", "--tab", "profile"]).expect("tab");
    match cli.command {
        Command::Dashboard(args) => assert_eq!(args.tab, Some(ActiveTab::Profile)),
        other => panic!("unexpected command {other:?}"),
    }
    let cli = Cli::try_parse_from(["docente", "dashboard"]).expect("no tab");
    assert!(matches!(cli.command, Command::Dashboard(ref args) if args.tab.is_none()));
}

#[test]
fn test_password_flags() {
    let cli = Cli::try_parse_from([
        "docente",
        "password",
        "--new",
        "nuevaClave1",
        "--confirm",
        "nuevaClave1",
    ])
    .expect("password flags");
    match cli.command {
        Command::Password(args) => {
            assert_eq!(args.new_password.as_deref(), Some("nuevaClave1"));
            assert_eq!(args.confirm_password.as_deref(), Some("nuevaClave1"));
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_session_and_config_subcommands() {
    let cli = Cli::try_parse_from(["docente", "session", "set-docente", "7"]).expect("session");
    assert!(matches!(
        cli.command,
        Command::Session(SessionCommand::SetDocente { id: 7 })
    ));

    let cli = Cli::try_parse_from(["docente", "session", "set-token"]).expect("prompted token");
    assert!(matches!(
        cli.command,
        Command::Session(SessionCommand::SetToken { value: None })
    ));

    let cli = Cli::try_parse_from(["docente", "config", "set-url", "https://portal.example.mx"])
        .expect("config");
    assert!(matches!(
        cli.command,
        Command::Config(ConfigCommand::SetUrl { ref url }) if url == "https://portal.example.mx"
    ));
}

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use docente_core::dashboard::ActiveTab;
use docente_core::model::{TipoIncidencia, TipoPermiso};

/// Terminal front-end for the docente portal.
#[derive(Parser, Debug, Clone)]
#[command(name = "docente", version, about, long_about = None)]
pub struct Cli {
    /// Backend base URL for this run only (overrides config and DOCENTE_PORTAL_URL).
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Mirror log output to stderr.
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Load the docente profile and show one dashboard tab.
    Dashboard(DashboardArgs),
    /// Fetch every list plus the counters.
    #[command(alias = "ls")]
    List,
    /// Create or delete attendance incidences.
    #[command(subcommand)]
    Incidencia(IncidenciaCommand),
    /// Request or cancel economic leave days.
    #[command(subcommand)]
    DiaEconomico(DiaEconomicoCommand),
    /// Request or cancel the birthday leave day.
    #[command(subcommand)]
    Cumpleanos(CumpleanosCommand),
    /// Request a special permit.
    Permiso(PermisoArgs),
    /// Change the account password.
    Password(PasswordArgs),
    /// Inspect or edit the locally stored session.
    #[command(subcommand)]
    Session(SessionCommand),
    /// Inspect or edit config.toml.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Clone, Args, Default)]
pub struct DashboardArgs {
    /// Tab to render (profile or incidencias); defaults to ui.default_tab.
    #[arg(long, value_name = "TAB")]
    pub tab: Option<ActiveTab>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum IncidenciaCommand {
    /// Report a late arrival or early departure.
    #[command(alias = "add")]
    Create(IncidenciaCreateArgs),
    /// Delete a pending incidence by ID.
    #[command(alias = "remove")]
    Delete(IncidenciaDeleteArgs),
}

#[derive(Debug, Clone, Args)]
pub struct IncidenciaCreateArgs {
    /// retardo, retardo_mayor or salida_anticipada.
    #[arg(long, value_name = "TIPO")]
    pub tipo: TipoIncidencia,

    /// Reason shown to the approver.
    #[arg(long)]
    pub motivo: String,

    /// Date (YYYY-MM-DD); defaults to today.
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub fecha: Option<String>,

    /// Arrival time (HH:MM).
    #[arg(long, value_name = "HH:MM")]
    pub hora_entrada: Option<String>,

    /// Departure time (HH:MM).
    #[arg(long, value_name = "HH:MM")]
    pub hora_salida: Option<String>,

    /// Minutes involved; defaults to the type's estimate.
    #[arg(long, value_parser = clap::value_parser!(u32))]
    pub minutos: Option<u32>,

    /// Justification image to upload.
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub imagen: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct IncidenciaDeleteArgs {
    /// Incidence ID as shown by `docente list`.
    pub id: i64,
}

#[derive(Debug, Clone, Subcommand)]
pub enum DiaEconomicoCommand {
    /// Request an economic leave day.
    #[command(alias = "add")]
    Create(DiaEconomicoArgs),
    /// Cancel a pending request by ID.
    #[command(alias = "remove")]
    Delete(RequestIdArgs),
}

#[derive(Debug, Clone, Subcommand)]
pub enum CumpleanosCommand {
    /// Request the birthday leave day.
    #[command(alias = "add")]
    Create(CumpleanosArgs),
    /// Cancel a pending request by ID.
    #[command(alias = "remove")]
    Delete(RequestIdArgs),
}

#[derive(Debug, Clone, Args)]
pub struct RequestIdArgs {
    /// Request ID as shown by `docente list`.
    pub id: i64,
}

#[derive(Debug, Clone, Args)]
pub struct DiaEconomicoArgs {
    #[arg(long)]
    pub motivo: String,

    /// Date (YYYY-MM-DD); defaults to today.
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub fecha: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct CumpleanosArgs {
    /// Day to take off (YYYY-MM-DD).
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub fecha: String,

    /// Overrides the contract clause text.
    #[arg(long)]
    pub motivo: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct PermisoArgs {
    /// paternidad, defuncion or titulacion.
    #[arg(long, value_name = "TIPO")]
    pub tipo: TipoPermiso,

    #[arg(long)]
    pub motivo: String,

    /// First day (YYYY-MM-DD); defaults to today.
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub fecha: Option<String>,

    /// Days requested.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32))]
    pub duracion: u32,
}

#[derive(Debug, Clone, Args, Default)]
pub struct PasswordArgs {
    /// New password; prompted when omitted.
    #[arg(long = "new", value_name = "PASSWORD")]
    pub new_password: Option<String>,

    /// Confirmation; prompted when omitted.
    #[arg(long = "confirm", value_name = "PASSWORD")]
    pub confirm_password: Option<String>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum SessionCommand {
    /// Store the session blob or bare access token (prompted when omitted).
    SetToken {
        /// JSON session blob or bare token.
        value: Option<String>,
    },
    /// Store the docente ID used by the dashboard.
    SetDocente {
        id: i64,
    },
    /// Print what is stored, without revealing the token.
    Show,
    /// Remove the token and docente ID.
    Clear,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration.
    Show,
    /// Persist a new backend base URL.
    SetUrl {
        url: String,
    },
}

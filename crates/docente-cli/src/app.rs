//! Wires config, session store and backend together and runs one command.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::Local;
use docente_core::attachment::ImageSource;
use docente_core::auth::TokenAccessor;
use docente_core::backend::{HttpBackend, PortalBackend};
use docente_core::config::{
    FileConfig, SessionBackend, SessionPreferences, config_path, load_config, load_config_from,
    save_config,
};
use docente_core::dashboard::{ActiveTab, DashboardState, DashboardView};
use docente_core::forms::{
    CumpleanosDraft, DiaEconomicoDraft, FormController, IncidenciaDraft, PermisoDraft,
};
use docente_core::logging::current_log_path;
use docente_core::repository::IncidenceRepository;
use docente_core::session_store::{
    FileStore, KeyValueStore, KeyringStore, StoreError, read_docente_id,
};
use rpassword::prompt_password;
use tracing::info;

use crate::cli_args::{
    Cli, Command, ConfigCommand, CumpleanosCommand, DashboardArgs, DiaEconomicoCommand,
    IncidenciaCommand, PasswordArgs, SessionCommand,
};
use crate::render::{render_profile, render_snapshot};

/// Everything a command needs to talk to the portal.
pub struct Portal {
    pub config: FileConfig,
    pub store: Arc<dyn KeyValueStore>,
    pub tokens: TokenAccessor,
    pub backend: Arc<dyn PortalBackend>,
}

impl Portal {
    pub fn connect(config: FileConfig) -> Result<Self> {
        let store = open_store(&config.session);
        let tokens = TokenAccessor::new(store.clone(), config.session.token_key.clone());
        let backend = HttpBackend::new(&config.backend, tokens.clone())
            .context("failed to build HTTP client")?;
        Ok(Self {
            config,
            store,
            tokens,
            backend: Arc::new(backend),
        })
    }

    pub fn docente_id(&self) -> Result<i64, StoreError> {
        read_docente_id(self.store.as_ref(), &self.config.session.docente_id_key)
    }

    pub fn repository(&self) -> Arc<IncidenceRepository> {
        Arc::new(
            IncidenceRepository::new(self.backend.clone()).with_docente_id(self.docente_id().ok()),
        )
    }

    pub fn dashboard(&self) -> DashboardView {
        DashboardView::new(
            self.backend.clone(),
            self.store.clone(),
            self.config.session.docente_id_key.clone(),
        )
    }
}

pub fn open_store(prefs: &SessionPreferences) -> Arc<dyn KeyValueStore> {
    match prefs.store {
        SessionBackend::File => Arc::new(FileStore::default_location()),
        SessionBackend::Keyring => Arc::new(KeyringStore::new()),
    }
}

/// Load config.toml (plus env overrides) and apply `--base-url`.
pub fn resolve_config(base_url: Option<&str>) -> Result<FileConfig> {
    let load = load_config();
    for warning in &load.warnings {
        eprintln!("Warning: {warning}");
    }
    let mut config = load.config;
    if let Some(url) = base_url {
        config
            .backend
            .set_base_url(url)
            .with_context(|| format!("invalid --base-url '{url}'"))?;
    }
    Ok(config)
}

pub fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

pub async fn dispatch(cli: Cli) -> Result<()> {
    if let Command::Config(cmd) = &cli.command {
        return handle_config_command(cmd.clone(), cli.base_url.as_deref());
    }

    let config = resolve_config(cli.base_url.as_deref())?;
    let portal = Portal::connect(config)?;
    info!(base_url = %portal.config.backend.base_url, "Portal client ready");

    match cli.command {
        Command::Dashboard(args) => run_dashboard(&portal, args).await,
        Command::List => {
            let snapshot = portal.repository().load_all().await;
            print!("{}", render_snapshot(&snapshot));
            Ok(())
        }
        Command::Incidencia(IncidenciaCommand::Create(args)) => {
            let imagen = args
                .imagen
                .as_deref()
                .map(ImageSource::from_path)
                .transpose()?;
            let form = FormController::<IncidenciaDraft>::new(portal.repository());
            form.open();
            form.edit(|draft| {
                draft.tipo = args.tipo;
                draft.motivo = args.motivo;
                draft.fecha = args.fecha.unwrap_or_else(today);
                draft.minutos = args.minutos;
                draft.hora_entrada = args.hora_entrada;
                draft.hora_salida = args.hora_salida;
                draft.imagen = imagen;
            });
            let created = form.submit().await?;
            println!(
                "Incidencia #{} registrada ({}).",
                created.id,
                created.estado.label()
            );
            Ok(())
        }
        Command::Incidencia(IncidenciaCommand::Delete(args)) => {
            let repo = portal.repository();
            repo.delete_incidencia(args.id).await?;
            repo.load_all().await;
            println!("Incidencia #{} eliminada.", args.id);
            Ok(())
        }
        Command::DiaEconomico(DiaEconomicoCommand::Create(args)) => {
            let form = FormController::<DiaEconomicoDraft>::new(portal.repository());
            form.open();
            form.edit(|draft| {
                draft.motivo = args.motivo;
                draft.fecha = args.fecha.unwrap_or_else(today);
            });
            let created = form.submit().await?;
            println!(
                "Día económico #{} solicitado ({}).",
                created.id,
                created.estado.label()
            );
            Ok(())
        }
        Command::DiaEconomico(DiaEconomicoCommand::Delete(args)) => {
            let repo = portal.repository();
            repo.load_all().await;
            repo.delete_dia_economico(args.id).await?;
            repo.load_all().await;
            println!("Solicitud de día económico #{} eliminada.", args.id);
            Ok(())
        }
        Command::Cumpleanos(CumpleanosCommand::Create(args)) => {
            let form = FormController::<CumpleanosDraft>::new(portal.repository());
            form.open();
            form.edit(|draft| {
                draft.fecha = args.fecha;
                if let Some(motivo) = args.motivo {
                    draft.motivo = motivo;
                }
            });
            let created = form.submit().await?;
            println!(
                "Día de cumpleaños #{} solicitado ({}).",
                created.id,
                created.estado.label()
            );
            Ok(())
        }
        Command::Cumpleanos(CumpleanosCommand::Delete(args)) => {
            let repo = portal.repository();
            repo.load_all().await;
            repo.delete_dia_cumpleanos(args.id).await?;
            repo.load_all().await;
            println!("Solicitud de cumpleaños #{} eliminada.", args.id);
            Ok(())
        }
        Command::Permiso(args) => {
            let form = FormController::<PermisoDraft>::new(portal.repository());
            form.open();
            form.edit(|draft| {
                draft.tipo = args.tipo;
                draft.motivo = args.motivo;
                draft.fecha = args.fecha.unwrap_or_else(today);
                draft.duracion = args.duracion;
            });
            let created = form.submit().await?;
            println!(
                "Permiso especial #{} solicitado ({}).",
                created.id,
                created.estado.label()
            );
            Ok(())
        }
        Command::Password(args) => change_password(&portal, args).await,
        Command::Session(cmd) => handle_session_command(&portal, cmd),
        Command::Config(_) => Ok(()),
    }
}

async fn run_dashboard(portal: &Portal, args: DashboardArgs) -> Result<()> {
    let tab = args.tab.unwrap_or(portal.config.ui.default_tab);
    let view = portal.dashboard().with_tab(tab);
    let profile = match view.mount().await {
        DashboardState::Ready { profile, .. } => profile,
        DashboardState::Failed { message } => bail!(message),
        DashboardState::Loading => bail!("El panel se cerró antes de cargar"),
    };

    match view.active_tab() {
        ActiveTab::Profile => print!("{}", render_profile(&profile)),
        ActiveTab::Incidencias => {
            println!("Bienvenido(a), {}\n", profile.display_name());
            let snapshot = portal.repository().load_all().await;
            print!("{}", render_snapshot(&snapshot));
        }
    }
    view.unmount();
    Ok(())
}

async fn change_password(portal: &Portal, args: PasswordArgs) -> Result<()> {
    let new_password = match args.new_password {
        Some(value) => value,
        None => prompt_password("Nueva contraseña: ")?,
    };
    let confirm_password = match args.confirm_password {
        Some(value) => value,
        None => prompt_password("Confirmar contraseña: ")?,
    };
    let message = portal
        .dashboard()
        .change_password(&new_password, &confirm_password)
        .await?;
    println!("{message}");
    Ok(())
}

fn handle_session_command(portal: &Portal, command: SessionCommand) -> Result<()> {
    let docente_key = portal.config.session.docente_id_key.as_str();
    match command {
        SessionCommand::SetToken { value } => {
            let value = match value {
                Some(value) => value,
                None => prompt_password("Token de sesión: ")?,
            };
            let token = portal.tokens.store_session(&value)?;
            match token.expires_at {
                Some(expiry) => println!("Sesión guardada (expira {}).", expiry.with_timezone(&Local)),
                None => println!("Sesión guardada."),
            }
        }
        SessionCommand::SetDocente { id } => {
            portal.store.set(docente_key, &id.to_string())?;
            println!("ID de docente guardado: {id}");
        }
        SessionCommand::Show => {
            match portal.tokens.session() {
                Ok(token) => {
                    let state = if token.is_expired(chrono::Utc::now()) {
                        "expirada"
                    } else {
                        "vigente"
                    };
                    match token.expires_at {
                        Some(expiry) => println!(
                            "Token: presente ({state}, expira {})",
                            expiry.with_timezone(&Local)
                        ),
                        None => println!("Token: presente (sin expiración conocida)"),
                    }
                }
                Err(err) if err.is_missing() => println!("Token: no guardado"),
                Err(err) => println!("Token: inválido ({err})"),
            }
            match portal.docente_id() {
                Ok(id) => println!("ID de docente: {id}"),
                Err(err) if err.is_missing() => println!("ID de docente: no guardado"),
                Err(err) => println!("ID de docente: inválido ({err})"),
            }
        }
        SessionCommand::Clear => {
            portal.tokens.clear()?;
            portal.store.remove(docente_key)?;
            println!("Sesión eliminada.");
        }
    }
    Ok(())
}

fn handle_config_command(command: ConfigCommand, base_url: Option<&str>) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let config = resolve_config(base_url)?;
            println!("config: {}", config_path().display());
            println!("backend.base_url = {}", config.backend.base_url);
            match config.backend.request_timeout() {
                Some(timeout) => println!("backend.request_timeout_secs = {}", timeout.as_secs()),
                None => println!("backend.request_timeout_secs = (sin límite)"),
            }
            let store = match config.session.store {
                SessionBackend::File => "file",
                SessionBackend::Keyring => "keyring",
            };
            println!("session.store = {store}");
            println!("session.token_key = {}", config.session.token_key);
            println!("session.docente_id_key = {}", config.session.docente_id_key);
            println!("ui.default_tab = {}", config.ui.default_tab.as_str());
            if let Some(path) = current_log_path() {
                println!("log: {}", path.display());
            }
            Ok(())
        }
        ConfigCommand::SetUrl { url } => {
            let load = load_config_from(&config_path());
            for warning in &load.warnings {
                eprintln!("Warning: {warning}");
            }
            let mut config = load.config;
            config.backend.set_base_url(&url)?;
            save_config(&config)?;
            println!("backend.base_url = {}", config.backend.base_url);
            Ok(())
        }
    }
}

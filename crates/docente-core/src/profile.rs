use tracing::{info, instrument};

use crate::backend::PortalBackend;
use crate::error::PortalError;
use crate::model::PasswordChange;

/// Validate locally, then ask the backend to replace the password.
///
/// Returns the confirmation message to show the docente.
#[instrument(skip(backend, new_password, confirm_password))]
pub async fn change_password(
    backend: &dyn PortalBackend,
    docente_id: i64,
    new_password: &str,
    confirm_password: &str,
) -> Result<String, PortalError> {
    let body = PasswordChange {
        docente_id,
        new_password: new_password.to_string(),
        confirm_password: confirm_password.to_string(),
    };
    body.validate()?;
    let message = backend.change_password(&body).await?;
    info!("Password changed");
    Ok(message)
}

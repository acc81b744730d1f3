//! Admin gate for destructive actions.
//!
//! "Authorized" here means "an admin credential is present on this
//! machine": env var first, then the OS keychain. The gate fails closed
//! and never issues the protected call without a credential, but it is a
//! UX convenience layer only: the store request itself carries no proof
//! of authorization, so real enforcement must live server-side.

use thiserror::Error;

const ENV_KEY: &str = "MAGIC_ADMIN_KEY";
const KEYRING_SERVICE: &str = "magic-booth";
const KEYRING_USER: &str = "admin";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdminError {
    #[error("unauthorized: no admin credential on this machine")]
    Unauthorized,
}

/// The locally held credential, if any. Presence is all the gate checks;
/// validity is the server's problem.
pub fn stored_credential() -> Option<String> {
    if let Ok(key) = std::env::var(ENV_KEY) {
        if !key.is_empty() {
            return Some(key);
        }
    }
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER) {
        if let Ok(key) = entry.get_password() {
            if !key.is_empty() {
                log::info!("[ADMIN] credential loaded from OS keychain");
                return Some(key);
            }
        }
    }
    None
}

/// Persist the credential to the OS keychain.
pub fn save_credential(key: &str) -> Result<(), String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER)
        .map_err(|e| format!("Keyring error: {}", e))?;
    entry
        .set_password(key)
        .map_err(|e| format!("Failed to save credential: {}", e))?;
    log::info!("[ADMIN] credential saved to OS keychain");
    Ok(())
}

pub fn is_authorized() -> bool {
    stored_credential().is_some()
}

/// The gate decision itself, separated so it is checkable without
/// touching the environment.
pub fn authorize(credential: Option<&str>) -> Result<(), AdminError> {
    match credential {
        Some(_) => Ok(()),
        None => Err(AdminError::Unauthorized),
    }
}

/// Run `action` only when a credential is present; otherwise fail closed
/// before anything remote happens.
pub async fn require_authorized<T, F, Fut>(
    credential: Option<String>,
    action: F,
) -> Result<T, AdminError>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = T>,
{
    authorize(credential.as_deref())?;
    Ok(action().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn gate_blocks_and_never_runs_action_without_credential() {
        let ran = AtomicBool::new(false);
        let result = require_authorized(None, || async {
            ran.store(true, Ordering::SeqCst);
            42
        })
        .await;
        assert_eq!(result, Err(AdminError::Unauthorized));
        assert!(!ran.load(Ordering::SeqCst), "action ran despite missing credential");
    }

    #[tokio::test]
    async fn gate_runs_action_with_credential() {
        let ran = AtomicBool::new(false);
        let result = require_authorized(Some("magic".to_string()), || async {
            ran.store(true, Ordering::SeqCst);
            42
        })
        .await;
        assert_eq!(result, Ok(42));
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn authorize_checks_presence_only() {
        assert!(authorize(Some("anything")).is_ok());
        assert_eq!(authorize(None), Err(AdminError::Unauthorized));
    }
}

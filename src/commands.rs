//! Tauri command handlers.
//!
//! Thin wrappers that bridge frontend invoke() calls to the domain
//! modules. Each command does one thing; orchestration lives in the
//! domains (the workflow driver, the reconciliation loop).

use crate::admin;
use crate::booth::{self, BoothState, CaptureMode, Selection};
use crate::gallery::{Gallery, Photo};
use crate::store::PhotoStore;
use crate::workflow::{CaptureSession, KioskWorkflow};
use std::sync::Arc;

/// Tauri command: current gallery contents, newest first.
#[tauri::command]
pub fn get_gallery(gallery: tauri::State<'_, Arc<Gallery>>) -> Vec<Photo> {
    gallery.photos()
}

/// Tauri command: current mode/filter selection for the control panels.
#[tauri::command]
pub fn get_selection(booth: tauri::State<'_, BoothState>) -> Result<Selection, String> {
    Ok(booth.selection.lock().map_err(|e| e.to_string())?.clone())
}

/// Tauri command: switch capture mode.
///
/// The selection only moves once the service acknowledges. A failure is
/// logged and the previous selection returned: mode changes are
/// low-stakes and never block the kiosk.
#[tauri::command]
pub async fn set_capture_mode(
    booth: tauri::State<'_, BoothState>,
    mode: String,
) -> Result<Selection, String> {
    let mode =
        CaptureMode::parse(&mode).ok_or_else(|| format!("Unknown capture mode: {}", mode))?;
    match booth.client.set_mode(mode).await {
        Ok(()) => {
            let mut selection = booth.selection.lock().map_err(|e| e.to_string())?;
            selection.mode = mode;
            log::info!("[BOOTH] mode -> {}", mode.as_str());
            Ok(selection.clone())
        }
        Err(e) => {
            log::warn!("[BOOTH] set_mode failed, selection kept: {}", e);
            Ok(booth.selection.lock().map_err(|e| e.to_string())?.clone())
        }
    }
}

/// Tauri command: switch the visual filter. Same success-only update as
/// `set_capture_mode`.
#[tauri::command]
pub async fn set_capture_filter(
    booth: tauri::State<'_, BoothState>,
    filter: String,
) -> Result<Selection, String> {
    if !booth::is_known_filter(&filter) {
        return Err(format!("Unknown filter: {}", filter));
    }
    let filter = filter.to_ascii_uppercase();
    match booth.client.set_filter(&filter).await {
        Ok(()) => {
            let mut selection = booth.selection.lock().map_err(|e| e.to_string())?;
            selection.filter = filter;
            log::info!("[BOOTH] filter -> {}", selection.filter);
            Ok(selection.clone())
        }
        Err(e) => {
            log::warn!("[BOOTH] set_filter failed, selection kept: {}", e);
            Ok(booth.selection.lock().map_err(|e| e.to_string())?.clone())
        }
    }
}

/// Tauri command: queue a print job for an uploaded photo.
///
/// Fire-and-forget toward the spooler; repeatable from the review screen
/// without touching workflow state.
#[tauri::command]
pub async fn print_photo(
    booth: tauri::State<'_, BoothState>,
    image_url: String,
) -> Result<(), String> {
    booth.client.print(&image_url).await.map_err(|e| e.to_string())?;
    log::info!("[BOOTH] print job queued");
    Ok(())
}

/// Tauri command: probe the capture service.
#[tauri::command]
pub async fn booth_health(
    booth: tauri::State<'_, BoothState>,
) -> Result<booth::BoothHealth, String> {
    booth.client.health().await.map_err(|e| e.to_string())
}

/// Tauri command: start a capture session (countdown → shutter →
/// review). Refused while a session is live. Async so the session driver
/// lands on the app's runtime.
#[tauri::command]
pub async fn request_capture(flow: tauri::State<'_, KioskWorkflow>) -> Result<(), String> {
    flow.request_capture().map_err(|e| e.to_string())
}

/// Tauri command: abort a countdown in progress. Returns whether there
/// was one to abort.
#[tauri::command]
pub fn cancel_countdown(flow: tauri::State<'_, KioskWorkflow>) -> Result<bool, String> {
    Ok(flow.cancel_countdown())
}

/// Tauri command: close the review screen now.
#[tauri::command]
pub fn dismiss_review(flow: tauri::State<'_, KioskWorkflow>) -> Result<bool, String> {
    Ok(flow.dismiss_review())
}

/// Tauri command: current workflow session, for UI (re)loads.
#[tauri::command]
pub fn get_capture_session(flow: tauri::State<'_, KioskWorkflow>) -> Result<CaptureSession, String> {
    Ok(flow.session())
}

/// Tauri command: whether an admin credential is present here.
#[tauri::command]
pub fn admin_status() -> bool {
    admin::is_authorized()
}

/// Tauri command: save the admin credential to the OS keychain.
#[tauri::command]
pub fn save_admin_key(key: String) -> Result<(), String> {
    admin::save_credential(&key)
}

/// Tauri command: delete a photo from the store. Gated on the local
/// credential; the removal reaches the gallery back through the change
/// feed like any other delete.
#[tauri::command]
pub async fn delete_photo(store: tauri::State<'_, PhotoStore>, id: String) -> Result<(), String> {
    admin::require_authorized(admin::stored_credential(), || store.delete_photo(&id))
        .await
        .map_err(|e| e.to_string())?
        .map_err(|e| e.to_string())
}

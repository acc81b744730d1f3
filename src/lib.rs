//! Magic Booth — Tauri application entry point.
//!
//! This is the app shell that wires together all domains and commands.
//! No business logic lives here, only module declarations, state
//! management, the command registry, and the setup wiring that connects
//! the store's change feed to the gallery and the gallery's new-capture
//! signal to the workflow.
//!
//! The flow is:
//!   webview → commands.rs → booth/workflow/store → events → webview.

pub mod admin;
pub mod booth;
mod commands;
pub mod config;
pub mod gallery;
pub mod store;
pub mod workflow;

use crate::booth::{BoothClient, BoothState};
use crate::config::BoothConfig;
use crate::gallery::reconcile::{self, GalleryEvent};
use crate::gallery::Gallery;
use crate::store::PhotoStore;
use crate::workflow::{CaptureWorkflow, KioskWorkflow, WorkflowEvent};
use std::sync::Arc;
use tauri::Emitter;

/// Entry point — called by the Tauri runtime.
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Load .env.local → .env from the project root. Uses
    // CARGO_MANIFEST_DIR so the kiosk's working directory doesn't matter.
    let manifest_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    'env_load: for env_file in [".env.local", ".env"] {
        let path = manifest_dir.join(env_file);
        if path.exists() {
            match dotenvy::from_path(&path) {
                Ok(_) => eprintln!("[STARTUP] Loaded {}", path.display()),
                Err(e) => eprintln!("[STARTUP] Failed to load {}: {}", path.display(), e),
            }
            break 'env_load;
        }
    }

    env_logger::init();

    let config = BoothConfig::from_env();
    let booth_client = BoothClient::new(&config);
    let store = PhotoStore::new(&config);
    let gallery = Arc::new(Gallery::new());
    let flow: KioskWorkflow =
        CaptureWorkflow::new(Arc::new(booth_client.clone()), Arc::clone(&gallery));

    tauri::Builder::default()
        .manage(BoothState::new(booth_client))
        .manage(store.clone())
        .manage(Arc::clone(&gallery))
        .manage(flow.clone())
        .invoke_handler(tauri::generate_handler![
            // Gallery (commands.rs)
            commands::get_gallery,
            commands::delete_photo,
            // Booth controls (commands.rs)
            commands::get_selection,
            commands::set_capture_mode,
            commands::set_capture_filter,
            commands::print_photo,
            commands::booth_health,
            // Capture workflow (commands.rs)
            commands::request_capture,
            commands::cancel_countdown,
            commands::dismiss_review,
            commands::get_capture_session,
            // Admin (commands.rs)
            commands::admin_status,
            commands::save_admin_key,
        ])
        .setup(move |app| {
            log::info!("Magic Booth starting up");

            if !config.store_configured() {
                log::warn!(
                    "[STORE] MAGIC_STORE_URL/MAGIC_STORE_KEY not set — gallery starts empty"
                );
            }

            // Workflow events → webview.
            let handle = app.handle().clone();
            let flow_events = flow.subscribe();
            tauri::async_runtime::spawn(forward_workflow_events(handle, flow_events));

            // Snapshot first, then the live feed. All gallery mutation
            // after this point happens on the reconciliation loop, in
            // arrival order.
            let handle = app.handle().clone();
            let gallery = Arc::clone(&gallery);
            let store = store.clone();
            let flow = flow.clone();
            tauri::async_runtime::spawn(async move {
                match store.load_snapshot().await {
                    Ok(photos) => {
                        gallery.load_snapshot(photos);
                        log::info!("[GALLERY] snapshot loaded, {} photos", gallery.len());
                        let _ = handle.emit("gallery-refresh", gallery.photos());
                    }
                    Err(e) => {
                        // Keep the (empty) previous state; the feed still
                        // delivers anything captured from here on.
                        log::error!("[STORE] snapshot load failed: {}", e);
                    }
                }

                let (sink, gallery_events) = tokio::sync::broadcast::channel(64);
                let feed = store.subscribe();
                tauri::async_runtime::spawn(forward_gallery_events(
                    handle,
                    flow,
                    gallery_events,
                ));
                reconcile::run(gallery, feed, sink).await;
            });

            log::info!("Kiosk window ready — gallery live");
            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("Error running Magic Booth");
}

/// Translate reconciliation-loop events into webview notifications, and
/// route the new-capture signal into the workflow's review screen.
async fn forward_gallery_events(
    app: tauri::AppHandle,
    flow: KioskWorkflow,
    mut events: tokio::sync::broadcast::Receiver<GalleryEvent>,
) {
    loop {
        match events.recv().await {
            Ok(GalleryEvent::Inserted { photo, new_capture }) => {
                if new_capture {
                    flow.on_new_capture(&photo);
                }
                let _ = app.emit("gallery-photo-added", &photo);
            }
            Ok(GalleryEvent::Deleted { id }) => {
                let _ = app.emit("gallery-photo-removed", &id);
            }
            Ok(GalleryEvent::FeedLost { reason }) => {
                let _ = app.emit("gallery-feed-lost", &reason);
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                log::warn!("[GALLERY] event forwarder lagged by {}", n);
            }
            Err(_) => break,
        }
    }
}

/// Translate workflow events into webview notifications.
async fn forward_workflow_events(
    app: tauri::AppHandle,
    mut events: tokio::sync::broadcast::Receiver<WorkflowEvent>,
) {
    loop {
        match events.recv().await {
            Ok(WorkflowEvent::CountdownTick { remaining }) => {
                let _ = app.emit("booth-countdown", remaining);
            }
            Ok(WorkflowEvent::ShutterPulse) => {
                let _ = app.emit("booth-shutter", ());
            }
            Ok(WorkflowEvent::Processing) => {
                let _ = app.emit("booth-processing", ());
            }
            Ok(WorkflowEvent::ReviewOpened { photo }) => {
                let _ = app.emit("booth-review-opened", &photo);
            }
            Ok(WorkflowEvent::ReviewUpdated { photo }) => {
                let _ = app.emit("booth-review-updated", &photo);
            }
            Ok(WorkflowEvent::ReviewClosed) => {
                let _ = app.emit("booth-review-closed", ());
            }
            Ok(WorkflowEvent::Cancelled) => {
                let _ = app.emit("booth-cancelled", ());
            }
            Ok(WorkflowEvent::CaptureFailed { message }) => {
                let _ = app.emit("booth-capture-failed", &message);
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                log::warn!("[FLOW] event forwarder lagged by {}", n);
            }
            Err(_) => break,
        }
    }
}

//! Gallery domain — the authoritative local view of the photo collection.
//!
//! One `Gallery` lives for the whole session. It is filled once from a
//! store snapshot and from then on mutated only through the reconciliation
//! primitives below, driven by `reconcile::run` consuming the store's
//! change feed in arrival order. Every other component reads.
//!
//! The collection is a capped, newest-first sequence keyed by photo id:
//! never a duplicate id, never more than `GALLERY_CAP` entries.

pub mod reconcile;

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Hard cap on the locally held collection. Inserting past it evicts the
/// oldest entries from the tail.
pub const GALLERY_CAP: usize = 600;

/// One photo row as stored remotely. Immutable once created: `id` is
/// identity, `created_at` (server-assigned) is display order, newest
/// first. The client treats `created_at` as opaque; ordering comes from
/// the snapshot query and feed arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    pub url: String,
    pub filename: String,
    pub created_at: String,
}

/// Outcome of `apply_insert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Photo added at the head. `new_capture` is set when the armed watch
    /// attributed this insert to the current capture session.
    Added { new_capture: bool },
    /// Same id already present: duplicate delivery, state unchanged.
    Duplicate,
}

/// Session-relative new-capture detection: the id of the most recently
/// known photo, plus whether the capture workflow is waiting for its
/// result to land. Any insert with an unseen id while armed counts as the
/// session's capture (single-kiosk assumption: there is no requester
/// identity on the feed).
#[derive(Debug, Default)]
struct CaptureWatch {
    last_seen: Option<String>,
    armed: bool,
}

/// The authoritative, capped, newest-first photo collection.
pub struct Gallery {
    photos: Mutex<Vec<Photo>>,
    watch: Mutex<CaptureWatch>,
}

impl Gallery {
    pub fn new() -> Self {
        Self {
            photos: Mutex::new(Vec::new()),
            watch: Mutex::new(CaptureWatch::default()),
        }
    }

    /// Replace the collection wholesale with a fresh snapshot (newest
    /// first, normally pre-capped by the store query) and reseed the
    /// last-seen id from its head.
    pub fn load_snapshot(&self, mut photos: Vec<Photo>) {
        photos.truncate(GALLERY_CAP);
        let newest = photos.first().map(|p| p.id.clone());
        *self.photos.lock().unwrap() = photos;
        self.watch.lock().unwrap().last_seen = newest;
    }

    /// Reconciliation primitive: merge one remote insert.
    ///
    /// A duplicate id is a complete no-op; the channel may redeliver or
    /// race a reload. A new photo is prepended (the feed delivers in
    /// creation order) and the tail is evicted past the cap.
    pub fn apply_insert(&self, photo: Photo) -> InsertOutcome {
        let mut photos = self.photos.lock().unwrap();
        if photos.iter().any(|p| p.id == photo.id) {
            return InsertOutcome::Duplicate;
        }

        let mut watch = self.watch.lock().unwrap();
        let new_capture = watch.armed && watch.last_seen.as_deref() != Some(photo.id.as_str());
        if new_capture {
            watch.armed = false;
        }
        watch.last_seen = Some(photo.id.clone());
        drop(watch);

        photos.insert(0, photo);
        photos.truncate(GALLERY_CAP);
        InsertOutcome::Added { new_capture }
    }

    /// Reconciliation primitive: apply one remote delete. Unknown ids are
    /// a no-op (the delete may race a reload or a cap eviction). Returns
    /// whether anything was removed.
    pub fn apply_delete(&self, id: &str) -> bool {
        let mut photos = self.photos.lock().unwrap();
        let before = photos.len();
        photos.retain(|p| p.id != id);
        photos.len() != before
    }

    /// Arm new-capture detection: the next insert with an unseen id is
    /// classified as this session's capture, then the watch disarms.
    pub fn arm_capture_watch(&self) {
        self.watch.lock().unwrap().armed = true;
    }

    /// Current contents, newest first.
    pub fn photos(&self) -> Vec<Photo> {
        self.photos.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.photos.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Gallery {
    fn default() -> Self {
        Self::new()
    }
}

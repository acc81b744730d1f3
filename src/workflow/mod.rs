//! Capture workflow domain — the timed state machine between a capture
//! request and the share screen.
//!
//! One session at a time:
//!
//! ```text
//! IDLE → COUNTDOWN(3) → PROCESSING → REVIEW → IDLE
//!                            └─ failure ──────→ IDLE
//! ```
//!
//! A single driver task owns every timer in a session (countdown ticks
//! and the review deadline). Superseding or ending a session always
//! aborts that task, so no timer can outlive the state it was started
//! for. The review deadline is movable rather than re-spawned: a late
//! feed insert extends the same timer instead of racing a second one.

mod driver;

use crate::booth::CaptureBackend;
use crate::gallery::{Gallery, Photo};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};

/// Seconds ticked off before the shutter fires.
pub const COUNTDOWN_START: u8 = 3;
/// How long the review screen stays up without interaction.
pub const REVIEW_SECONDS: u64 = 10;

/// Where the machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Idle,
    Countdown,
    Processing,
    Review,
}

/// The just-captured photo as shown on the review screen. The filename
/// arrives with the capture ack; url and id only once the upload lands in
/// the store and comes back through the feed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPhoto {
    pub filename: String,
    pub url: Option<String>,
    pub id: Option<String>,
}

/// Live session state, readable by the UI at any time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSession {
    pub phase: Phase,
    pub countdown_remaining: u8,
    pub result: Option<ReviewPhoto>,
    #[serde(skip)]
    pub dismiss_deadline: Option<Instant>,
}

impl CaptureSession {
    fn idle() -> Self {
        Self {
            phase: Phase::Idle,
            countdown_remaining: 0,
            result: None,
            dismiss_deadline: None,
        }
    }
}

/// Notifications out of the machine, forwarded to the webview.
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    CountdownTick { remaining: u8 },
    ShutterPulse,
    Processing,
    ReviewOpened { photo: ReviewPhoto },
    ReviewUpdated { photo: ReviewPhoto },
    ReviewClosed,
    Cancelled,
    CaptureFailed { message: String },
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("capture already in progress")]
    Busy,
}

struct Inner<B> {
    booth: Arc<B>,
    gallery: Arc<Gallery>,
    session: Mutex<CaptureSession>,
    /// The one live driver task. Every transition that supersedes or ends
    /// a session aborts whatever sits here before (or instead of)
    /// installing a replacement.
    driver: Mutex<Option<JoinHandle<()>>>,
    events: broadcast::Sender<WorkflowEvent>,
}

/// The capture workflow. Cheap to clone (shared innards); generic over
/// the capture seam so tests can run the machine against a stub service.
pub struct CaptureWorkflow<B> {
    inner: Arc<Inner<B>>,
}

impl<B> Clone for CaptureWorkflow<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// The workflow as wired in the running app.
pub type KioskWorkflow = CaptureWorkflow<crate::booth::BoothClient>;

impl<B: CaptureBackend> CaptureWorkflow<B> {
    pub fn new(booth: Arc<B>, gallery: Arc<Gallery>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(Inner {
                booth,
                gallery,
                session: Mutex::new(CaptureSession::idle()),
                driver: Mutex::new(None),
                events,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.inner.events.subscribe()
    }

    pub fn session(&self) -> CaptureSession {
        self.inner.session.lock().unwrap().clone()
    }

    pub fn phase(&self) -> Phase {
        self.inner.session.lock().unwrap().phase
    }

    /// Begin a capture session. Only valid from IDLE; anything else is
    /// already mid-session and the request is refused.
    pub fn request_capture(&self) -> Result<(), WorkflowError> {
        {
            let mut session = self.inner.session.lock().unwrap();
            if session.phase != Phase::Idle {
                return Err(WorkflowError::Busy);
            }
            *session = CaptureSession {
                phase: Phase::Countdown,
                countdown_remaining: COUNTDOWN_START,
                result: None,
                dismiss_deadline: None,
            };
        }
        let handle = tokio::spawn(driver::run(self.clone()));
        self.replace_driver(Some(handle));
        log::info!("[FLOW] capture requested — countdown from {}", COUNTDOWN_START);
        Ok(())
    }

    /// Abort the countdown before the shutter fires: back to IDLE, no
    /// capture command issued. Only meaningful in COUNTDOWN.
    pub fn cancel_countdown(&self) -> bool {
        {
            let mut session = self.inner.session.lock().unwrap();
            if session.phase != Phase::Countdown {
                return false;
            }
            *session = CaptureSession::idle();
        }
        self.replace_driver(None);
        self.emit(WorkflowEvent::Cancelled);
        log::info!("[FLOW] countdown cancelled");
        true
    }

    /// Close the review screen now. Only meaningful in REVIEW.
    pub fn dismiss_review(&self) -> bool {
        {
            let mut session = self.inner.session.lock().unwrap();
            if session.phase != Phase::Review {
                return false;
            }
            *session = CaptureSession::idle();
        }
        self.replace_driver(None);
        self.emit(WorkflowEvent::ReviewClosed);
        log::info!("[FLOW] review dismissed");
        true
    }

    /// The gallery attributed a feed insert to this session. Attach the
    /// stored photo to the review and give it a fresh dismiss window:
    /// the driver's deadline moves, no second timer starts.
    pub fn on_new_capture(&self, photo: &Photo) {
        let review = {
            let mut session = self.inner.session.lock().unwrap();
            if session.phase != Phase::Review {
                log::debug!(
                    "[FLOW] new capture {} arrived outside review — ignored",
                    photo.id
                );
                return;
            }
            let review = ReviewPhoto {
                filename: photo.filename.clone(),
                url: Some(photo.url.clone()),
                id: Some(photo.id.clone()),
            };
            session.result = Some(review.clone());
            session.dismiss_deadline = Some(Instant::now() + Duration::from_secs(REVIEW_SECONDS));
            review
        };
        self.emit(WorkflowEvent::ReviewUpdated { photo: review });
        log::info!("[FLOW] review updated with stored photo {}", photo.id);
    }

    /// True while a driver task is live. Used by tests to prove no timer
    /// survives a session.
    pub fn has_live_timer(&self) -> bool {
        self.inner
            .driver
            .lock()
            .unwrap()
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    fn replace_driver(&self, next: Option<JoinHandle<()>>) {
        let mut slot = self.inner.driver.lock().unwrap();
        if let Some(prev) = slot.take() {
            prev.abort();
        }
        *slot = next;
    }

    fn emit(&self, event: WorkflowEvent) {
        // No receivers is fine (headless tests, startup).
        let _ = self.inner.events.send(event);
    }
}

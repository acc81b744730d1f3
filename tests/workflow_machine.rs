//! Integration tests for the capture workflow state machine.
//!
//! The machine runs against a stub capture backend under a paused tokio
//! clock, so countdowns and review deadlines elapse deterministically
//! and instantly.

use magic_booth_lib::booth::{BoothError, CaptureBackend, CaptureOutcome};
use magic_booth_lib::gallery::{Gallery, InsertOutcome, Photo};
use magic_booth_lib::workflow::{
    CaptureWorkflow, Phase, WorkflowEvent, COUNTDOWN_START, REVIEW_SECONDS,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::time::{Duration, Instant};

struct StubBooth {
    calls: AtomicUsize,
    images: Vec<String>,
    fail: bool,
}

impl StubBooth {
    fn ok(images: &[&str]) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            images: images.iter().map(|s| s.to_string()).collect(),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            images: Vec::new(),
            fail: true,
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CaptureBackend for StubBooth {
    async fn capture(&self) -> Result<CaptureOutcome, BoothError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(BoothError::CaptureFailed("camera busy".to_string()));
        }
        Ok(CaptureOutcome {
            status: "success".to_string(),
            images: self.images.clone(),
        })
    }
}

fn stored_photo(id: &str) -> Photo {
    Photo {
        id: id.to_string(),
        url: format!("https://store.example/photos/magic_{}.jpg", id),
        filename: format!("magic_{}.jpg", id),
        created_at: "2026-08-07T12:00:00Z".to_string(),
    }
}

#[tokio::test(start_paused = true)]
async fn full_session_reaches_review_then_auto_dismisses() {
    let booth = Arc::new(StubBooth::ok(&["magic_1.jpg", "magic_2.jpg"]));
    let gallery = Arc::new(Gallery::new());
    let flow = CaptureWorkflow::new(Arc::clone(&booth), Arc::clone(&gallery));
    let mut events = flow.subscribe();
    let start = Instant::now();

    flow.request_capture().unwrap();
    assert_eq!(flow.phase(), Phase::Countdown);

    for expected in (1..=COUNTDOWN_START).rev() {
        match events.recv().await.unwrap() {
            WorkflowEvent::CountdownTick { remaining } => assert_eq!(remaining, expected),
            other => panic!("expected tick {}, got {:?}", expected, other),
        }
    }
    assert!(matches!(events.recv().await.unwrap(), WorkflowEvent::ShutterPulse));
    assert!(matches!(events.recv().await.unwrap(), WorkflowEvent::Processing));

    let photo = match events.recv().await.unwrap() {
        WorkflowEvent::ReviewOpened { photo } => photo,
        other => panic!("expected review, got {:?}", other),
    };
    // The newest produced image is the one reviewed.
    assert_eq!(photo.filename, "magic_2.jpg");
    assert!(photo.url.is_none(), "url arrives only via the feed");
    assert_eq!(flow.phase(), Phase::Review);
    assert_eq!(booth.call_count(), 1);
    // Countdown took its three seconds.
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(3) && elapsed < Duration::from_secs(4));

    // No interaction: review closes itself at the deadline.
    assert!(matches!(events.recv().await.unwrap(), WorkflowEvent::ReviewClosed));
    assert_eq!(flow.phase(), Phase::Idle);
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(3 + REVIEW_SECONDS));

    // Let the driver wind down, then confirm nothing is still pending.
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!flow.has_live_timer(), "driver task leaked past the session");
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test(start_paused = true)]
async fn cancelling_countdown_issues_no_capture() {
    let booth = Arc::new(StubBooth::ok(&["magic_1.jpg"]));
    let flow = CaptureWorkflow::new(Arc::clone(&booth), Arc::new(Gallery::new()));
    let mut events = flow.subscribe();

    flow.request_capture().unwrap();
    assert!(matches!(
        events.recv().await.unwrap(),
        WorkflowEvent::CountdownTick { remaining: 3 }
    ));

    assert!(flow.cancel_countdown());
    assert_eq!(flow.phase(), Phase::Idle);
    assert!(matches!(events.recv().await.unwrap(), WorkflowEvent::Cancelled));

    // Give any stray timer ample room to fire, then confirm silence.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(booth.call_count(), 0, "capture command issued after cancel");
    assert!(!flow.has_live_timer());
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

    // Cancelling again is a defined no-op.
    assert!(!flow.cancel_countdown());
}

#[tokio::test(start_paused = true)]
async fn capture_failure_surfaces_and_returns_to_idle() {
    let booth = Arc::new(StubBooth::failing());
    let flow = CaptureWorkflow::new(Arc::clone(&booth), Arc::new(Gallery::new()));
    let mut events = flow.subscribe();

    flow.request_capture().unwrap();
    loop {
        match events.recv().await.unwrap() {
            WorkflowEvent::CaptureFailed { message } => {
                assert!(message.contains("camera busy"));
                break;
            }
            WorkflowEvent::ReviewOpened { .. } => panic!("review opened on failure"),
            _ => {}
        }
    }
    assert_eq!(flow.phase(), Phase::Idle);
    assert_eq!(booth.call_count(), 1, "capture is not retried");

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!flow.has_live_timer());

    // The machine is usable again after a failure.
    flow.request_capture().unwrap();
    assert_eq!(flow.phase(), Phase::Countdown);
}

#[tokio::test(start_paused = true)]
async fn empty_capture_result_is_a_failure() {
    let booth = Arc::new(StubBooth::ok(&[]));
    let flow = CaptureWorkflow::new(Arc::clone(&booth), Arc::new(Gallery::new()));
    let mut events = flow.subscribe();

    flow.request_capture().unwrap();
    loop {
        match events.recv().await.unwrap() {
            WorkflowEvent::CaptureFailed { .. } => break,
            WorkflowEvent::ReviewOpened { .. } => panic!("review opened with no images"),
            _ => {}
        }
    }
    assert_eq!(flow.phase(), Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn requests_are_refused_while_busy() {
    let booth = Arc::new(StubBooth::ok(&["magic_1.jpg"]));
    let flow = CaptureWorkflow::new(Arc::clone(&booth), Arc::new(Gallery::new()));
    let mut events = flow.subscribe();

    flow.request_capture().unwrap();
    assert!(flow.request_capture().is_err(), "second request during countdown");

    // Drive to review and try again from there.
    loop {
        if matches!(events.recv().await.unwrap(), WorkflowEvent::ReviewOpened { .. }) {
            break;
        }
    }
    assert!(flow.request_capture().is_err(), "request during review");
    assert_eq!(booth.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn processing_arms_the_gallery_watch() {
    let booth = Arc::new(StubBooth::ok(&["magic_1.jpg"]));
    let gallery = Arc::new(Gallery::new());
    let flow = CaptureWorkflow::new(Arc::clone(&booth), Arc::clone(&gallery));
    let mut events = flow.subscribe();

    // Before any capture, inserts are not attributed to a session.
    assert_eq!(
        gallery.apply_insert(stored_photo("before")),
        InsertOutcome::Added { new_capture: false }
    );

    flow.request_capture().unwrap();
    loop {
        if matches!(events.recv().await.unwrap(), WorkflowEvent::ReviewOpened { .. }) {
            break;
        }
    }

    // The upload lands: the armed watch flags it.
    assert_eq!(
        gallery.apply_insert(stored_photo("fresh")),
        InsertOutcome::Added { new_capture: true }
    );
}

#[tokio::test(start_paused = true)]
async fn stored_photo_refreshes_the_review_deadline() {
    let booth = Arc::new(StubBooth::ok(&["magic_9.jpg"]));
    let flow = CaptureWorkflow::new(Arc::clone(&booth), Arc::new(Gallery::new()));
    let mut events = flow.subscribe();

    flow.request_capture().unwrap();
    loop {
        if matches!(events.recv().await.unwrap(), WorkflowEvent::ReviewOpened { .. }) {
            break;
        }
    }

    // Five seconds into the review the upload comes back via the feed.
    tokio::time::sleep(Duration::from_secs(5)).await;
    flow.on_new_capture(&stored_photo("9"));

    let photo = match events.recv().await.unwrap() {
        WorkflowEvent::ReviewUpdated { photo } => photo,
        other => panic!("expected review update, got {:?}", other),
    };
    assert_eq!(photo.url.as_deref().unwrap(), "https://store.example/photos/magic_9.jpg");
    assert_eq!(photo.id.as_deref(), Some("9"));

    // The dismiss window restarted: still reviewing well past the
    // original deadline, closed only after the fresh one.
    tokio::time::sleep(Duration::from_secs(8)).await;
    assert_eq!(flow.phase(), Phase::Review);
    assert!(matches!(events.recv().await.unwrap(), WorkflowEvent::ReviewClosed));
    assert_eq!(flow.phase(), Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn manual_dismiss_closes_review_and_stops_timers() {
    let booth = Arc::new(StubBooth::ok(&["magic_1.jpg"]));
    let flow = CaptureWorkflow::new(Arc::clone(&booth), Arc::new(Gallery::new()));
    let mut events = flow.subscribe();

    flow.request_capture().unwrap();
    loop {
        if matches!(events.recv().await.unwrap(), WorkflowEvent::ReviewOpened { .. }) {
            break;
        }
    }

    assert!(flow.dismiss_review());
    assert_eq!(flow.phase(), Phase::Idle);
    assert!(matches!(events.recv().await.unwrap(), WorkflowEvent::ReviewClosed));

    // The aborted driver must not fire a second close at the old deadline.
    tokio::time::sleep(Duration::from_secs(REVIEW_SECONDS + 5)).await;
    assert!(!flow.has_live_timer());
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

    // A late feed insert after dismissal is ignored.
    flow.on_new_capture(&stored_photo("late"));
    assert_eq!(flow.phase(), Phase::Idle);
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

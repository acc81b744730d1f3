//! The per-session driver task: countdown ticks, the capture round trip,
//! and the review deadline. All of a session's timers live in this one
//! task; aborting it cancels everything at once.
//!
//! Every wake re-checks the session phase before touching it: an external
//! cancel/dismiss may have reset the session between the state change and
//! the abort landing, and a stale driver must never mutate a fresh one's
//! state.

use super::{CaptureSession, CaptureWorkflow, Phase, ReviewPhoto, WorkflowEvent, REVIEW_SECONDS};
use crate::booth::CaptureBackend;
use tokio::time::{sleep, sleep_until, Duration, Instant};

pub(super) async fn run<B: CaptureBackend>(flow: CaptureWorkflow<B>) {
    // COUNTDOWN: tick once a second; the shutter pulse replaces the final
    // tick.
    loop {
        let remaining = {
            let session = flow.inner.session.lock().unwrap();
            if session.phase != Phase::Countdown {
                return;
            }
            session.countdown_remaining
        };
        if remaining == 0 {
            break;
        }
        flow.emit(WorkflowEvent::CountdownTick { remaining });
        sleep(Duration::from_secs(1)).await;
        {
            let mut session = flow.inner.session.lock().unwrap();
            if session.phase != Phase::Countdown {
                return;
            }
            session.countdown_remaining = session.countdown_remaining.saturating_sub(1);
        }
    }

    flow.emit(WorkflowEvent::ShutterPulse);
    {
        let mut session = flow.inner.session.lock().unwrap();
        session.phase = Phase::Processing;
    }
    flow.emit(WorkflowEvent::Processing);
    log::info!("[FLOW] shutter — capture command issued");

    // PROCESSING: one round trip, no retry. New requests are refused
    // while we sit here because the phase is not IDLE.
    match flow.inner.booth.capture().await {
        Ok(outcome) if !outcome.images.is_empty() => {
            // Arm the gallery watch before opening the review so the
            // upload's feed insert is attributed to this session whenever
            // it lands. The insert and this ack are independent signals.
            flow.inner.gallery.arm_capture_watch();

            let review = ReviewPhoto {
                // Newest image last in the service's response.
                filename: outcome.images.last().cloned().unwrap_or_default(),
                url: None,
                id: None,
            };
            {
                let mut session = flow.inner.session.lock().unwrap();
                session.phase = Phase::Review;
                session.result = Some(review.clone());
                session.dismiss_deadline =
                    Some(Instant::now() + Duration::from_secs(REVIEW_SECONDS));
            }
            flow.emit(WorkflowEvent::ReviewOpened { photo: review });
            log::info!("[FLOW] review open ({}s)", REVIEW_SECONDS);
        }
        Ok(_) => {
            fail(&flow, "capture produced no images".to_string());
            return;
        }
        Err(e) => {
            fail(&flow, e.to_string());
            return;
        }
    }

    // REVIEW: sleep to the deadline. A moved deadline (manual extension
    // via a late feed insert) re-arms this same loop instead of spawning
    // a second timer.
    loop {
        let deadline = {
            let session = flow.inner.session.lock().unwrap();
            if session.phase != Phase::Review {
                return;
            }
            match session.dismiss_deadline {
                Some(deadline) => deadline,
                None => return,
            }
        };
        sleep_until(deadline).await;

        let mut session = flow.inner.session.lock().unwrap();
        if session.phase != Phase::Review {
            return;
        }
        let current = session.dismiss_deadline;
        if matches!(current, Some(moved) if moved > deadline) {
            // Deadline was pushed out while we slept; re-arm.
            continue;
        }
        *session = CaptureSession::idle();
        drop(session);
        flow.emit(WorkflowEvent::ReviewClosed);
        log::info!("[FLOW] review auto-dismissed");
        return;
    }
}

fn fail<B: CaptureBackend>(flow: &CaptureWorkflow<B>, message: String) {
    {
        let mut session = flow.inner.session.lock().unwrap();
        *session = CaptureSession::idle();
    }
    log::warn!("[FLOW] capture failed: {}", message);
    flow.emit(WorkflowEvent::CaptureFailed { message });
}

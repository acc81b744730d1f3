//! Booth service domain — the remote camera, filter, and printer
//! controls.
//!
//! Every command is a single request/response round trip with no
//! automatic retry. The mode/filter selection held here is optimistic on
//! success only: it moves after the service acknowledges, never on
//! intent, so a dead service leaves the panels truthful.

mod client;

pub use client::{BoothClient, BoothError, BoothHealth, CaptureOutcome};

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Mutex;

/// Capture modes the service understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaptureMode {
    Single,
    Burst,
    Gif,
}

impl CaptureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureMode::Single => "SINGLE",
            CaptureMode::Burst => "BURST",
            CaptureMode::Gif => "GIF",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "SINGLE" => Some(CaptureMode::Single),
            "BURST" => Some(CaptureMode::Burst),
            "GIF" => Some(CaptureMode::Gif),
            _ => None,
        }
    }
}

/// Named visual styles the service's filter pipeline accepts. Membership
/// is cosmetic; the client checks it only to keep the panel honest.
pub const FILTERS: [&str; 8] = [
    "NORMAL",
    "GLITCH",
    "NEON",
    "DREAMY",
    "RETRO",
    "NOIR",
    "BW",
    "STRANGER_THEME",
];

pub fn is_known_filter(name: &str) -> bool {
    FILTERS.iter().any(|f| f.eq_ignore_ascii_case(name))
}

/// Currently selected mode/filter as shown on the control panels.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub mode: CaptureMode,
    pub filter: String,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            mode: CaptureMode::Single,
            filter: "STRANGER_THEME".to_string(),
        }
    }
}

/// Managed state: the service client plus the panel selection.
pub struct BoothState {
    pub client: BoothClient,
    pub selection: Mutex<Selection>,
}

impl BoothState {
    pub fn new(client: BoothClient) -> Self {
        Self {
            client,
            selection: Mutex::new(Selection::default()),
        }
    }
}

/// Seam between the capture workflow and the remote capture command. The
/// real implementation is `BoothClient`; tests drive the machine with a
/// stub. The future must be `Send` because the workflow driver runs on a
/// spawned task.
pub trait CaptureBackend: Send + Sync + 'static {
    fn capture(&self) -> impl Future<Output = Result<CaptureOutcome, BoothError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_mode_parse_roundtrip() {
        for mode in [CaptureMode::Single, CaptureMode::Burst, CaptureMode::Gif] {
            assert_eq!(CaptureMode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(CaptureMode::parse("burst"), Some(CaptureMode::Burst));
        assert_eq!(CaptureMode::parse("PANORAMA"), None);
    }

    #[test]
    fn filter_membership_is_case_insensitive() {
        assert!(is_known_filter("NOIR"));
        assert!(is_known_filter("stranger_theme"));
        assert!(!is_known_filter("SEPIA"));
    }

    #[test]
    fn default_selection_matches_panel_defaults() {
        let selection = Selection::default();
        assert_eq!(selection.mode, CaptureMode::Single);
        assert!(is_known_filter(&selection.filter));
    }
}

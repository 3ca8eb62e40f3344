use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::display::DisplayImage;
use crate::APP_NAME;

// make SharedState an alias for a Mutex protected struct State
pub type SharedState = Arc<Mutex<State>>;

/// Progress of the current detection cycle, shown in the window title.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DetectionStatus {
    #[default]
    Idle,
    Detecting,
    Finished(usize),
    Failed(String),
}

impl DetectionStatus {
    pub fn title(&self) -> String {
        match self {
            DetectionStatus::Idle => APP_NAME.to_string(),
            DetectionStatus::Detecting => "Detecting...".to_string(),
            DetectionStatus::Finished(count) => {
                format!("Detection Finished. {} face(s) detected", count)
            }
            DetectionStatus::Failed(reason) => format!("Detection Failed: {}", reason),
        }
    }

    /// Whether a request is currently in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, DetectionStatus::Detecting)
    }
}

// data shared between the gui and the detection tasks
#[derive(Debug, Default)]
pub struct State {
    pub display: Option<DisplayImage>,
    /// File the current cycle was started for.
    pub image_path: Option<PathBuf>,
    pub status: DetectionStatus,
    /// Bumped every time `display` is replaced.
    pub revision: u64,
}

impl State {
    pub fn replace_display(&mut self, display: DisplayImage) {
        self.display = Some(display);
        self.revision += 1;
    }
}

pub fn new_shared_state() -> SharedState {
    Arc::new(Mutex::new(State::default()))
}

/// Locks the state, recovering the guard if a previous holder panicked.
pub fn lock(state: &SharedState) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

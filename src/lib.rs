pub mod app;
pub mod config;
pub mod display;
pub mod error;
pub mod face;
pub mod face_detection;
pub mod logging;
pub mod overlay;
pub mod session;
pub mod utils;

pub use error::{DetectionError, Error, Result};

/// Window title while no detection is running.
pub const APP_NAME: &str = "FaceWizardry";

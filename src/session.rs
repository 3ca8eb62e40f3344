//! One detection cycle per file selection.
//!
//! Every selection takes a new [`Ticket`]. A finished request only touches the
//! shared state while its ticket is still the newest one, and the previous
//! in-flight task is aborted when a new selection starts.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::display::DisplayImage;
use crate::error::{DetectionError, Result};
use crate::face::FaceRectangle;
use crate::face_detection::{FaceDetectionModel, FaceDetector};
use crate::overlay::render_overlay;
use crate::utils::{lock, new_shared_state, DetectionStatus, SharedState, State};

/// Extensions accepted by the file picker.
pub const JPEG_EXTENSIONS: [&str; 2] = ["jpg", "jpeg"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Source of generation tickets.
#[derive(Debug, Default)]
pub struct DetectionSession {
    generation: AtomicU64,
}

impl DetectionSession {
    /// Invalidates every earlier ticket.
    pub fn begin(&self) -> Ticket {
        Ticket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }
}

pub fn is_jpeg_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| JPEG_EXTENSIONS.iter().any(|j| ext.eq_ignore_ascii_case(j)))
        .unwrap_or(false)
}

type RepaintHook = Arc<dyn Fn() + Send + Sync>;

pub struct Workbench<M> {
    detector: Arc<FaceDetector<M>>,
    state: SharedState,
    session: Arc<DetectionSession>,
    runtime: Handle,
    in_flight: Option<JoinHandle<()>>,
    outline_thickness: u32,
    on_update: Option<RepaintHook>,
}

impl<M: FaceDetectionModel + 'static> Workbench<M> {
    pub fn new(detector: FaceDetector<M>, runtime: Handle, outline_thickness: u32) -> Self {
        Self {
            detector: Arc::new(detector),
            state: new_shared_state(),
            session: Arc::new(DetectionSession::default()),
            runtime,
            in_flight: None,
            outline_thickness,
            on_update: None,
        }
    }

    /// Called from the detection task after it published its result.
    pub fn set_on_update<F>(&mut self, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_update = Some(Arc::new(f));
    }

    pub fn state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    /// Starts a detection cycle for the picked file.
    ///
    /// Returns `Ok(None)` without touching the display when the dialog was
    /// cancelled or the file is not a JPEG. An image that cannot be decoded
    /// still supersedes the running detection, marks the cycle as failed and
    /// sends no request.
    pub fn select(&mut self, selection: Option<PathBuf>) -> Result<Option<Ticket>> {
        let Some(path) = selection else {
            debug!("file selection cancelled");
            return Ok(None);
        };
        if !is_jpeg_path(&path) {
            warn!(path = %path.display(), "ignoring non-jpeg selection");
            return Ok(None);
        }

        let loaded = DisplayImage::load(&path);

        // the new selection supersedes the running one even if it fails to load
        let (ticket, source) = {
            let mut state = lock(&self.state);
            let ticket = self.session.begin();
            if let Some(previous) = self.in_flight.take() {
                previous.abort();
            }
            state.image_path = Some(path.clone());

            match loaded {
                Ok(source) => {
                    state.replace_display(source.clone());
                    state.status = DetectionStatus::Detecting;
                    (ticket, source)
                }
                Err(err) => {
                    state.status = DetectionStatus::Failed(err.to_string());
                    drop(state);
                    self.notify();
                    return Err(err);
                }
            }
        };

        let detector = Arc::clone(&self.detector);
        let state = Arc::clone(&self.state);
        let session = Arc::clone(&self.session);
        let on_update = self.on_update.clone();
        let thickness = self.outline_thickness;
        let span = info_span!("detection", ticket = ticket.id(), path = %path.display());

        self.in_flight = Some(self.runtime.spawn(
            async move {
                let result = detector.detect(&path).await;
                if publish(&state, &session, ticket, &source, result, thickness) {
                    if let Some(on_update) = on_update {
                        on_update();
                    }
                }
            }
            .instrument(span),
        ));

        Ok(Some(ticket))
    }

    /// Waits for the in-flight detection, if any.
    pub async fn finish_in_flight(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            if let Err(err) = handle.await {
                if !err.is_cancelled() {
                    warn!("detection task failed: {}", err);
                }
            }
        }
    }

    fn notify(&self) {
        if let Some(on_update) = &self.on_update {
            on_update();
        }
    }
}

impl<M> Drop for Workbench<M> {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}

/// Writes a detection result into the shared state unless `ticket` is stale.
fn publish(
    state: &SharedState,
    session: &DetectionSession,
    ticket: Ticket,
    source: &DisplayImage,
    result: Result<Vec<FaceRectangle>, DetectionError>,
    thickness: u32,
) -> bool {
    let mut state = lock(state);
    if !session.is_current(ticket) {
        debug!(ticket = ticket.id(), "dropping stale detection result");
        return false;
    }
    apply_result(&mut state, source, result, thickness);
    true
}

fn apply_result(
    state: &mut State,
    source: &DisplayImage,
    result: Result<Vec<FaceRectangle>, DetectionError>,
    thickness: u32,
) {
    match result {
        Ok(rects) => {
            info!("{} face(s) detected", rects.len());
            if !rects.is_empty() {
                state.replace_display(render_overlay(source, &rects, thickness));
            }
            state.status = DetectionStatus::Finished(rects.len());
        }
        Err(err) => {
            warn!(kind = err.kind(), "detection failed: {}", err);
            state.status = DetectionStatus::Failed(err.to_string());
        }
    }
}

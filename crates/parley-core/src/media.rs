//! Media capture capability.
//!
//! Capture devices are external collaborators; the negotiation core only
//! needs two guarantees from them: acquisition can fail, and a successfully
//! acquired resource is stopped exactly once. [`MediaSource`] is the
//! acquisition seam (real devices, the file-backed fallback below, or test
//! doubles all implement it) and [`MediaHandle`] enforces the stop-once
//! contract regardless of which exit path releases it.

use std::{fmt, path::PathBuf};

use async_trait::async_trait;
use thiserror::Error;

/// Capture acquisition failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// No usable capture could be produced.
    #[error("capture unavailable: {0}")]
    Unavailable(String),
}

/// What to capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    /// Capture audio.
    pub audio: bool,
    /// Capture video.
    pub video: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self { audio: true, video: true }
    }
}

/// A live capture resource.
///
/// Object-safe so handles to heterogeneous sources (device, file, test
/// double) can be owned uniformly. `stop` is called at most once, by
/// [`MediaHandle`].
pub trait Capture: Send {
    /// Stop capturing and free the underlying device.
    fn stop(&mut self);
}

/// Producer of capture resources.
///
/// Acquisition is the one async suspension point on the media side; the
/// driver awaits it and feeds the resulting handle (or error) back into the
/// session layer.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Acquire a capture resource satisfying `constraints`.
    async fn acquire(&self, constraints: MediaConstraints) -> Result<MediaHandle, MediaError>;
}

/// Owning handle to a capture resource.
///
/// Releasing is idempotent: the first call (or drop, as a backstop) stops
/// the capture, later calls are no-ops. The negotiation engine owns the
/// handle exclusively for the lifetime of one session and releases it on
/// every exit path; leaking it would block the device for the next session.
pub struct MediaHandle {
    capture: Option<Box<dyn Capture>>,
}

impl MediaHandle {
    /// Wrap a capture resource.
    pub fn new(capture: Box<dyn Capture>) -> Self {
        Self { capture: Some(capture) }
    }

    /// Stop the capture. Idempotent.
    pub fn release(&mut self) {
        if let Some(mut capture) = self.capture.take() {
            capture.stop();
        }
    }

    /// Whether the capture has already been stopped.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.capture.is_none()
    }
}

impl fmt::Debug for MediaHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaHandle").field("released", &self.is_released()).finish()
    }
}

impl Drop for MediaHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// File-backed fallback capture source.
///
/// Alternate implementation of the capture capability for hosts without a
/// camera: the "capture" is a prerecorded media file. Acquisition validates
/// that the file exists and is a regular file; decoding it is the media
/// pipeline's concern, not this crate's.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Serve capture from the given media file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file path.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl MediaSource for FileSource {
    async fn acquire(&self, _constraints: MediaConstraints) -> Result<MediaHandle, MediaError> {
        let meta = std::fs::metadata(&self.path)
            .map_err(|e| MediaError::Unavailable(format!("{}: {e}", self.path.display())))?;
        if !meta.is_file() {
            return Err(MediaError::Unavailable(format!(
                "{}: not a regular file",
                self.path.display()
            )));
        }
        Ok(MediaHandle::new(Box::new(FileCapture)))
    }
}

/// Capture handle produced by [`FileSource`]. Nothing to stop: the file is
/// only read while the media pipeline pulls from it.
struct FileCapture;

impl Capture for FileCapture {
    fn stop(&mut self) {}
}

//! Background extraction worker.
//!
//! `Extractor::submit` validates a request, spawns one thread for the pass
//! and returns an `ExtractionHandle` immediately. Events arrive on a channel
//! in emission order. Cancelling consumes the handle and joins the worker,
//! which notices the flag before its next cell and exits without a result,
//! so nothing from a cancelled pass outlives the call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::{TilexError, Result};
use crate::types::{GridShape, PixelBuffer, Tolerance};
use crate::validation::validate_request;

use super::dedup::{run_extraction, ExtractEvent, ExtractResult};

/// Shared cancellation flag between a handle and its worker.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// An extraction request, as handed from host to worker.
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub tile_width: u32,
    pub tile_height: u32,
    /// Raw tolerance; scaling happens inside the engine.
    pub tolerance: f64,
    pub image: Arc<PixelBuffer>,
}

impl ExtractRequest {
    pub fn new(image: Arc<PixelBuffer>, tile_width: u32, tile_height: u32, tolerance: f64) -> Self {
        Self {
            tile_width,
            tile_height,
            tolerance,
            image,
        }
    }
}

/// Spawns extraction passes on background threads.
pub struct Extractor;

impl Extractor {
    /// Validate `request` and start a pass without blocking.
    ///
    /// Invalid requests are rejected before any thread is spawned.
    pub fn submit(request: ExtractRequest) -> Result<ExtractionHandle> {
        if let Some(err) = validate_request(&request).into_error() {
            return Err(err);
        }

        let shape = GridShape::derive(
            request.image.width(),
            request.image.height(),
            request.tile_width,
            request.tile_height,
        )?;
        let tolerance = Tolerance::new(request.tolerance)?;

        let (tx, rx) = mpsc::channel();
        let token = CancelToken::new();
        let worker_token = token.clone();
        let image = request.image;

        let thread = thread::Builder::new()
            .name("tilex-extract".to_string())
            .spawn(move || {
                run_extraction(&image, &shape, tolerance, &worker_token, |event| {
                    // Receiver gone means the host dropped the handle.
                    if tx.send(event).is_err() {
                        worker_token.cancel();
                    }
                });
            })?;

        Ok(ExtractionHandle {
            events: Some(rx),
            token,
            shape,
            thread: Some(thread),
            finished: false,
            disconnected: false,
        })
    }
}

/// Host side of one in-flight pass.
///
/// The handle owns the worker thread: cancelling or dropping it raises the
/// flag and joins, so once either returns the worker has exited.
pub struct ExtractionHandle {
    events: Option<Receiver<ExtractEvent>>,
    token: CancelToken,
    shape: GridShape,
    thread: Option<JoinHandle<()>>,
    finished: bool,
    disconnected: bool,
}

impl ExtractionHandle {
    /// The grid this pass runs over.
    pub fn shape(&self) -> GridShape {
        self.shape
    }

    /// Whether the `Result` event has been received.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whether no further event can arrive: the `Result` was received or
    /// the worker went away without one.
    pub fn is_closed(&self) -> bool {
        self.finished || self.disconnected
    }

    /// Next event if one is ready. Never blocks.
    pub fn try_next(&mut self) -> Option<ExtractEvent> {
        if self.is_closed() {
            return None;
        }
        let events = self.events.as_ref()?;
        match events.try_recv() {
            Ok(event) => Some(self.observe(event)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.disconnected = true;
                None
            }
        }
    }

    /// Block until the next event. `None` once the stream has ended.
    pub fn next_event(&mut self) -> Option<ExtractEvent> {
        if self.is_closed() {
            return None;
        }
        let received = self.events.as_ref()?.recv();
        match received {
            Ok(event) => Some(self.observe(event)),
            Err(_) => {
                self.disconnected = true;
                None
            }
        }
    }

    /// Block until the pass completes, discarding progress.
    pub fn wait(mut self) -> Result<ExtractResult> {
        while let Some(event) = self.next_event() {
            if let ExtractEvent::Result(result) = event {
                return Ok(result);
            }
        }
        Err(TilexError::Build {
            message: "Extraction worker exited without a result".to_string(),
            help: None,
        })
    }

    /// Terminate the pass and wait for the worker to exit.
    ///
    /// The worker checks the flag before every cell, so this blocks for at
    /// most one cell comparison. No further events can be observed.
    pub fn cancel(self) {
        // Drop does the work.
    }

    fn shutdown(&mut self) {
        if !self.finished {
            self.token.cancel();
        }
        self.events = None;
        if let Some(thread) = self.thread.take() {
            // A panicked worker has nothing left to clean up.
            let _ = thread.join();
        }
    }

    /// A handle whose worker has already gone away without a result.
    #[cfg(test)]
    pub(crate) fn detached(shape: GridShape) -> Self {
        let (_, rx) = mpsc::channel();
        Self {
            events: Some(rx),
            token: CancelToken::new(),
            shape,
            thread: None,
            finished: false,
            disconnected: false,
        }
    }

    fn observe(&mut self, event: ExtractEvent) -> ExtractEvent {
        if matches!(event, ExtractEvent::Result(_)) {
            self.finished = true;
        }
        event
    }
}

impl Iterator for ExtractionHandle {
    type Item = ExtractEvent;

    fn next(&mut self) -> Option<ExtractEvent> {
        self.next_event()
    }
}

impl Drop for ExtractionHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

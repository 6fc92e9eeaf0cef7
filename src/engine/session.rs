//! Extraction session.
//!
//! A session owns everything one caller is working with: the loaded image,
//! its grid, the palette and index map of the last completed pass, and the
//! pass currently in flight. Loading a new image replaces all of it; starting
//! a new pass (e.g. after a tolerance change) cancels the running one and
//! drops the previous results. At most one pass runs per session.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{TilexError, Result};
use crate::types::{GridShape, IndexMap, Palette, PixelBuffer, TileSize, Tolerance};

use super::dedup::ExtractEvent;
use super::worker::{ExtractRequest, ExtractionHandle, Extractor};

/// What a session reports while a pass runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    Started,
    Progress(f64),
    /// The pass finished and its results are stored on the session.
    Completed { tiles: usize, elapsed: Duration },
}

/// The single in-memory workspace of one caller.
#[derive(Default)]
pub struct Session {
    source: Option<Arc<PixelBuffer>>,
    shape: Option<GridShape>,
    tolerance: Tolerance,
    palette: Option<Palette>,
    index_map: Option<IndexMap>,
    elapsed: Option<Duration>,
    active: Option<ExtractionHandle>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a new image, discarding everything from the previous one.
    ///
    /// Nothing is kept if the tile size does not partition the image.
    pub fn load(&mut self, buffer: impl Into<Arc<PixelBuffer>>, tile: TileSize) -> Result<GridShape> {
        self.clear();

        let buffer = buffer.into();
        let shape = GridShape::for_tile_size(buffer.width(), buffer.height(), tile)?;
        self.source = Some(buffer);
        self.shape = Some(shape);
        Ok(shape)
    }

    /// Start a fresh pass over the loaded image.
    ///
    /// Any running pass is cancelled and previous results are dropped.
    pub fn start(&mut self, tolerance: f64) -> Result<()> {
        let (Some(source), Some(shape)) = (self.source.clone(), self.shape) else {
            return Err(TilexError::Validation {
                message: "No image loaded".to_string(),
                help: Some("Load an image before starting an extraction".to_string()),
            });
        };

        self.reset_results();
        self.tolerance = Tolerance::new(tolerance)?;

        let request = ExtractRequest::new(source, shape.tile_width, shape.tile_height, tolerance);
        self.active = Some(Extractor::submit(request)?);
        Ok(())
    }

    /// Cancel the running pass, if any. Stored results are kept.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.active.take() {
            handle.cancel();
        }
    }

    /// Whether a pass is in flight.
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Next event if one is ready. Never blocks.
    pub fn poll(&mut self) -> Option<SessionEvent> {
        let handle = self.active.as_mut()?;
        match handle.try_next() {
            Some(event) => Some(self.apply(event)),
            None => {
                if handle.is_closed() {
                    self.active = None;
                }
                None
            }
        }
    }

    /// Block until the next event. `None` when no pass is running.
    pub fn next_event(&mut self) -> Option<SessionEvent> {
        match self.active.as_mut()?.next_event() {
            Some(event) => Some(self.apply(event)),
            None => {
                self.active = None;
                None
            }
        }
    }

    /// Block until the running pass completes.
    pub fn wait(&mut self) -> Result<()> {
        if !self.is_running() {
            return Err(TilexError::Build {
                message: "No extraction is running".to_string(),
                help: None,
            });
        }
        while let Some(event) = self.next_event() {
            if matches!(event, SessionEvent::Completed { .. }) {
                return Ok(());
            }
        }
        Err(TilexError::Build {
            message: "Extraction worker exited without a result".to_string(),
            help: None,
        })
    }

    pub fn source(&self) -> Option<&PixelBuffer> {
        self.source.as_deref()
    }

    pub fn shape(&self) -> Option<GridShape> {
        self.shape
    }

    /// Tolerance of the most recently started pass.
    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    pub fn index_map(&self) -> Option<&IndexMap> {
        self.index_map.as_ref()
    }

    /// Duration of the last completed pass.
    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed
    }

    fn apply(&mut self, event: ExtractEvent) -> SessionEvent {
        match event {
            ExtractEvent::Started => SessionEvent::Started,
            ExtractEvent::Progress(p) => SessionEvent::Progress(p.min(1.0)),
            ExtractEvent::Result(result) => {
                let tiles = result.palette.len();
                self.palette = Some(result.palette);
                self.index_map = Some(result.index_map);
                self.elapsed = Some(result.elapsed);
                self.active = None;
                SessionEvent::Completed {
                    tiles,
                    elapsed: result.elapsed,
                }
            }
        }
    }

    fn reset_results(&mut self) {
        self.cancel();
        self.palette = None;
        self.index_map = None;
        self.elapsed = None;
    }

    fn clear(&mut self) {
        self.reset_results();
        self.source = None;
        self.shape = None;
        self.tolerance = Tolerance::EXACT;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Colour;

    fn checker(tiles_x: u32, tiles_y: u32, tile: u32) -> PixelBuffer {
        let mut buffer = PixelBuffer::blank(tiles_x * tile, tiles_y * tile);
        for y in 0..buffer.height() {
            for x in 0..buffer.width() {
                let on = ((x / tile) + (y / tile)) % 2 == 0;
                let colour = if on { Colour::BLACK } else { Colour::WHITE };
                buffer.put(x, y, colour);
            }
        }
        buffer
    }

    #[test]
    fn test_load_and_extract() {
        let mut session = Session::new();
        let shape = session.load(checker(4, 2, 8), TileSize::new(8, 8)).unwrap();
        assert_eq!((shape.num_cols, shape.num_rows), (4, 2));

        session.start(0.0).unwrap();
        assert!(session.is_running());
        session.wait().unwrap();

        assert!(!session.is_running());
        assert_eq!(session.palette().map(|p| p.len()), Some(2));
        assert_eq!(
            session.index_map(),
            Some(&vec![0, 1, 0, 1, 1, 0, 1, 0])
        );
        assert!(session.elapsed().is_some());
    }

    #[test]
    fn test_load_invalid_grid_keeps_nothing() {
        let mut session = Session::new();
        session.load(checker(2, 2, 8), TileSize::new(8, 8)).unwrap();

        let err = session.load(checker(2, 2, 8), TileSize::new(5, 5));
        assert!(err.is_err());
        assert!(session.source().is_none());
        assert!(session.shape().is_none());
        assert!(session.start(0.0).is_err());
    }

    #[test]
    fn test_start_without_image() {
        let mut session = Session::new();
        assert!(matches!(
            session.start(0.0),
            Err(TilexError::Validation { .. })
        ));
    }

    #[test]
    fn test_restart_discards_previous_results() {
        let mut session = Session::new();
        session.load(checker(4, 4, 4), TileSize::new(4, 4)).unwrap();

        session.start(0.0).unwrap();
        session.wait().unwrap();
        assert!(session.palette().is_some());

        session.start(1000.0).unwrap();
        assert!(session.palette().is_none());
        assert!(session.index_map().is_none());

        session.wait().unwrap();
        assert_eq!(session.palette().map(|p| p.len()), Some(1));
        assert_eq!(session.tolerance().raw(), 1000.0);
    }

    #[test]
    fn test_cancel_stops_events() {
        let image = Arc::new(checker(128, 128, 2));
        let mut session = Session::new();
        session.load(Arc::clone(&image), TileSize::new(2, 2)).unwrap();
        session.start(0.0).unwrap();

        assert_eq!(session.next_event(), Some(SessionEvent::Started));
        session.cancel();

        // Only this test and the session still hold the image.
        assert_eq!(Arc::strong_count(&image), 2);

        assert!(!session.is_running());
        assert_eq!(session.poll(), None);
        assert_eq!(session.next_event(), None);
        assert!(session.palette().is_none());
    }

    #[test]
    fn test_restart_never_overlaps_passes() {
        let image = Arc::new(checker(256, 256, 2));
        let mut session = Session::new();
        session.load(Arc::clone(&image), TileSize::new(2, 2)).unwrap();

        session.start(0.0).unwrap();
        assert_eq!(session.next_event(), Some(SessionEvent::Started));

        session.start(0.5).unwrap();
        // Test, session and at most one worker.
        assert!(Arc::strong_count(&image) <= 3);

        session.wait().unwrap();
        assert_eq!(session.palette().map(|p| p.len()), Some(2));
        assert_eq!(Arc::strong_count(&image), 2);
    }

    #[test]
    fn test_poll_clears_pass_when_worker_disconnects() {
        let mut session = Session::new();
        let shape = session.load(checker(2, 2, 8), TileSize::new(8, 8)).unwrap();
        session.active = Some(ExtractionHandle::detached(shape));
        assert!(session.is_running());

        assert_eq!(session.poll(), None);
        assert!(!session.is_running());
    }

    #[test]
    fn test_events_in_order() {
        let mut session = Session::new();
        session.load(checker(3, 3, 4), TileSize::new(4, 4)).unwrap();
        session.start(0.0).unwrap();

        let mut events = Vec::new();
        while let Some(event) = session.next_event() {
            events.push(event);
        }

        assert_eq!(events.first(), Some(&SessionEvent::Started));
        assert!(matches!(
            events.last(),
            Some(SessionEvent::Completed { tiles: 2, .. })
        ));
        assert_eq!(events.len(), 1 + 3 + 1);
    }
}

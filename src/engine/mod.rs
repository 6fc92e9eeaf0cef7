//! Tile deduplication engine.
//!
//! The synchronous core lives in `dedup`; `worker` runs it on a background
//! thread with streamed events and cancellation, and `session` wraps a
//! worker in the state a single caller holds between passes.

mod dedup;
mod session;
mod worker;

pub use dedup::{
    extract_tiles, run_extraction, tile_distance, within_tolerance, Deduplicator, ExtractEvent,
    ExtractResult,
};
pub use session::{Session, SessionEvent};
pub use worker::{CancelToken, ExtractRequest, ExtractionHandle, Extractor};

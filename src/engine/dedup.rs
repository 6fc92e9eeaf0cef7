//! Tolerance-based tile deduplication.
//!
//! Cells are visited in row-major order. Each candidate is compared against
//! the palette oldest-first and the first tile within tolerance wins; a
//! candidate with no match becomes a new palette entry. The scan is fully
//! deterministic.

use std::time::{Duration, Instant};

use crate::types::{GridShape, IndexMap, Palette, PixelBuffer, Tile, Tolerance};

use super::worker::CancelToken;

/// Bytes compared between early-exit checks in [`within_tolerance`].
const DISTANCE_CHUNK: usize = 256;

/// Events streamed from an extraction pass, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractEvent {
    /// The pass has begun.
    Started,
    /// Fraction of cells processed, in `[0, 1]`.
    Progress(f64),
    /// The pass finished.
    Result(ExtractResult),
}

/// The product of a completed pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractResult {
    pub palette: Palette,
    pub index_map: IndexMap,
    /// Wall-clock duration of the pass.
    pub elapsed: Duration,
}

impl ExtractResult {
    /// Elapsed time in whole milliseconds.
    pub fn elapsed_ms(&self) -> u128 {
        self.elapsed.as_millis()
    }
}

/// Incremental first-match deduplicator over one grid.
pub struct Deduplicator {
    shape: GridShape,
    tolerance: Tolerance,
    palette: Palette,
    index_map: IndexMap,
}

impl Deduplicator {
    pub fn new(shape: GridShape, tolerance: Tolerance) -> Self {
        Self {
            shape,
            tolerance,
            palette: Palette::new(),
            index_map: Vec::with_capacity(shape.total_cells()),
        }
    }

    /// Classify the cell at (row, col) and record its palette index.
    pub fn push_cell(&mut self, buffer: &PixelBuffer, row: u32, col: u32) -> u32 {
        let candidate = buffer.crop(
            col * self.shape.tile_width,
            row * self.shape.tile_height,
            self.shape.tile_width,
            self.shape.tile_height,
        );
        let index = self.classify(candidate);
        self.index_map.push(index);
        index
    }

    /// Index of the first palette tile within tolerance of `candidate`.
    pub fn find_match(&self, candidate: &Tile) -> Option<u32> {
        self.palette
            .iter()
            .find(|(_, tile)| within_tolerance(candidate.as_raw(), tile.as_raw(), self.tolerance))
            .map(|(index, _)| index)
    }

    /// Cells classified so far.
    pub fn cells_done(&self) -> usize {
        self.index_map.len()
    }

    pub fn finish(self) -> (Palette, IndexMap) {
        (self.palette, self.index_map)
    }

    fn classify(&mut self, candidate: Tile) -> u32 {
        match self.find_match(&candidate) {
            Some(index) => index,
            None => self.palette.push(candidate),
        }
    }
}

/// Sum over every pixel and channel of the absolute difference.
pub fn tile_distance(a: &[u8], b: &[u8]) -> u64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| x.abs_diff(y) as u64)
        .sum()
}

/// Whether two tiles are within tolerance.
///
/// Stops summing once the threshold is exceeded; the outcome is the same as
/// comparing the full [`tile_distance`].
pub fn within_tolerance(a: &[u8], b: &[u8], tolerance: Tolerance) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut sum: u64 = 0;
    for (chunk_a, chunk_b) in a.chunks(DISTANCE_CHUNK).zip(b.chunks(DISTANCE_CHUNK)) {
        sum += tile_distance(chunk_a, chunk_b);
        if !tolerance.accepts(sum) {
            return false;
        }
    }
    true
}

/// Deduplicate a whole grid synchronously, without events.
pub fn extract_tiles(
    buffer: &PixelBuffer,
    shape: &GridShape,
    tolerance: Tolerance,
) -> (Palette, IndexMap) {
    let mut dedup = Deduplicator::new(*shape, tolerance);
    for (row, col) in shape.iter_cells() {
        dedup.push_cell(buffer, row, col);
    }
    dedup.finish()
}

/// Run one full pass, emitting `Started`, per-row `Progress` and `Result`.
///
/// The token is checked before every cell. Returns `false` if the pass was
/// cancelled, in which case no `Result` is emitted.
pub fn run_extraction(
    buffer: &PixelBuffer,
    shape: &GridShape,
    tolerance: Tolerance,
    cancel: &CancelToken,
    mut emit: impl FnMut(ExtractEvent),
) -> bool {
    let start = Instant::now();
    let total = shape.total_cells();
    let mut dedup = Deduplicator::new(*shape, tolerance);

    emit(ExtractEvent::Started);

    for row in 0..shape.num_rows {
        for col in 0..shape.num_cols {
            if cancel.is_cancelled() {
                return false;
            }
            dedup.push_cell(buffer, row, col);
        }
        let fraction = dedup.cells_done() as f64 / total as f64;
        emit(ExtractEvent::Progress(fraction.clamp(0.0, 1.0)));
    }

    if cancel.is_cancelled() {
        return false;
    }

    let (palette, index_map) = dedup.finish();
    emit(ExtractEvent::Result(ExtractResult {
        palette,
        index_map,
        elapsed: start.elapsed(),
    }));
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::reconstruct;
    use crate::types::Colour;
    use pretty_assertions::assert_eq;

    /// Build an image from a grid of tile colours, each tile solid.
    fn solid_tiles(colours: &[&[Colour]], tile: u32) -> (PixelBuffer, GridShape) {
        let rows = colours.len() as u32;
        let cols = colours[0].len() as u32;
        let mut buffer = PixelBuffer::blank(cols * tile, rows * tile);
        for (r, row) in colours.iter().enumerate() {
            for (c, &colour) in row.iter().enumerate() {
                let t = PixelBuffer::from_pixel(tile, tile, colour);
                buffer.blit(&t, c as u32 * tile, r as u32 * tile);
            }
        }
        let shape = GridShape::derive(buffer.width(), buffer.height(), tile, tile).unwrap();
        (buffer, shape)
    }

    /// Deterministic pseudo-random image with a small set of tile variants.
    fn noisy_image(cols: u32, rows: u32, tile: u32) -> (PixelBuffer, GridShape) {
        let mut buffer = PixelBuffer::blank(cols * tile, rows * tile);
        let mut seed: u32 = 0x2545_f491;
        for y in 0..buffer.height() {
            for x in 0..buffer.width() {
                let cell = (x / tile) + (y / tile) * cols;
                seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                let jitter = ((seed >> 16) % 6) as u8;
                let base = ((cell % 5) * 40) as u8;
                buffer.put(x, y, Colour::rgb(base + jitter, base, 255 - base));
            }
        }
        let shape = GridShape::derive(buffer.width(), buffer.height(), tile, tile).unwrap();
        (buffer, shape)
    }

    #[test]
    fn test_identical_tiles_collapse() {
        let red = Colour::rgb(255, 0, 0);
        let (buffer, shape) = solid_tiles(&[&[red; 4], &[red; 4]], 8);

        let (palette, index_map) = extract_tiles(&buffer, &shape, Tolerance::EXACT);

        assert_eq!(palette.len(), 1);
        assert_eq!(index_map, vec![0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_single_channel_difference() {
        let mut buffer = PixelBuffer::from_pixel(16, 8, Colour::rgb(100, 100, 100));
        buffer.put(12, 3, Colour::rgb(110, 100, 100));
        let shape = GridShape::derive(16, 8, 8, 8).unwrap();

        let loose = Tolerance::new(10.0 / 1024.0).unwrap();
        let (palette, index_map) = extract_tiles(&buffer, &shape, loose);
        assert_eq!(palette.len(), 1);
        assert_eq!(index_map, vec![0, 0]);

        let strict = Tolerance::new(9.0 / 1024.0).unwrap();
        let (palette, index_map) = extract_tiles(&buffer, &shape, strict);
        assert_eq!(palette.len(), 2);
        assert_eq!(index_map, vec![0, 1]);
    }

    #[test]
    fn test_near_duplicate_joins_existing_tile() {
        let grey = |v| Colour::rgb(v, v, v);
        let (buffer, shape) = solid_tiles(&[&[grey(0), grey(40), grey(12)]], 1);

        // 1x1 tiles: 0 vs 40 is 120 apart, 12 vs 0 is 36
        let tolerance = Tolerance::new(100.0 / 1024.0).unwrap();
        let (palette, index_map) = extract_tiles(&buffer, &shape, tolerance);

        assert_eq!(palette.len(), 2);
        assert_eq!(index_map, vec![0, 1, 0]);
    }

    #[test]
    fn test_first_match_prefers_oldest_when_both_match() {
        let grey = |v| Colour::rgb(v, v, v);
        let (buffer, shape) = solid_tiles(&[&[grey(0), grey(40), grey(30)]], 1);

        // 30 is within 100 of both 0 (90 apart) and 40 (30 apart), and
        // closer to 40, but the earliest entry wins
        let tolerance = Tolerance::new(100.0 / 1024.0).unwrap();
        let (_, index_map) = extract_tiles(&buffer, &shape, tolerance);
        assert_eq!(index_map, vec![0, 1, 0]);
    }

    #[test]
    fn test_palette_in_discovery_order() {
        let a = Colour::rgb(255, 0, 0);
        let b = Colour::rgb(0, 255, 0);
        let c = Colour::rgb(0, 0, 255);
        let (buffer, shape) = solid_tiles(&[&[a, b], &[b, c], &[c, a]], 2);

        let (palette, index_map) = extract_tiles(&buffer, &shape, Tolerance::EXACT);

        assert_eq!(index_map, vec![0, 1, 1, 2, 2, 0]);
        assert_eq!(palette.get(0).and_then(|t| t.get(0, 0)), Some(a));
        assert_eq!(palette.get(1).and_then(|t| t.get(0, 0)), Some(b));
        assert_eq!(palette.get(2).and_then(|t| t.get(0, 0)), Some(c));
    }

    #[test]
    fn test_index_map_shape() {
        let (buffer, shape) = noisy_image(7, 5, 4);
        for raw in [0.0, 0.01, 0.05, 1.0] {
            let (palette, index_map) =
                extract_tiles(&buffer, &shape, Tolerance::new(raw).unwrap());
            assert_eq!(index_map.len(), shape.total_cells());
            assert!(index_map.iter().all(|&i| (i as usize) < palette.len()));
        }
    }

    #[test]
    fn test_exact_match_reconstructs_source() {
        let (buffer, shape) = noisy_image(6, 4, 3);
        let (palette, index_map) = extract_tiles(&buffer, &shape, Tolerance::EXACT);

        let rebuilt = reconstruct(&palette, &index_map, &shape).unwrap();
        assert_eq!(rebuilt, buffer);
    }

    #[test]
    fn test_palette_shrinks_with_tolerance() {
        let (buffer, shape) = noisy_image(8, 6, 4);
        let mut previous = usize::MAX;
        for raw in [0.0, 0.1, 0.5, 2.0, 100.0] {
            let (palette, _) = extract_tiles(&buffer, &shape, Tolerance::new(raw).unwrap());
            assert!(
                palette.len() <= previous,
                "palette grew from {} to {} at tolerance {}",
                previous,
                palette.len(),
                raw
            );
            previous = palette.len();
        }
        assert_eq!(previous, 1);
    }

    #[test]
    fn test_deterministic() {
        let (buffer, shape) = noisy_image(5, 5, 4);
        let tolerance = Tolerance::new(0.05).unwrap();
        let first = extract_tiles(&buffer, &shape, tolerance);
        let second = extract_tiles(&buffer, &shape, tolerance);
        assert_eq!(first, second);
    }

    #[test]
    fn test_tile_distance() {
        assert_eq!(tile_distance(&[0, 0, 0, 0], &[0, 0, 0, 0]), 0);
        assert_eq!(tile_distance(&[10, 0, 255, 0], &[0, 10, 0, 255]), 530);
    }

    #[test]
    fn test_within_tolerance_matches_full_distance() {
        let a: Vec<u8> = (0..2048).map(|i| (i % 251) as u8).collect();
        let b: Vec<u8> = (0..2048).map(|i| (i % 241) as u8).collect();
        let distance = tile_distance(&a, &b);

        let at = Tolerance::new(distance as f64 / 1024.0).unwrap();
        let below = Tolerance::new((distance - 1) as f64 / 1024.0).unwrap();
        assert!(within_tolerance(&a, &b, at));
        assert!(!within_tolerance(&a, &b, below));
    }

    #[test]
    fn test_run_extraction_event_order() {
        let (buffer, shape) = noisy_image(3, 4, 2);
        let mut events = Vec::new();

        let completed = run_extraction(
            &buffer,
            &shape,
            Tolerance::EXACT,
            &CancelToken::new(),
            |e| events.push(e),
        );

        assert!(completed);
        assert_eq!(events.first(), Some(&ExtractEvent::Started));
        // One progress event per row, then the result
        assert_eq!(events.len(), 1 + 4 + 1);

        let progress: Vec<f64> = events
            .iter()
            .filter_map(|e| match e {
                ExtractEvent::Progress(p) => Some(*p),
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![0.25, 0.5, 0.75, 1.0]);

        match events.last() {
            Some(ExtractEvent::Result(result)) => {
                let (palette, index_map) = extract_tiles(&buffer, &shape, Tolerance::EXACT);
                assert_eq!(result.palette, palette);
                assert_eq!(result.index_map, index_map);
            }
            other => panic!("expected result, got {:?}", other),
        }
    }

    #[test]
    fn test_run_extraction_cancelled() {
        let (buffer, shape) = noisy_image(4, 4, 2);
        let token = CancelToken::new();
        let mut events = Vec::new();

        let completed = run_extraction(&buffer, &shape, Tolerance::EXACT, &token, |e| {
            if matches!(e, ExtractEvent::Progress(_)) {
                token.cancel();
            }
            events.push(e);
        });

        assert!(!completed);
        assert!(!events.iter().any(|e| matches!(e, ExtractEvent::Result(_))));
        assert_eq!(events.len(), 2);
    }
}

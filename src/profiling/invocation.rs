//! Sample store for a single kernel invocation.

use super::result::ResultData;

/// Result records of one kernel execution, laid out `[tile][result index]`.
#[derive(Debug, Clone)]
pub struct InvocationData {
    results: Vec<ResultData>,
    results_num: usize,
    tiles_num: usize,
    simd_enabled: bool,
    collected: bool,
}

impl InvocationData {
    /// Zero-initialised store for `results_num × tiles_num` records.
    pub fn new(results_num: usize, tiles_num: usize, simd_enabled: bool) -> Self {
        Self {
            results: vec![ResultData::default(); results_num * tiles_num],
            results_num,
            tiles_num,
            simd_enabled,
            collected: false,
        }
    }

    fn slot(&self, tile_id: usize, result_index: usize) -> usize {
        assert!(
            tile_id < self.tiles_num,
            "tile id {} out of range (tiles: {})",
            tile_id,
            self.tiles_num
        );
        assert!(
            result_index < self.results_num,
            "result index {} out of range (results: {})",
            result_index,
            self.results_num
        );
        tile_id * self.results_num + result_index
    }

    /// Store counters for (tile, index), overwriting any earlier value.
    ///
    /// # Panics
    /// If `tile_id` or `result_index` is outside the kernel's shape.
    pub fn record_result(
        &mut self,
        tile_id: usize,
        result_index: usize,
        instruction_counter: u64,
        simd_active_lane_counter: u64,
    ) {
        let slot = self.slot(tile_id, result_index);
        let simd = if self.simd_enabled {
            simd_active_lane_counter
        } else {
            0
        };
        self.results[slot] = ResultData {
            instruction_counter,
            simd_active_lane_counter: simd,
        };
    }

    pub fn mark_collected(&mut self, collected: bool) {
        self.collected = collected;
    }

    /// True only if every instrumentation point was read back.
    pub fn is_collected(&self) -> bool {
        self.collected
    }

    /// Stored record, zero if never recorded.
    pub fn result_data(&self, tile_id: usize, result_index: usize) -> ResultData {
        self.results[self.slot(tile_id, result_index)]
    }

    pub fn results_num(&self) -> usize {
        self.results_num
    }

    pub fn tiles_num(&self) -> usize {
        self.tiles_num
    }

    pub fn simd_enabled(&self) -> bool {
        self.simd_enabled
    }
}

//! Kernel-level aggregation across invocations.

use rayon::prelude::*;

use super::invocation::InvocationData;
use super::result::{AssemblyLine, ResultDataCommon};

/// Per-index sums for one tile, plus the column maxima used for alignment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileTotals {
    pub instruction_counts: Vec<u64>,
    pub simd_counts: Vec<u64>,
    pub max_instruction_count: u64,
    pub max_simd_count: u64,
}

/// All invocations of one compiled kernel.
///
/// Shape (`results_num`, tiles, assembly, per-index common data) is fixed at
/// construction; only the invocation list grows.
#[derive(Debug, Clone)]
pub struct KernelData {
    name: String,
    result_data_common: Vec<ResultDataCommon>,
    orig_asm: Vec<AssemblyLine>,
    collected_tiles_num: usize,
    simd_enabled: bool,
    invocations: Vec<InvocationData>,
}

impl KernelData {
    /// # Panics
    /// If `collected_tiles_num` is zero.
    pub fn new(
        name: impl Into<String>,
        result_data_common: Vec<ResultDataCommon>,
        orig_asm: Vec<AssemblyLine>,
        collected_tiles_num: usize,
        simd_enabled: bool,
    ) -> Self {
        assert!(collected_tiles_num > 0, "kernel must collect at least one tile");
        Self {
            name: name.into(),
            result_data_common,
            orig_asm,
            collected_tiles_num,
            simd_enabled,
            invocations: Vec::new(),
        }
    }

    pub fn kernel_name(&self) -> &str {
        &self.name
    }

    /// Append an empty invocation and return its index (execution order).
    pub fn add_invocation(&mut self) -> usize {
        self.invocations.push(InvocationData::new(
            self.results_num(),
            self.collected_tiles_num,
            self.simd_enabled,
        ));
        self.invocations.len() - 1
    }

    pub fn invocations(&self) -> &[InvocationData] {
        &self.invocations
    }

    pub fn invocation_mut(&mut self, index: usize) -> Option<&mut InvocationData> {
        self.invocations.get_mut(index)
    }

    /// Number of invocations whose counters were fully read back.
    pub fn collected_count(&self) -> usize {
        self.invocations.iter().filter(|i| i.is_collected()).count()
    }

    pub fn results_num(&self) -> usize {
        self.result_data_common.len()
    }

    pub fn collected_tiles_num(&self) -> usize {
        self.collected_tiles_num
    }

    pub fn orig_asm(&self) -> &[AssemblyLine] {
        &self.orig_asm
    }

    pub fn result_data_common(&self) -> &[ResultDataCommon] {
        &self.result_data_common
    }

    pub fn simd_enabled(&self) -> bool {
        self.simd_enabled
    }

    /// Sum counters of every invocation for one tile.
    pub fn aggregate_tile(&self, tile_id: usize) -> TileTotals {
        let results_num = self.results_num();
        let mut totals = TileTotals {
            instruction_counts: vec![0; results_num],
            simd_counts: vec![0; results_num],
            ..TileTotals::default()
        };
        for idx in 0..results_num {
            for invocation in &self.invocations {
                let r = invocation.result_data(tile_id, idx);
                totals.instruction_counts[idx] =
                    totals.instruction_counts[idx].saturating_add(r.instruction_counter);
                totals.simd_counts[idx] =
                    totals.simd_counts[idx].saturating_add(r.simd_active_lane_counter);
            }
            totals.max_instruction_count = totals
                .max_instruction_count
                .max(totals.instruction_counts[idx]);
            totals.max_simd_count = totals.max_simd_count.max(totals.simd_counts[idx]);
        }
        totals
    }

    /// Totals for every collected tile, in tile order.
    pub fn aggregate(&self) -> Vec<TileTotals> {
        (0..self.collected_tiles_num)
            .into_par_iter()
            .map(|tile_id| self.aggregate_tile(tile_id))
            .collect()
    }
}

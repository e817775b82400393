//! Recorded counter captures and their replay through a [`Profiler`].
//!
//! A capture holds what a live instrumentation engine would have delivered:
//! kernel shapes at compile time and raw counters per invocation. Replaying it
//! drives the same callbacks, so policy (run filter, SIMD, tiles) applies as
//! it would during a live run.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::control::{GpuPlatform, KernelBuildDescriptor, KernelExecDescriptor};
use crate::errors::ProfilerError;
use crate::profiler::{KernelShape, Profiler};
use crate::profiling::{AssemblyLine, KernelId, ResultDataCommon};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Capture {
    pub kernels: Vec<CapturedKernel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedKernel {
    pub id: KernelId,
    pub name: String,
    #[serde(default = "default_tile_count")]
    pub tile_count: usize,
    pub instructions: Vec<CapturedInstruction>,
    #[serde(default)]
    pub invocations: Vec<CapturedInvocation>,
}

fn default_tile_count() -> usize {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedInstruction {
    pub bbl_id: u32,
    pub offset: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asm: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedInvocation {
    pub run_idx: u32,
    #[serde(default = "default_true")]
    pub platform_profiling_enabled: bool,
    #[serde(default)]
    pub collected: bool,
    pub records: Vec<CapturedRecord>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedRecord {
    #[serde(default)]
    pub tile: usize,
    pub index: usize,
    pub instructions: u64,
    #[serde(default)]
    pub simd_lanes: u64,
}

/// Counts of what a replay fed into the profiler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub kernels_instrumented: usize,
    pub invocations_profiled: usize,
    pub invocations_skipped: usize,
    /// Records of tiles above 0 added into tile 0 (per-tile collection off).
    pub records_merged: usize,
}

impl Capture {
    pub fn from_file(path: &Path) -> Result<Self, ProfilerError> {
        let content = std::fs::read_to_string(path)?;
        let capture: Capture = serde_json::from_str(&content)?;
        capture.validate()?;
        Ok(capture)
    }

    pub fn save(&self, path: &Path) -> Result<(), ProfilerError> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Reject duplicate kernel ids and records that would breach a kernel's shape.
    pub fn validate(&self) -> Result<(), ProfilerError> {
        let mut ids = HashSet::new();
        for kernel in &self.kernels {
            if !ids.insert(kernel.id) {
                return Err(ProfilerError::InvalidCapture(format!(
                    "kernel '{}': duplicate id {}",
                    kernel.name, kernel.id
                )));
            }
            let results_num = kernel.instructions.len();
            for inv in &kernel.invocations {
                for r in &inv.records {
                    if r.index >= results_num {
                        return Err(ProfilerError::InvalidCapture(format!(
                            "kernel '{}' run {}: index {} >= {}",
                            kernel.name, inv.run_idx, r.index, results_num
                        )));
                    }
                    if r.tile >= kernel.tile_count.max(1) {
                        return Err(ProfilerError::InvalidCapture(format!(
                            "kernel '{}' run {}: tile {} >= {}",
                            kernel.name, inv.run_idx, r.tile, kernel.tile_count
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

impl CapturedKernel {
    fn shape(&self) -> KernelShape {
        KernelShape {
            name: self.name.clone(),
            result_data_common: self
                .instructions
                .iter()
                .map(|i| ResultDataCommon::new(i.bbl_id, i.offset))
                .collect(),
            // Decoded stream stops at the first instruction without text.
            orig_asm: self
                .instructions
                .iter()
                .map_while(|i| i.asm.as_deref().map(AssemblyLine::new))
                .collect(),
        }
    }
}

/// Feed `capture` through the profiler callbacks. The profiler must be active.
pub fn replay(capture: &Capture, profiler: &Profiler) -> Result<ReplaySummary, ProfilerError> {
    capture.validate()?;
    let mut summary = ReplaySummary::default();
    for kernel in &capture.kernels {
        let build = KernelBuildDescriptor {
            kernel_name: kernel.name.clone(),
            tile_count: kernel.tile_count.max(1),
        };
        if !profiler.on_kernel_build(kernel.id, &build, kernel.shape()) {
            continue;
        }
        summary.kernels_instrumented += 1;

        for inv in &kernel.invocations {
            let exec = KernelExecDescriptor {
                kernel_name: kernel.name.clone(),
                run_idx: inv.run_idx,
                gpu_platform: GpuPlatform::LevelZero,
                platform_profiling_enabled: inv.platform_profiling_enabled,
            };
            let Some(recorder) = profiler.on_kernel_run(kernel.id, &exec) else {
                summary.invocations_skipped += 1;
                continue;
            };
            let (_, tiles) = recorder.shape();
            // Without per-tile collection the device reports one total per
            // index, so every tile lands in tile 0.
            let mut totals: BTreeMap<(usize, usize), (u64, u64)> = BTreeMap::new();
            for r in &inv.records {
                let tile = if tiles == 1 { 0 } else { r.tile };
                if tile != r.tile {
                    summary.records_merged += 1;
                }
                let slot = totals.entry((tile, r.index)).or_default();
                slot.0 = slot.0.saturating_add(r.instructions);
                slot.1 = slot.1.saturating_add(r.simd_lanes);
            }
            for ((tile, index), (instructions, simd_lanes)) in totals {
                recorder.record_result(tile, index, instructions, simd_lanes);
            }
            recorder.mark_collected(inv.collected);
            summary.invocations_profiled += 1;
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    const K1_JSON: &str = r#"{
        "kernels": [{
            "id": 1,
            "name": "K1",
            "instructions": [
                {"bbl_id": 0, "offset": 0, "asm": "mov"},
                {"bbl_id": 0, "offset": 16, "asm": "add"},
                {"bbl_id": 1, "offset": 32, "asm": "send"}
            ],
            "invocations": [
                {"run_idx": 0, "collected": true, "records": [
                    {"index": 0, "instructions": 4},
                    {"index": 1, "instructions": 4},
                    {"index": 2, "instructions": 10}
                ]},
                {"run_idx": 1, "records": [
                    {"index": 0, "instructions": 3},
                    {"index": 1, "instructions": 3}
                ]}
            ]
        }]
    }"#;

    #[test]
    fn parses_with_defaults() {
        let c: Capture = serde_json::from_str(K1_JSON).unwrap();
        let k = &c.kernels[0];
        assert_eq!(k.tile_count, 1);
        assert!(k.invocations[0].platform_profiling_enabled);
        assert!(!k.invocations[1].collected);
        assert_eq!(k.invocations[0].records[2].simd_lanes, 0);
        c.validate().unwrap();
    }

    #[test]
    fn validate_rejects_out_of_range_index() {
        let mut c: Capture = serde_json::from_str(K1_JSON).unwrap();
        c.kernels[0].invocations[0].records[0].index = 3;
        assert!(matches!(c.validate(), Err(ProfilerError::InvalidCapture(_))));
    }

    #[test]
    fn validate_rejects_duplicate_kernel_id() {
        let mut c: Capture = serde_json::from_str(K1_JSON).unwrap();
        let mut second = c.kernels[0].clone();
        second.name = "K1_again".to_string();
        second.instructions.push(CapturedInstruction {
            bbl_id: 2,
            offset: 48,
            asm: Some("ret".to_string()),
        });
        second.invocations[0].records.push(CapturedRecord {
            tile: 0,
            index: 3,
            instructions: 1,
            simd_lanes: 0,
        });
        c.kernels.push(second);
        match c.validate() {
            Err(ProfilerError::InvalidCapture(msg)) => assert!(msg.contains("duplicate id 1")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn validate_rejects_out_of_range_tile() {
        let mut c: Capture = serde_json::from_str(K1_JSON).unwrap();
        c.kernels[0].invocations[0].records[0].tile = 1;
        assert!(matches!(c.validate(), Err(ProfilerError::InvalidCapture(_))));
    }

    #[test]
    fn assembly_truncates_at_first_gap() {
        let mut c: Capture = serde_json::from_str(K1_JSON).unwrap();
        c.kernels[0].instructions[1].asm = None;
        let shape = c.kernels[0].shape();
        assert_eq!(shape.result_data_common.len(), 3);
        assert_eq!(shape.orig_asm.len(), 1);
    }

    #[test]
    fn save_and_load() {
        let c: Capture = serde_json::from_str(K1_JSON).unwrap();
        let path = std::env::temp_dir().join("gpu_inst_count_capture_test.json");
        c.save(&path).unwrap();
        let loaded = Capture::from_file(&path).unwrap();
        assert_eq!(loaded.kernels[0].invocations.len(), 2);
        let _ = std::fs::remove_file(&path);
    }
}

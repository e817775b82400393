//! Per-instrumentation-point records.

use serde::{Deserialize, Serialize};

/// Identifies one instrumentation point of a compiled kernel.
///
/// Shared read-only by every invocation of the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultDataCommon {
    /// Basic block id, non-decreasing in program order.
    pub bbl_id: u32,
    /// Byte offset within the kernel binary.
    pub offset: u32,
}

impl ResultDataCommon {
    pub fn new(bbl_id: u32, offset: u32) -> Self {
        Self { bbl_id, offset }
    }
}

/// Counters read back for one (tile, result index) of one invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultData {
    pub instruction_counter: u64,
    /// Zero when SIMD lane collection is disabled.
    pub simd_active_lane_counter: u64,
}

/// One line of the decoded kernel binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyLine {
    text: String,
}

impl AssemblyLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Original disassembly text.
    pub fn asm_line_orig(&self) -> &str {
        &self.text
    }
}

impl From<&str> for AssemblyLine {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

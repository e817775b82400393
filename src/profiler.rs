//! Profiler context: owns policy, writer, instrumentation toggle and the
//! collected data, and exposes the callbacks the instrumentation engine drives.
//!
//! Lifecycle is `Inactive -> Active -> Stopped`. Starting twice or stopping a
//! profiler that is not active is a caller bug and panics. Failures of the
//! driver toggle are logged and remembered in [`Profiler::last_error`] but
//! never stop the profiled application.

use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::control::{Control, KernelBuildDescriptor, KernelExecDescriptor};
use crate::errors::ProfilerError;
use crate::instrumentation::InstrumentationToggle;
use crate::profiling::{
    lock_kernel, ApplicationData, AssemblyLine, KernelData, KernelHandle, KernelId,
    ResultDataCommon,
};
use crate::report::Writer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfilerStatus {
    Inactive,
    Active,
    Stopped,
}

/// Immutable shape of a compiled kernel, as decoded by the instrumentation
/// engine. `result_data_common[i]` and `orig_asm[i]` describe result index `i`.
#[derive(Debug, Clone)]
pub struct KernelShape {
    pub name: String,
    pub result_data_common: Vec<ResultDataCommon>,
    pub orig_asm: Vec<AssemblyLine>,
}

pub struct Profiler {
    writer: Box<dyn Writer>,
    control: Box<dyn Control>,
    toggle: Mutex<InstrumentationToggle>,
    status: Mutex<ProfilerStatus>,
    last_error: Mutex<Option<String>>,
    data: ApplicationData,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Profiler {
    pub fn new(
        writer: Box<dyn Writer>,
        control: Box<dyn Control>,
        toggle: InstrumentationToggle,
    ) -> Self {
        Self {
            writer,
            control,
            toggle: Mutex::new(toggle),
            status: Mutex::new(ProfilerStatus::Inactive),
            last_error: Mutex::new(None),
            data: ApplicationData::new(),
        }
    }

    pub fn status(&self) -> ProfilerStatus {
        *lock(&self.status)
    }

    /// Description of the most recent toggle failure.
    pub fn last_error(&self) -> Option<String> {
        lock(&self.last_error).clone()
    }

    pub fn data(&self) -> &ApplicationData {
        &self.data
    }

    /// Begin collection.
    ///
    /// # Panics
    /// If the profiler was already started.
    pub fn start(&self) -> Result<(), ProfilerError> {
        {
            let mut status = lock(&self.status);
            assert_eq!(
                *status,
                ProfilerStatus::Inactive,
                "profiler started twice"
            );
            *status = ProfilerStatus::Active;
        }
        info!("instruction count profiling started");
        let result = lock(&self.toggle).enable();
        self.note_failure("enable", result)
    }

    /// End collection and write the report.
    ///
    /// # Panics
    /// If the profiler is not active.
    pub fn stop(&self) -> Result<(), ProfilerError> {
        {
            let mut status = lock(&self.status);
            assert_eq!(
                *status,
                ProfilerStatus::Active,
                "profiler stopped while not active"
            );
            *status = ProfilerStatus::Stopped;
        }
        let result = lock(&self.toggle).disable();
        let result = self.note_failure("disable", result);
        info!("writing report for {} kernel(s)", self.data.len());
        self.writer.write(&self.data);
        result
    }

    fn note_failure(
        &self,
        what: &str,
        result: Result<(), ProfilerError>,
    ) -> Result<(), ProfilerError> {
        if let Err(e) = &result {
            warn!("instrumentation {} failed: {}", what, e);
            *lock(&self.last_error) = Some(e.to_string());
        }
        result
    }

    fn is_active(&self) -> bool {
        self.status() == ProfilerStatus::Active
    }

    /// Kernel compile callback. Returns true if the kernel is instrumented.
    pub fn on_kernel_build(
        &self,
        id: KernelId,
        build: &KernelBuildDescriptor,
        shape: KernelShape,
    ) -> bool {
        if !self.is_active() || !self.control.should_instrument(build) {
            return false;
        }
        let tiles = if self.control.enable_per_tile_collection(build) {
            build.tile_count.max(1)
        } else {
            1
        };
        let simd = self.control.should_collect_simd_width();
        let (_, inserted) = self.data.get_or_insert_with(id, || {
            KernelData::new(
                shape.name,
                shape.result_data_common,
                shape.orig_asm,
                tiles,
                simd,
            )
        });
        if inserted {
            debug!(
                "instrumented kernel {} ({}): {} tile(s), simd={}",
                id, build.kernel_name, tiles, simd
            );
        }
        true
    }

    /// Kernel enqueue callback. Returns a recorder if this run is profiled.
    pub fn on_kernel_run(
        &self,
        id: KernelId,
        exec: &KernelExecDescriptor,
    ) -> Option<InvocationRecorder> {
        if !self.is_active() || !self.control.should_profile_enqueue(exec) {
            return None;
        }
        let Some(kernel) = self.data.kernel(id) else {
            debug!("run of uninstrumented kernel {} ({})", id, exec.kernel_name);
            return None;
        };
        let index = lock_kernel(&kernel).add_invocation();
        debug!(
            "profiling run {} of kernel {} as invocation {}",
            exec.run_idx, exec.kernel_name, index
        );
        Some(InvocationRecorder { kernel, index })
    }
}

/// Write access to one invocation's counters.
pub struct InvocationRecorder {
    kernel: KernelHandle,
    index: usize,
}

impl InvocationRecorder {
    pub fn index(&self) -> usize {
        self.index
    }

    /// # Panics
    /// If `tile_id` or `result_index` is outside the kernel's shape.
    pub fn record_result(
        &self,
        tile_id: usize,
        result_index: usize,
        instruction_counter: u64,
        simd_active_lane_counter: u64,
    ) {
        let mut kernel = lock_kernel(&self.kernel);
        kernel
            .invocation_mut(self.index)
            .expect("recorder index comes from add_invocation")
            .record_result(
                tile_id,
                result_index,
                instruction_counter,
                simd_active_lane_counter,
            );
    }

    pub fn mark_collected(&self, collected: bool) {
        let mut kernel = lock_kernel(&self.kernel);
        kernel
            .invocation_mut(self.index)
            .expect("recorder index comes from add_invocation")
            .mark_collected(collected);
    }

    /// Kernel shape, for producers that need bounds before reading back.
    pub fn shape(&self) -> (usize, usize) {
        let kernel = lock_kernel(&self.kernel);
        (kernel.results_num(), kernel.collected_tiles_num())
    }
}

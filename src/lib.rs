//! # gpu-inst-count
//!
//! Aggregation and reporting engine for an instrumentation-driven GPU
//! profiler that counts executed instructions and active SIMD lanes per basic
//! block of a kernel.
//!
//! ## Architecture
//!
//! - **Data model** ([`profiling`]): per-invocation result records, kernels and
//!   the application root, summed across invocations at report time
//! - **Policy** ([`control`]): which kernels to instrument and which runs to profile
//! - **Report** ([`report`]): deterministic per-instruction text report
//! - **Profiler** ([`profiler`]): start/stop context hosting the collection callbacks
//! - **Capture** ([`capture`]): offline replay of recorded counters

pub mod capture;
pub mod config;
pub mod control;
pub mod demo;
pub mod errors;
pub mod instrumentation;
pub mod profiler;
pub mod profiling;
pub mod report;

pub use capture::{replay, Capture, ReplaySummary};
pub use config::InstCountConfig;
pub use control::{
    Control, GpuPlatform, InstCountControl, KernelBuildDescriptor, KernelExecDescriptor,
};
pub use demo::{create_demo_capture, create_demo_capture_seeded};
pub use errors::ProfilerError;
pub use instrumentation::{InProcessBackend, InstrumentationToggle, TracingBackend};
pub use profiler::{InvocationRecorder, KernelShape, Profiler, ProfilerStatus};
pub use profiling::{
    lock_kernel, ApplicationData, AssemblyLine, InvocationData, KernelData, KernelId,
    ResultData, ResultDataCommon, TileTotals,
};
pub use report::{InstCountWriter, Writer};

//! Collected data model: result records, invocations, kernels, application root.

pub mod application;
pub mod invocation;
pub mod kernel;
pub mod result;

pub use application::{lock_kernel, ApplicationData, KernelHandle, KernelId};
pub use invocation::InvocationData;
pub use kernel::{KernelData, TileTotals};
pub use result::{AssemblyLine, ResultData, ResultDataCommon};

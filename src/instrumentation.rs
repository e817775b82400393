//! Enable/disable switch for the driver's instrumentation hooks.
//!
//! A toggle created without a backend (the driver lacks the required entry
//! points) is invalid: every operation fails with `FeatureUnavailable` and the
//! caller is expected to carry on without instrumentation.

use crate::errors::ProfilerError;

/// Driver-side tracing handle.
pub trait TracingBackend: Send {
    fn enable(&mut self) -> Result<(), String>;
    fn disable(&mut self) -> Result<(), String>;
}

/// Backend for in-process producers (capture replay, demo) that need no
/// driver hooks.
#[derive(Debug, Default)]
pub struct InProcessBackend {
    enabled: bool,
}

impl InProcessBackend {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl TracingBackend for InProcessBackend {
    fn enable(&mut self) -> Result<(), String> {
        self.enabled = true;
        Ok(())
    }

    fn disable(&mut self) -> Result<(), String> {
        self.enabled = false;
        Ok(())
    }
}

pub struct InstrumentationToggle {
    backend: Option<Box<dyn TracingBackend>>,
}

impl InstrumentationToggle {
    pub fn new(backend: Box<dyn TracingBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// Toggle for a driver that cannot be instrumented.
    pub fn unavailable() -> Self {
        Self { backend: None }
    }

    pub fn in_process() -> Self {
        Self::new(Box::new(InProcessBackend::default()))
    }

    pub fn is_valid(&self) -> bool {
        self.backend.is_some()
    }

    pub fn enable(&mut self) -> Result<(), ProfilerError> {
        self.backend_mut()?.enable().map_err(ProfilerError::Tracing)
    }

    pub fn disable(&mut self) -> Result<(), ProfilerError> {
        self.backend_mut()?.disable().map_err(ProfilerError::Tracing)
    }

    fn backend_mut(&mut self) -> Result<&mut Box<dyn TracingBackend>, ProfilerError> {
        self.backend.as_mut().ok_or_else(|| {
            ProfilerError::FeatureUnavailable("instrumentation entry points not found".to_string())
        })
    }
}

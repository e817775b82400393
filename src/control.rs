//! Collection policy: which kernels to instrument and which runs to profile.

use crate::config::InstCountConfig;

/// Driver API the kernel was submitted through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPlatform {
    #[default]
    LevelZero,
    OpenCl,
}

/// What the instrumentation engine knows when a kernel is compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelBuildDescriptor {
    pub kernel_name: String,
    /// Tiles available on the target device.
    pub tile_count: usize,
}

/// What the instrumentation engine knows when a kernel is enqueued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelExecDescriptor {
    pub kernel_name: String,
    /// Index of this enqueue among all runs of the kernel.
    pub run_idx: u32,
    pub gpu_platform: GpuPlatform,
    /// Whether the execution context has profiling turned on for the platform.
    pub platform_profiling_enabled: bool,
}

/// Collection decisions. Implementations must be pure: identical inputs give
/// identical answers for the life of the process.
pub trait Control: Send + Sync {
    fn should_instrument(&self, build: &KernelBuildDescriptor) -> bool;
    fn enable_per_tile_collection(&self, build: &KernelBuildDescriptor) -> bool;
    fn should_profile_enqueue(&self, exec: &KernelExecDescriptor) -> bool;
    fn should_collect_simd_width(&self) -> bool;
}

/// Instruction-count policy driven by [`InstCountConfig`].
#[derive(Debug, Clone, Default)]
pub struct InstCountControl {
    config: InstCountConfig,
}

impl InstCountControl {
    pub fn new(config: InstCountConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InstCountConfig {
        &self.config
    }
}

impl Control for InstCountControl {
    fn should_instrument(&self, _build: &KernelBuildDescriptor) -> bool {
        true
    }

    fn enable_per_tile_collection(&self, _build: &KernelBuildDescriptor) -> bool {
        self.config.per_tile_collection
    }

    fn should_profile_enqueue(&self, exec: &KernelExecDescriptor) -> bool {
        if !exec.platform_profiling_enabled {
            return false;
        }
        self.config.kernel_runs.is_empty() || self.config.kernel_runs.contains(&exec.run_idx)
    }

    fn should_collect_simd_width(&self) -> bool {
        !self.config.disable_simd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exec(run_idx: u32, enabled: bool) -> KernelExecDescriptor {
        KernelExecDescriptor {
            kernel_name: "k".to_string(),
            run_idx,
            gpu_platform: GpuPlatform::LevelZero,
            platform_profiling_enabled: enabled,
        }
    }

    fn build() -> KernelBuildDescriptor {
        KernelBuildDescriptor {
            kernel_name: "k".to_string(),
            tile_count: 2,
        }
    }

    fn control(runs: &[u32]) -> InstCountControl {
        InstCountControl::new(InstCountConfig {
            kernel_runs: runs.to_vec(),
            ..InstCountConfig::default()
        })
    }

    #[test]
    fn always_instruments() {
        assert!(control(&[]).should_instrument(&build()));
    }

    #[test]
    fn platform_flag_gates_everything() {
        for runs in [&[][..], &[0, 1, 2][..]] {
            let c = control(runs);
            for run in 0..4 {
                assert!(!c.should_profile_enqueue(&exec(run, false)));
            }
        }
    }

    #[test]
    fn empty_allow_list_profiles_every_run() {
        let c = control(&[]);
        assert!((0..10).all(|run| c.should_profile_enqueue(&exec(run, true))));
    }

    #[test]
    fn allow_list_is_exact_match() {
        let c = control(&[2, 5]);
        let picked: Vec<u32> = (0..8)
            .filter(|&run| c.should_profile_enqueue(&exec(run, true)))
            .collect();
        assert_eq!(picked, vec![2, 5]);
        assert!(!c.should_profile_enqueue(&exec(0, true)));
        assert!(c.should_profile_enqueue(&exec(5, true)));
    }

    #[test]
    fn flags_follow_config() {
        let c = InstCountControl::new(InstCountConfig {
            disable_simd: true,
            per_tile_collection: true,
            kernel_runs: Vec::new(),
        });
        assert!(!c.should_collect_simd_width());
        assert!(c.enable_per_tile_collection(&build()));
        assert!(control(&[]).should_collect_simd_width());
        assert!(!control(&[]).enable_per_tile_collection(&build()));
    }
}

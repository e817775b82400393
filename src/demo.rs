//! Synthetic captures for demos, tests and benchmarks.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::capture::{
    Capture, CapturedInstruction, CapturedInvocation, CapturedKernel, CapturedRecord,
};

const OPCODES: &[&str] = &[
    "mov (8|M0) r{0}.0<1>:ud r{1}.0<1;1,0>:ud",
    "add (16|M0) r{0}.0<1>:d r{1}.0<1;1,0>:d 1:w",
    "mad (16|M0) r{0}.0<1>:f r{1}.0<1;0>:f r{0}.0<1;0>:f r{1}.0<1;0>:f",
    "mul (16|M0) r{0}.0<1>:f r{1}.0<1;1,0>:f 0.5:f",
    "cmp (16|M0) (lt)f0.0 null<1>:d r{0}.0<1;1,0>:d r{1}.0<1;1,0>:d",
    "send (16|M0) r{0} r{1} 0xC 0x4205E00",
];

const SIMD_WIDTHS: &[u64] = &[8, 16];

fn asm_line(rng: &mut impl Rng) -> String {
    let op = OPCODES[rng.gen_range(0..OPCODES.len())];
    op.replace("{0}", &rng.gen_range(2..64).to_string())
        .replace("{1}", &rng.gen_range(2..64).to_string())
}

fn demo_kernel(
    rng: &mut impl Rng,
    id: u64,
    name: &str,
    blocks: usize,
    tile_count: usize,
    runs: u32,
) -> CapturedKernel {
    let mut instructions = Vec::new();
    let mut offset = 0u32;
    // Executions per block; a loop body runs more often than the prologue.
    let mut block_trips = Vec::new();
    for bbl in 0..blocks {
        let len = rng.gen_range(2..6);
        let trips = if bbl == 0 { 1 } else { rng.gen_range(1..32u64) };
        for _ in 0..len {
            instructions.push(CapturedInstruction {
                bbl_id: bbl as u32,
                offset,
                asm: Some(asm_line(rng)),
            });
            block_trips.push(trips);
            offset += 16;
        }
    }

    let invocations = (0..runs)
        .map(|run_idx| {
            let threads = rng.gen_range(64..512u64);
            let width = SIMD_WIDTHS[rng.gen_range(0..SIMD_WIDTHS.len())];
            let mut records = Vec::new();
            for tile in 0..tile_count {
                for (index, trips) in block_trips.iter().enumerate() {
                    let instructions = threads * trips;
                    let active = rng.gen_range(width / 2..=width);
                    records.push(CapturedRecord {
                        tile,
                        index,
                        instructions,
                        simd_lanes: instructions * active,
                    });
                }
            }
            CapturedInvocation {
                run_idx,
                platform_profiling_enabled: true,
                // Occasional partial readback.
                collected: rng.gen_range(0..8) != 0,
                records,
            }
        })
        .collect();

    CapturedKernel {
        id,
        name: name.to_string(),
        tile_count,
        instructions,
        invocations,
    }
}

/// Capture with random contents.
pub fn create_demo_capture() -> Capture {
    create_demo_capture_seeded(rand::random::<u64>())
}

/// Deterministic capture from a seed: a single-tile GEMM kernel and a
/// two-tile reduction kernel.
pub fn create_demo_capture_seeded(seed: u64) -> Capture {
    let mut rng = StdRng::seed_from_u64(seed);
    let gemm = demo_kernel(&mut rng, 1, "GEMM", 4, 1, 3);
    let reduce = demo_kernel(&mut rng, 2, "Reduce", 3, 2, 2);
    Capture {
        kernels: vec![gemm, reduce],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_capture_is_deterministic() {
        let a = serde_json::to_string(&create_demo_capture_seeded(42)).unwrap();
        let b = serde_json::to_string(&create_demo_capture_seeded(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn demo_capture_is_valid() {
        let c = create_demo_capture();
        c.validate().unwrap();
        assert_eq!(c.kernels.len(), 2);
        for k in &c.kernels {
            let bbls: Vec<u32> = k.instructions.iter().map(|i| i.bbl_id).collect();
            assert!(bbls.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}

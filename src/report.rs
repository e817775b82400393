//! Text report of aggregated instruction and SIMD lane counts.

use std::io::{self, Write};

use crate::profiling::{lock_kernel, ApplicationData, KernelData};

/// Consumes fully collected data at the end of profiling.
pub trait Writer: Send + Sync {
    fn write(&self, data: &ApplicationData);
}

/// Renders per-instruction totals to the diagnostic stream (stderr).
#[derive(Debug, Clone, Copy, Default)]
pub struct InstCountWriter;

impl InstCountWriter {
    pub fn new() -> Self {
        Self
    }

    /// Render the whole report into `out`.
    pub fn render<W: Write>(&self, out: &mut W, data: &ApplicationData) -> io::Result<()> {
        writeln!(
            out,
            "[INFO] : [ Instruction count | SIMD active lanes count ] total for all invocations"
        )?;
        for (_, handle) in data.kernels() {
            let kernel = lock_kernel(&handle);
            render_kernel(out, &kernel)?;
        }
        Ok(())
    }
}

impl Writer for InstCountWriter {
    fn write(&self, data: &ApplicationData) {
        let stderr = io::stderr();
        let mut out = stderr.lock();
        if let Err(e) = self.render(&mut out, data).and_then(|_| out.flush()) {
            tracing::warn!("failed to write instruction count report: {}", e);
        }
    }
}

fn digits(value: u64) -> usize {
    value.to_string().len()
}

fn render_kernel<W: Write>(out: &mut W, kernel: &KernelData) -> io::Result<()> {
    let runs = kernel.invocations().len();
    let collected = kernel.collected_count();
    write!(out, "=== {}(runs {} times", kernel.kernel_name(), runs)?;
    if collected != runs {
        write!(out, ", collected {} times", collected)?;
    }
    writeln!(out, ") ===")?;

    let tiles_num = kernel.collected_tiles_num();
    let assembly = kernel.orig_asm();
    let common = kernel.result_data_common();

    for (tile_id, totals) in kernel.aggregate().iter().enumerate() {
        if tiles_num > 1 {
            writeln!(out, "--- Tile #{} of {} collected", tile_id, tiles_num)?;
        }
        let inst_width = digits(totals.max_instruction_count) + 1;
        let simd_width = digits(totals.max_simd_count) + 1;

        let mut bbl_id = None;
        for (idx, rdc) in common.iter().enumerate() {
            if bbl_id != Some(rdc.bbl_id) {
                bbl_id = Some(rdc.bbl_id);
                writeln!(out, "///  Basic block #{}", rdc.bbl_id)?;
            }
            write!(
                out,
                "[{:>width$}",
                totals.instruction_counts[idx],
                width = inst_width
            )?;
            if totals.max_simd_count > 0 {
                write!(out, "|{:>width$}", totals.simd_counts[idx], width = simd_width)?;
            }
            write!(out, "] 0x{:06x} : ", rdc.offset)?;
            match assembly.get(idx) {
                Some(line) => writeln!(out, "{}", line.asm_line_orig())?,
                None => writeln!(out, " no assembly")?,
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiling::{AssemblyLine, KernelData, ResultDataCommon};

    fn render(data: &ApplicationData) -> String {
        let mut buf = Vec::new();
        InstCountWriter::new().render(&mut buf, data).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn k1(simd: bool, tiles: usize) -> KernelData {
        KernelData::new(
            "K1",
            vec![
                ResultDataCommon::new(0, 0x0),
                ResultDataCommon::new(0, 0x10),
                ResultDataCommon::new(1, 0x120),
            ],
            vec![
                AssemblyLine::new("mov (8|M0) r2.0<1>:ud r0.0<1;1,0>:ud"),
                AssemblyLine::new("add (8|M0) r3.0<1>:d r2.0<1;1,0>:d 1:w"),
                AssemblyLine::new("send (8|M0) null r4 0xC 0x0"),
            ],
            tiles,
            simd,
        )
    }

    #[test]
    fn renders_partial_collection_scenario() {
        let app = ApplicationData::new();
        let (h, _) = app.get_or_insert_with(1, || k1(false, 1));
        {
            let mut k = lock_kernel(&h);
            let a = k.add_invocation();
            let inv = k.invocation_mut(a).unwrap();
            for (idx, v) in [4u64, 4, 10].iter().enumerate() {
                inv.record_result(0, idx, *v, 0);
            }
            inv.mark_collected(true);
            let b = k.add_invocation();
            let inv = k.invocation_mut(b).unwrap();
            inv.record_result(0, 0, 3, 0);
            inv.record_result(0, 1, 3, 0);
        }
        let expected = "\
[INFO] : [ Instruction count | SIMD active lanes count ] total for all invocations
=== K1(runs 2 times, collected 1 times) ===
///  Basic block #0
[  7] 0x000000 : mov (8|M0) r2.0<1>:ud r0.0<1;1,0>:ud
[  7] 0x000010 : add (8|M0) r3.0<1>:d r2.0<1;1,0>:d 1:w
///  Basic block #1
[ 10] 0x000120 : send (8|M0) null r4 0xC 0x0
";
        assert_eq!(render(&app), expected);
    }

    #[test]
    fn simd_column_present_when_counted() {
        let app = ApplicationData::new();
        let (h, _) = app.get_or_insert_with(1, || k1(true, 1));
        {
            let mut k = lock_kernel(&h);
            let a = k.add_invocation();
            let inv = k.invocation_mut(a).unwrap();
            inv.record_result(0, 0, 2, 16);
            inv.record_result(0, 1, 2, 128);
            inv.record_result(0, 2, 1, 8);
            inv.mark_collected(true);
        }
        let report = render(&app);
        assert!(report.contains("=== K1(runs 1 times) ===\n"));
        assert!(report.contains("[ 2|  16] 0x000000 : mov"));
        assert!(report.contains("[ 2| 128] 0x000010 : add"));
        assert!(report.contains("[ 1|   8] 0x000120 : send"));
    }

    #[test]
    fn tile_separators_only_for_multiple_tiles() {
        let app = ApplicationData::new();
        let (h, _) = app.get_or_insert_with(1, || k1(false, 2));
        {
            let mut k = lock_kernel(&h);
            let a = k.add_invocation();
            let inv = k.invocation_mut(a).unwrap();
            inv.record_result(1, 2, 5, 0);
            inv.mark_collected(true);
        }
        let report = render(&app);
        assert!(report.contains("--- Tile #0 of 2 collected\n"));
        assert!(report.contains("--- Tile #1 of 2 collected\n"));
        assert_eq!(report.matches("///  Basic block #0").count(), 2);
        assert!(report.contains("[ 5] 0x000120 : send"));

        let single = ApplicationData::new();
        single.get_or_insert_with(1, || k1(false, 1));
        assert!(!render(&single).contains("--- Tile"));
    }

    #[test]
    fn missing_assembly_marker() {
        let app = ApplicationData::new();
        app.get_or_insert_with(1, || {
            KernelData::new(
                "short",
                vec![ResultDataCommon::new(3, 0xabc)],
                Vec::new(),
                1,
                true,
            )
        });
        let report = render(&app);
        assert!(report.contains("=== short(runs 0 times) ===\n"));
        assert!(report.contains("///  Basic block #3\n[ 0] 0x000abc :  no assembly\n"));
    }
}

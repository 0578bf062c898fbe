use std::fmt::Write;

use crate::error::AlignmentError;
use crate::symbols::PhoneTable;
use crate::types::PhoneRun;

/// `utt`, then `start end label` per phone run in seconds, then `.`.
pub(super) fn render(
    out: &mut String,
    utterance: &str,
    runs: &[PhoneRun],
    phones: &PhoneTable,
    frame_shift_secs: f32,
) -> Result<(), AlignmentError> {
    let _ = writeln!(out, "{utterance}");
    let mut end = 0.0f32;
    for run in runs {
        let label = phones.label(run.phone)?;
        let start = end;
        end += run.num_frames as f32 * frame_shift_secs;
        let _ = writeln!(out, "{start:.3} {end:.3} {label}");
    }
    out.push_str(".\n");
    Ok(())
}

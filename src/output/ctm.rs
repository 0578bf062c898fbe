use std::fmt::Write;

use crate::types::PhoneRun;

/// Decimal places for CTM times given the frame shift.
pub(super) fn precision(frame_shift_secs: f32) -> usize {
    if frame_shift_secs >= 0.01 {
        2
    } else {
        3
    }
}

/// `utt 1 start duration phone_id` per run. CTM has no record trailer.
pub(super) fn render(out: &mut String, utterance: &str, runs: &[PhoneRun], frame_shift_secs: f32) {
    let digits = precision(frame_shift_secs);
    let mut start = 0.0f32;
    for run in runs {
        let duration = frame_shift_secs * run.num_frames as f32;
        let _ = writeln!(
            out,
            "{utterance} 1 {start:.digits$} {duration:.digits$} {}",
            run.phone
        );
        start += duration;
    }
}

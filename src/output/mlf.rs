use std::fmt::Write;

use crate::alignment::runs::split_to_sub_states;
use crate::error::AlignmentError;
use crate::pipeline::traits::TransitionModel;
use crate::symbols::PhoneTable;
use crate::types::{PhoneRun, UnitId};

pub const MLF_HEADER: &str = "#!MLF!#";

/// HTK time units per frame: whole milliseconds of shift in 100 ns ticks.
pub(super) fn ticks_per_frame(frame_shift_secs: f32) -> i64 {
    (f64::from(frame_shift_secs) * 1e3).round() as i64 * 10_000
}

/// One label file: sub-state lines `start end s<class+2>`, with the phone
/// label on every class-0 segment.
pub(super) fn render(
    out: &mut String,
    utterance: &str,
    runs: &[PhoneRun],
    units: &[UnitId],
    transitions: &dyn TransitionModel,
    phones: &PhoneTable,
    frame_shift_secs: f32,
) -> Result<(), AlignmentError> {
    let tick = ticks_per_frame(frame_shift_secs);
    let _ = writeln!(out, "\"*/{utterance}.lab\"");

    let mut end = 0i64;
    for run in runs {
        let label = phones.label(run.phone)?;
        let frames = &units[run.start_frame..run.end_frame()];
        for sub in split_to_sub_states(frames, |unit| transitions.pdf_class_of(unit))? {
            let start = end;
            end += sub.num_frames as i64 * tick;
            let _ = write!(out, "{start} {end} s{}", sub.pdf_class + 2);
            if sub.pdf_class == 0 {
                let _ = write!(out, " {label}");
            }
            out.push('\n');
        }
    }
    out.push_str(".\n");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::runs::split_to_phones;
    use crate::output::test_support::{phones, DecimalTransitions};

    fn render_path(units: &[UnitId], frame_shift_secs: f32) -> String {
        let runs = split_to_phones(units, |u| DecimalTransitions.phone_of(u)).unwrap();
        let mut out = String::new();
        render(
            &mut out,
            "U1",
            &runs,
            units,
            &DecimalTransitions,
            &phones(),
            frame_shift_secs,
        )
        .unwrap();
        out
    }

    #[test]
    fn five_frames_at_ten_ms_is_half_a_million_ticks() {
        assert_eq!(ticks_per_frame(0.01) * 5, 500_000);
        assert_eq!(render_path(&[10; 5], 0.01), "\"*/U1.lab\"\n0 500000 s2 sil\n.\n");
    }

    #[test]
    fn sub_states_chain_within_and_across_phones() {
        let text = render_path(&[20, 20, 21, 22, 22, 22, 30], 0.01);
        assert_eq!(
            text,
            "\"*/U1.lab\"\n\
             0 200000 s2 n\n\
             200000 300000 s3\n\
             300000 600000 s4\n\
             600000 700000 s2 i\n\
             .\n"
        );
    }

    #[test]
    fn frame_shift_is_rounded_to_whole_milliseconds() {
        assert_eq!(ticks_per_frame(0.005), 50_000);
        assert_eq!(ticks_per_frame(0.0125), 130_000);
    }
}

//! Kaldi text-archive records of integer phone ids.

use std::fmt::Write;

use crate::types::PhoneRun;

/// `utt p1 p2 ...`, one id per run or, with `per_frame`, one per frame.
pub(super) fn render_phone_sequence(
    out: &mut String,
    utterance: &str,
    runs: &[PhoneRun],
    per_frame: bool,
) {
    out.push_str(utterance);
    for run in runs {
        let repeats = if per_frame { run.num_frames } else { 1 };
        for _ in 0..repeats {
            let _ = write!(out, " {}", run.phone);
        }
    }
    out.push('\n');
}

/// `utt p1 n1 ; p2 n2 ...`
pub(super) fn render_length_pairs(out: &mut String, utterance: &str, runs: &[PhoneRun]) {
    out.push_str(utterance);
    for (index, run) in runs.iter().enumerate() {
        if index > 0 {
            out.push_str(" ;");
        }
        let _ = write!(out, " {} {}", run.phone, run.num_frames);
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runs() -> Vec<PhoneRun> {
        vec![
            PhoneRun {
                phone: 1,
                start_frame: 0,
                num_frames: 2,
            },
            PhoneRun {
                phone: 7,
                start_frame: 2,
                num_frames: 3,
            },
        ]
    }

    #[test]
    fn phone_sequence_has_one_id_per_run() {
        let mut out = String::new();
        render_phone_sequence(&mut out, "U1", &runs(), false);
        assert_eq!(out, "U1 1 7\n");
    }

    #[test]
    fn per_frame_sequence_repeats_ids() {
        let mut out = String::new();
        render_phone_sequence(&mut out, "U1", &runs(), true);
        assert_eq!(out, "U1 1 1 7 7 7\n");
    }

    #[test]
    fn length_pairs_are_semicolon_separated() {
        let mut out = String::new();
        render_length_pairs(&mut out, "U1", &runs());
        assert_eq!(out, "U1 1 2 ; 7 3\n");
    }
}

use crate::error::AlignmentError;
use crate::types::{PhoneId, PhoneRun, SubStateRun, UnitId};

/// Splits a frame-level unit path into maximal runs of one phone.
///
/// Runs are contiguous, in path order, and their lengths sum to the path
/// length. A boundary falls exactly where the phone changes between
/// neighbouring frames.
pub fn split_to_phones<F>(units: &[UnitId], mut phone_of: F) -> Result<Vec<PhoneRun>, AlignmentError>
where
    F: FnMut(UnitId) -> Result<PhoneId, AlignmentError>,
{
    let mut runs: Vec<PhoneRun> = Vec::new();
    for (frame, &unit) in units.iter().enumerate() {
        let phone = phone_of(unit)?;
        match runs.last_mut() {
            Some(run) if run.phone == phone => run.num_frames += 1,
            _ => runs.push(PhoneRun {
                phone,
                start_frame: frame,
                num_frames: 1,
            }),
        }
    }
    Ok(runs)
}

/// Splits the frames of one phone run by pdf class.
pub fn split_to_sub_states<F>(
    units: &[UnitId],
    mut pdf_class_of: F,
) -> Result<Vec<SubStateRun>, AlignmentError>
where
    F: FnMut(UnitId) -> Result<u32, AlignmentError>,
{
    let mut runs: Vec<SubStateRun> = Vec::new();
    for &unit in units {
        let pdf_class = pdf_class_of(unit)?;
        match runs.last_mut() {
            Some(run) if run.pdf_class == pdf_class => run.num_frames += 1,
            _ => runs.push(SubStateRun {
                pdf_class,
                num_frames: 1,
            }),
        }
    }
    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;

    // unit id / 10 = phone, unit id % 10 = pdf class
    fn phone_of(unit: UnitId) -> Result<PhoneId, AlignmentError> {
        Ok(unit / 10)
    }

    fn class_of(unit: UnitId) -> Result<u32, AlignmentError> {
        Ok(unit % 10)
    }

    #[test]
    fn runs_partition_the_path() {
        let path = [10, 10, 11, 20, 20, 20, 10, 31];
        let runs = split_to_phones(&path, phone_of).unwrap();
        assert_eq!(
            runs.iter().map(|r| (r.phone, r.num_frames)).collect::<Vec<_>>(),
            vec![(1, 3), (2, 3), (1, 1), (3, 1)]
        );
        assert_eq!(runs.iter().map(|r| r.num_frames).sum::<usize>(), path.len());
        for pair in runs.windows(2) {
            assert_eq!(pair[0].end_frame(), pair[1].start_frame);
            assert_ne!(pair[0].phone, pair[1].phone);
        }
    }

    #[test]
    fn single_phone_path_is_one_run() {
        let runs = split_to_phones(&[70; 100], phone_of).unwrap();
        assert_eq!(
            runs,
            vec![PhoneRun {
                phone: 7,
                start_frame: 0,
                num_frames: 100
            }]
        );
    }

    #[test]
    fn lookup_failure_is_propagated() {
        let result = split_to_phones(&[1, 2], |unit| {
            if unit == 2 {
                Err(AlignmentError::invalid_input("unknown unit"))
            } else {
                Ok(0)
            }
        });
        assert!(result.is_err());
    }

    #[test]
    fn sub_states_group_by_pdf_class() {
        let runs = split_to_sub_states(&[10, 10, 11, 12, 12, 12], class_of).unwrap();
        assert_eq!(
            runs,
            vec![
                SubStateRun { pdf_class: 0, num_frames: 2 },
                SubStateRun { pdf_class: 1, num_frames: 1 },
                SubStateRun { pdf_class: 2, num_frames: 3 },
            ]
        );
    }

    #[test]
    fn empty_path_has_no_runs() {
        assert!(split_to_phones(&[], phone_of).unwrap().is_empty());
    }
}

use candle_core::Tensor;
use thiserror::Error;

use crate::error::SkipReason;

#[derive(Debug, Error)]
pub enum FusionError {
    #[error("no feature streams to combine")]
    NoStreams,
    #[error("feature stream {index} has rank {rank}, expected a frames x dims matrix")]
    NotMatrix { index: usize, rank: usize },
    #[error("length mismatch {max_frames} vs. {min_frames} exceeds tolerance {tolerance}")]
    LengthMismatch {
        max_frames: usize,
        min_frames: usize,
        tolerance: usize,
    },
    #[error(transparent)]
    Tensor(#[from] candle_core::Error),
}

impl From<FusionError> for SkipReason {
    fn from(err: FusionError) -> Self {
        match err {
            FusionError::LengthMismatch {
                max_frames,
                min_frames,
                tolerance,
            } => SkipReason::FeatureFusion {
                max_frames,
                min_frames,
                tolerance,
            },
            other => SkipReason::MalformedFeatures(other.to_string()),
        }
    }
}

/// Concatenates frame-synchronous streams column-wise.
///
/// Streams may differ in length by at most `tolerance` frames; every stream
/// is cut to the shortest one. Column blocks keep the input order. A stream
/// of zero frames always fails.
pub fn fuse_streams(streams: &[Tensor], tolerance: usize) -> Result<Tensor, FusionError> {
    if streams.is_empty() {
        return Err(FusionError::NoStreams);
    }

    let mut min_frames = usize::MAX;
    let mut max_frames = 0usize;
    let mut total_dims = 0usize;
    for (index, stream) in streams.iter().enumerate() {
        let (frames, dims) = stream.dims2().map_err(|_| FusionError::NotMatrix {
            index,
            rank: stream.rank(),
        })?;
        min_frames = min_frames.min(frames);
        max_frames = max_frames.max(frames);
        total_dims += dims;
    }

    if max_frames - min_frames > tolerance || min_frames == 0 {
        return Err(FusionError::LengthMismatch {
            max_frames,
            min_frames,
            tolerance,
        });
    }
    if max_frames > min_frames {
        tracing::debug!(
            max_frames,
            min_frames,
            tolerance,
            "fusion: length mismatch within tolerance"
        );
    }

    let blocks = streams
        .iter()
        .map(|s| s.narrow(0, 0, min_frames))
        .collect::<Result<Vec<_>, _>>()?;
    let fused = Tensor::cat(&blocks, 1)?;
    debug_assert_eq!(fused.dims2().ok(), Some((min_frames, total_dims)));
    Ok(fused)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use candle_core::{DType, Device};

    use super::*;

    fn stream(frames: usize, dims: usize, base: f32) -> Tensor {
        let data = (0..frames * dims)
            .map(|i| base + i as f32)
            .collect::<Vec<_>>();
        Tensor::from_vec(data, (frames, dims), &Device::Cpu).unwrap()
    }

    #[test]
    fn within_tolerance_truncates_to_shortest() {
        let streams = vec![stream(100, 13, 0.0), stream(101, 3, 0.0), stream(102, 2, 0.0)];
        let fused = fuse_streams(&streams, 2).unwrap();
        assert_eq!(fused.dims2().unwrap(), (100, 18));
    }

    #[test]
    fn columns_follow_stream_order() {
        let streams = vec![stream(2, 2, 0.0), stream(3, 1, 100.0)];
        let fused = fuse_streams(&streams, 1).unwrap();
        let rows = fused.to_vec2::<f32>().unwrap();
        assert_eq!(rows, vec![vec![0.0, 1.0, 100.0], vec![2.0, 3.0, 101.0]]);
        assert_relative_eq!(rows[1][2], 101.0);
    }

    #[test]
    fn beyond_tolerance_fails_with_lengths() {
        let streams = vec![stream(100, 13, 0.0), stream(105, 3, 0.0)];
        let err = fuse_streams(&streams, 2).unwrap_err();
        assert!(matches!(
            err,
            FusionError::LengthMismatch {
                max_frames: 105,
                min_frames: 100,
                tolerance: 2
            }
        ));
    }

    #[test]
    fn zero_length_stream_fails_regardless_of_tolerance() {
        let empty = Tensor::zeros((0, 3), DType::F32, &Device::Cpu).unwrap();
        let err = fuse_streams(&[empty], 1_000).unwrap_err();
        assert!(matches!(err, FusionError::LengthMismatch { min_frames: 0, .. }));
    }

    #[test]
    fn single_stream_passes_through() {
        let fused = fuse_streams(&[stream(4, 2, 0.0)], 0).unwrap();
        assert_eq!(fused.dims2().unwrap(), (4, 2));
    }

    #[test]
    fn no_streams_is_an_error() {
        assert!(matches!(fuse_streams(&[], 0), Err(FusionError::NoStreams)));
    }

    #[test]
    fn mismatch_maps_to_fusion_skip() {
        let err = FusionError::LengthMismatch {
            max_frames: 5,
            min_frames: 1,
            tolerance: 0,
        };
        assert!(matches!(
            SkipReason::from(err),
            SkipReason::FeatureFusion { max_frames: 5, .. }
        ));
    }

    #[test]
    fn unusable_streams_map_to_malformed_features() {
        let reason = SkipReason::from(FusionError::NoStreams);
        assert_eq!(reason.kind(), "malformed_features");

        let vector = Tensor::zeros(4, DType::F32, &Device::Cpu).unwrap();
        let err = fuse_streams(&[vector], 0).unwrap_err();
        assert!(matches!(err, FusionError::NotMatrix { index: 0, rank: 1 }));
        assert!(matches!(
            SkipReason::from(err),
            SkipReason::MalformedFeatures(ref msg) if msg.contains("rank 1")
        ));
    }
}

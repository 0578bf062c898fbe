use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader};

use crate::error::AlignmentError;
use crate::io::table;
use crate::types::WaveData;

/// Ordered audio source backed by a `<utt> <wav-path>` list.
pub struct WavScpReader {
    entries: std::vec::IntoIter<(String, PathBuf)>,
}

impl WavScpReader {
    /// Accepts an optional `scp:` prefix on `list_path`. Relative wav paths
    /// are resolved against the list's directory.
    pub fn open(list_path: &str) -> Result<Self, AlignmentError> {
        let path = Path::new(list_path.strip_prefix("scp:").unwrap_or(list_path));
        let contents = table::read_to_string(path, "read wav list")?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::parse(&contents, path, base)
    }

    pub fn parse(contents: &str, origin: &Path, base: &Path) -> Result<Self, AlignmentError> {
        let entries = table::pairs(contents, origin)
            .map(|row| {
                let (_, utt, wav) = row?;
                let wav = Path::new(wav);
                let resolved = if wav.is_absolute() {
                    wav.to_path_buf()
                } else {
                    base.join(wav)
                };
                Ok((utt.to_string(), resolved))
            })
            .collect::<Result<Vec<_>, AlignmentError>>()?;
        Ok(Self {
            entries: entries.into_iter(),
        })
    }
}

impl Iterator for WavScpReader {
    type Item = Result<(String, WaveData), AlignmentError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (utt, path) = self.entries.next()?;
        Some(read_wav(&path).map(|wave| (utt, wave)))
    }
}

/// Decodes a WAV file keeping channels separate.
pub fn read_wav(path: &Path) -> Result<WaveData, AlignmentError> {
    let mut reader = WavReader::open(path).map_err(|err| {
        AlignmentError::runtime("open wav", format!("'{}': {err}", path.display()))
    })?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(AlignmentError::invalid_input(format!(
            "WAV has zero channels: {}",
            path.display()
        )));
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| {
                AlignmentError::runtime("read wav samples", format!("'{}': {err}", path.display()))
            })?,
        SampleFormat::Int => {
            let bits = spec.bits_per_sample as i32;
            let scale = if bits > 1 {
                ((1_i64 << (bits - 1)) - 1) as f32
            } else {
                1.0
            };
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| {
                    AlignmentError::runtime(
                        "read wav samples",
                        format!("'{}': {err}", path.display()),
                    )
                })?
        }
    };

    let mut split = vec![Vec::with_capacity(interleaved.len() / channels); channels];
    for frame in interleaved.chunks_exact(channels) {
        for (buf, &sample) in split.iter_mut().zip(frame) {
            buf.push(sample);
        }
    }
    Ok(WaveData {
        sample_rate_hz: spec.sample_rate,
        channels: split,
    })
}

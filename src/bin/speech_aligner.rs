use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use speech_aligner::io::{TranscriptReader, WavScpReader};
use speech_aligner::pipeline::defaults::{
    ArchiveDecoder, ArchiveFeatureExtractor, LexiconGraphCompiler, TableTransitionModel,
};
use speech_aligner::{
    run_batch, AlignerConfig, AlignmentEmitter, AlignmentError, ForcedAlignerBuilder, FormatFlags,
    Lexicon, OutputFormat, SymbolTables, WarpSource,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormatChoice {
    Custom,
    Mlf,
    Ctm,
    LengthPairs,
    PhoneSequence,
}

impl OutputFormatChoice {
    fn output_format(self) -> OutputFormat {
        match self {
            Self::Custom => OutputFormat::Custom,
            Self::Mlf => OutputFormat::Mlf,
            Self::Ctm => OutputFormat::Ctm,
            Self::LengthPairs => OutputFormat::LengthPairs,
            Self::PhoneSequence => OutputFormat::PhoneSequence,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "speech-aligner")]
#[command(about = "Force-align transcripts to audio and write phone-level timings")]
struct Args {
    /// `<utt> <wav>` list; an `scp:` prefix is accepted.
    wav_scp: String,
    /// `<utt> <word> ...` lines, in the same order as the wav list.
    transcripts: PathBuf,
    /// Output file, or `-` for stdout.
    output: String,

    /// JSON file with tuning options; flags below override it.
    #[arg(long, env = "SPEECH_ALIGNER_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "SPEECH_ALIGNER_WORD_SYMBOL_TABLE")]
    word_symbol_table: PathBuf,
    #[arg(long, env = "SPEECH_ALIGNER_PHONE_SYMBOL_TABLE")]
    phone_symbol_table: PathBuf,
    #[arg(long, env = "SPEECH_ALIGNER_LEXICON")]
    lexicon: PathBuf,
    /// `<unit> <phone> <pdf-class>` lines.
    #[arg(long, env = "SPEECH_ALIGNER_TRANSITIONS")]
    transitions: PathBuf,
    /// Text archive of spectral feature matrices.
    #[arg(long, env = "SPEECH_ALIGNER_FEATS")]
    feats: PathBuf,
    /// Text archive of pitch feature matrices, fused after the spectral ones.
    #[arg(long, env = "SPEECH_ALIGNER_PITCH_FEATS")]
    pitch_feats: Option<PathBuf>,
    /// Text archive of frame-level unit paths.
    #[arg(long, env = "SPEECH_ALIGNER_ALIGNMENTS")]
    alignments: PathBuf,

    #[arg(long, env = "SPEECH_ALIGNER_FRAME_SHIFT")]
    frame_shift: Option<f32>,
    #[arg(long, env = "SPEECH_ALIGNER_LENGTH_TOLERANCE")]
    length_tolerance: Option<usize>,
    /// A value must be attached, as in `--text-case-sensitive=false`.
    #[arg(long, env = "SPEECH_ALIGNER_TEXT_CASE_SENSITIVE", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    text_case_sensitive: Option<bool>,
    #[arg(long, env = "SPEECH_ALIGNER_SPELL_OOV", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    spell_oov: Option<bool>,
    #[arg(long, env = "SPEECH_ALIGNER_OOV_SYMBOL")]
    oov_symbol: Option<String>,
    #[arg(long, env = "SPEECH_ALIGNER_MIN_DURATION")]
    min_duration: Option<f64>,
    #[arg(long, env = "SPEECH_ALIGNER_CHANNEL")]
    channel: Option<usize>,
    #[arg(long, env = "SPEECH_ALIGNER_VTLN_WARP")]
    vtln_warp: Option<f32>,
    #[arg(long, env = "SPEECH_ALIGNER_VTLN_MAP")]
    vtln_map: Option<PathBuf>,
    #[arg(long, env = "SPEECH_ALIGNER_UTT2SPK")]
    utt2spk: Option<PathBuf>,
    #[arg(long, env = "SPEECH_ALIGNER_BOOST_SIL")]
    boost_sil: Option<f32>,
    /// Colon-separated phone ids, e.g. `1:2:3`.
    #[arg(long, env = "SPEECH_ALIGNER_SILENCE_PHONES", value_delimiter = ':')]
    silence_phones: Option<Vec<u32>>,
    #[arg(long, env = "SPEECH_ALIGNER_SAMPLE_RATE")]
    sample_rate: Option<u32>,
    #[arg(long, env = "SPEECH_ALIGNER_OUTPUT_FORMAT", value_enum)]
    output_format: Option<OutputFormatChoice>,
    #[arg(long, env = "SPEECH_ALIGNER_PER_FRAME", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    per_frame: Option<bool>,

    #[arg(long, env = "SPEECH_ALIGNER_CUSTOM_OUTPUT")]
    custom_output: bool,
    #[arg(long, env = "SPEECH_ALIGNER_MLF_OUTPUT")]
    mlf_output: bool,
    #[arg(long, env = "SPEECH_ALIGNER_CTM_OUTPUT")]
    ctm_output: bool,
    #[arg(long, env = "SPEECH_ALIGNER_WRITE_LENGTHS")]
    write_lengths: bool,
}

impl Args {
    fn resolve_config(&self) -> Result<AlignerConfig, AlignmentError> {
        let mut config = match &self.config {
            Some(path) => AlignerConfig::load(path)?,
            None => AlignerConfig::default(),
        };

        if let Some(v) = self.frame_shift {
            config.frame_shift_secs = v;
        }
        if let Some(v) = self.length_tolerance {
            config.length_tolerance = v;
        }
        if let Some(v) = self.text_case_sensitive {
            config.text_case_sensitive = v;
        }
        if let Some(v) = self.spell_oov {
            config.spell_oov = v;
        }
        if let Some(v) = &self.oov_symbol {
            config.oov_symbol = v.clone();
        }
        if let Some(v) = self.min_duration {
            config.min_duration_secs = v;
        }
        if let Some(v) = self.channel {
            config.channel = Some(v);
        }
        if let Some(v) = self.vtln_warp {
            config.vtln_warp = v;
        }
        if let Some(v) = self.boost_sil {
            config.boost_silence = v;
        }
        if let Some(v) = &self.silence_phones {
            config.silence_phones = v.clone();
        }
        if let Some(v) = self.sample_rate {
            config.expected_sample_rate_hz = v;
        }
        if let Some(v) = self.per_frame {
            config.per_frame = v;
        }

        let legacy = OutputFormat::from_flags(FormatFlags {
            custom: self.custom_output,
            mlf: self.mlf_output,
            ctm: self.ctm_output,
            write_lengths: self.write_lengths,
        })?;
        match (self.output_format, legacy) {
            (Some(_), Some(_)) => {
                return Err(AlignmentError::config(
                    "--output-format cannot be combined with the legacy output flags",
                ))
            }
            (Some(choice), None) => config.output_format = choice.output_format(),
            (None, Some(format)) => config.output_format = format,
            (None, None) => {}
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            tracing::error!("{err}");
            std::process::exit(1);
        }
    }
}

/// Returns whether at least one utterance was aligned.
fn run() -> Result<bool, AlignmentError> {
    let args = Args::parse();
    let config = args.resolve_config()?;
    tracing::info!(
        format = config.output_format.as_str(),
        frame_shift_secs = config.frame_shift_secs,
        tolerance = config.length_tolerance,
        "starting alignment"
    );

    let symbols = SymbolTables::load(&args.word_symbol_table, &args.phone_symbol_table)?;
    let lexicon = Lexicon::load(&args.lexicon, &symbols)?;
    let transitions = TableTransitionModel::load(&args.transitions)?;
    let warp_source =
        WarpSource::load(config.vtln_warp, args.vtln_map.as_deref(), args.utt2spk.as_deref())?;

    let mut builder = ForcedAlignerBuilder::new(config.clone())
        .with_feature_extractor(Box::new(ArchiveFeatureExtractor::load(&args.feats)?))
        .with_graph_compiler(Box::new(LexiconGraphCompiler::new(lexicon)))
        .with_decoder(Box::new(ArchiveDecoder::load(&args.alignments)?))
        .with_warp_source(warp_source);
    if let Some(path) = &args.pitch_feats {
        builder = builder.with_pitch_extractor(Box::new(ArchiveFeatureExtractor::load(path)?));
    }
    let aligner = builder.build()?;

    let sink: Box<dyn Write> = if args.output == "-" {
        Box::new(std::io::stdout().lock())
    } else {
        Box::new(File::create(&args.output).map_err(|e| AlignmentError::io("create output", e))?)
    };
    let mut emitter = AlignmentEmitter::new(
        BufWriter::new(sink),
        config.output_format,
        config.emit_options(),
    )?;

    let audio = WavScpReader::open(&args.wav_scp)?;
    let mut transcripts = TranscriptReader::open(&args.transcripts)?;
    let summary = run_batch(
        audio,
        &mut transcripts,
        &aligner,
        &symbols,
        &transitions,
        &mut emitter,
    )?;
    emitter.finish()?;

    Ok(summary.succeeded > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [&str; 13] = [
        "speech-aligner",
        "--word-symbol-table",
        "words.txt",
        "--phone-symbol-table",
        "phones.txt",
        "--lexicon",
        "lexicon.txt",
        "--transitions",
        "transitions.txt",
        "--feats",
        "feats.ark",
        "--alignments",
        "ali.ark",
    ];

    fn parse(extra: &[&str]) -> Args {
        Args::try_parse_from(REQUIRED.iter().chain(extra).copied()).unwrap()
    }

    #[test]
    fn bare_bool_flag_does_not_swallow_positionals() {
        let args = parse(&["--spell-oov", "wav.scp", "text", "out"]);
        assert_eq!(args.spell_oov, Some(true));
        assert_eq!(args.wav_scp, "wav.scp");
        assert_eq!(args.transcripts, PathBuf::from("text"));
        assert_eq!(args.output, "out");
    }

    #[test]
    fn bool_flags_take_attached_values() {
        let args = parse(&[
            "--spell-oov=false",
            "--per-frame",
            "--text-case-sensitive=true",
            "wav.scp",
            "text",
            "-",
        ]);
        assert_eq!(args.spell_oov, Some(false));
        assert_eq!(args.per_frame, Some(true));
        assert_eq!(args.text_case_sensitive, Some(true));
        assert_eq!(args.output, "-");
    }

    #[test]
    fn legacy_and_named_formats_conflict() {
        let args = parse(&["--output-format", "ctm", "--mlf-output", "wav.scp", "text", "out"]);
        assert!(matches!(args.resolve_config(), Err(AlignmentError::Config { .. })));
    }
}

pub mod alignment;
pub mod config;
pub mod error;
pub mod io;
pub mod output;
pub mod pipeline;
pub mod symbols;
pub mod types;

pub use config::AlignerConfig;
pub use error::{AlignmentError, SkipReason};
pub use output::{AlignmentEmitter, EmitOptions, FormatFlags, OutputFormat};
pub use pipeline::batch::{run_batch, BatchSummary};
pub use pipeline::builder::ForcedAlignerBuilder;
pub use pipeline::runtime::{ForcedAligner, PreparedUtterance, WarpSource};
pub use pipeline::traits::{
    AcousticDecoder, FeatureExtractor, GraphCompiler, PitchExtractor, Tokenizer, TransitionModel,
};
pub use symbols::{Lexicon, PhoneTable, SymbolTables, WordTable};
pub use types::{DecodedPath, DecodingGraph, PhoneRun, TokenSequence, WaveData};

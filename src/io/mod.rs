pub(crate) mod table;
pub mod text_archive;
pub mod transcript;
pub mod wav;

pub use transcript::TranscriptReader;
pub use wav::{read_wav, WavScpReader};

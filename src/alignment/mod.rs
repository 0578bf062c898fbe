pub mod fusion;
pub mod runs;
pub mod tokenization;

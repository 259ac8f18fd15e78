pub mod audio;
pub mod batch;
pub mod dsp;
pub mod engine;
pub mod prompt;
pub mod scanner;
pub mod separator;
pub mod writer;

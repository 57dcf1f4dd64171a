pub mod normalizer;
pub mod processor;
pub mod utils;

pub use normalizer::normalize_row;
pub use processor::ExcelProcessor;

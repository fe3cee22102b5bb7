pub mod fragment_extractor;
pub mod output_manager;
pub mod size;

pub use fragment_extractor::{FragmentExtractor, ShortReadPolicy};
pub use output_manager::{ExtractedFragment, ExtractionReport, OutputManager};
pub use size::binary_unit;

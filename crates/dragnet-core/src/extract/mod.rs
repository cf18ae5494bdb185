mod extractor;
mod normalizer;
mod patterns;

pub use extractor::{EntityExtractor, ValuesByType};
pub use normalizer::normalize;
pub use patterns::{PatternError, PatternSet};

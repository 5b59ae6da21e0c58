// src/extractors/mod.rs
pub mod assemble;
pub mod dates;
pub mod fallback;
pub mod locate;
pub mod normalize;
pub mod trend;

// Re-export the pipeline entry points for convenience
pub use assemble::{extract_forecast, ExtractOptions};
pub use normalize::BareUnit;

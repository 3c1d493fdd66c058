//! Gateway implementation

mod builder;
pub mod feature;
mod study;

pub use builder::{Mimir, MimirBuilder, PacingConfig};
pub use feature::{Feature, FeatureMessages};
pub use study::{EXTRACTION_FAILED_AGAIN, StudyGateway};

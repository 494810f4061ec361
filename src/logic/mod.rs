pub mod aggregation;
pub mod analysis;
pub mod calculations;
pub mod geometry;
pub mod recommend;
pub mod scoring;
pub mod surface_merge;
pub mod yield_estimate;

pub use analysis::{AnalysisService, AnalysisSettings, RecommendRequest};

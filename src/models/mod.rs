pub mod climate;
pub mod crop;
pub mod polygon;
pub mod recommendation;
pub mod suitability;

pub use climate::*;
pub use crop::*;
pub use polygon::*;
pub use recommendation::*;
pub use suitability::*;

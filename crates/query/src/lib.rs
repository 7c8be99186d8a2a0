pub mod engine;
pub mod params;

pub use engine::*;
pub use params::*;

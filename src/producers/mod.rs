pub mod pattern;
pub mod wait;

pub use pattern::{PatternProvider, PatternSource};

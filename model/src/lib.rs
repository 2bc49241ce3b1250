pub mod analytics;

pub use crate::analytics::*;

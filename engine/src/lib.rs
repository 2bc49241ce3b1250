pub mod engine;
pub mod game_state;
pub mod rank;
pub mod value;

pub use crate::engine::*;
pub use crate::game_state::*;
pub use crate::value::*;

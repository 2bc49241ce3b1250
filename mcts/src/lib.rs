pub mod backpropagation;
#[cfg(test)]
mod counting_game;
mod edge;
pub mod final_move;
pub mod mcts;
mod node;
pub mod options;
pub mod playout;
pub mod proof;
pub mod propagation;
#[cfg(test)]
mod race_game;
pub mod selection;

pub use backpropagation::*;
pub use edge::*;
pub use final_move::*;
pub use mcts::*;
pub use node::*;
pub use options::*;
pub use playout::*;
pub use proof::*;
pub use propagation::*;
pub use selection::*;

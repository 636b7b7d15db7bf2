//! Command implementations for xtask
//!
//! Each command is a separate module that implements its own CLI args and execution logic.

mod check;
mod export;
mod render;

pub use check::Check;
pub use export::Export;
pub use render::Render;

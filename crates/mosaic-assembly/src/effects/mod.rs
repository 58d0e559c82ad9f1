//! The running side of assembly: one actor task per attempt.

mod actor;
mod engine;

pub use engine::{Assembler, Assembly};

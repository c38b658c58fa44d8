//! Timing and buffer helpers shared by the runners

pub mod buffer;
pub mod clock;

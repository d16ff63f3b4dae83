//! Host-facing runtime: the cooperative scheduler and the mount lifecycle

pub mod lifecycle;
pub mod scheduler;

#[cfg(test)]
mod tests;

pub use lifecycle::{Backdrop, BackdropError, BackdropStats, Mount, MountOutcome, MountedBackdrop, PumpReport};
pub use scheduler::{FrameRequest, Scheduler, Task, TimerKey, MAX_CATCH_UP_TICKS};

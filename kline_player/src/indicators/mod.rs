//! Moving-average overlays: the pure engine and the three-slot configuration.

pub mod moving_average;
pub mod slots;

pub use moving_average::{MaKind, MaPoint, MovingAverageSpec, compute, compute_spec};
pub use slots::{MovingAverageConfig, MovingAverageSlot, SlotName};

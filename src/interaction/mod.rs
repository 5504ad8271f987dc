//! Pointer interaction: the drag/consume/respawn machine and its inputs.

pub mod controller;
pub mod timers;
pub mod trash;
pub mod tween;

pub use controller::{InteractionController, PickSurface, RigTransform};
pub use trash::{TrashGeometry, TrashStyle, TrashVisual};

pub mod engine;
pub mod geometry;
pub mod renderer;

pub use engine::{step_index, StepEngine};
pub use geometry::{Point, StarGeometry, POINTS};
pub use renderer::{DrawCommand, FrameSlot, LogRenderer, Renderer, Surface};

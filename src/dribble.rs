//! Dribble counting from a stream of ball positions.

mod counter;
mod motion;
mod session;

pub use counter::DribbleCounter;
pub use motion::{Direction, DribbleConfig, DribbleEvent, DribbleMotion};
pub use session::{Axis, DrillSession, SessionConfig};

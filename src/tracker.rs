mod ball_tracker;
mod history;
mod matching;
mod rect;
mod track_state;

pub use ball_tracker::{BallTracker, TrackerConfig, TrackerState};
pub use matching::{Detection, ScoreWeights, proximity_weight};
pub use rect::Rect;
pub use track_state::ChosenDetection;

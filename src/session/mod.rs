pub mod controller;
pub mod score;
pub mod timer;

pub use controller::{
    Feedback, Outcome, Pacing, SessionController, SessionEvent, SessionSettings, View,
};
pub use score::ScoreTally;
pub use timer::{SessionTimer, TimerDuration, TimerPhase};

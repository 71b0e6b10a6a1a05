pub mod mastery;
pub mod question;

pub use question::{Question, QuestionEngine};

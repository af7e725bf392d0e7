pub mod controller;
pub mod silence;
pub mod timer;

pub use controller::{InterviewController, InterviewPhase};

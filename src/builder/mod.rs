pub mod editors;
pub mod form;
pub mod steps;

pub use form::FormState;
pub use steps::{Retreat, Step, StepSequencer, TemplateChoice};

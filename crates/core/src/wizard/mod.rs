//! Answer collection: one step per question, driven by layout behaviors.

pub mod engine;
pub mod layouts;
pub mod results;
pub mod states;

pub use engine::Wizard;
pub use layouts::{behavior, tone_key, StepLayout};
pub use results::{ProductCard, ResultsView};
pub use states::{Advance, StepInput, StepView, WizardError, WizardState};

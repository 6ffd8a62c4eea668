use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::answers::AnswerMap;
use crate::domain::quiz::Layout;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "step", rename_all = "snake_case")]
pub enum WizardState {
    Step(usize),
    Submitting,
    Results,
}

/// A user interaction on the current step.
///
/// `Choose` clicks an option (radio, checkbox, tile, face or undertone
/// card). `Slide` moves a slider handle or clicks a tone stop label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "input", rename_all = "snake_case")]
pub enum StepInput {
    Choose { value: String },
    Slide { index: usize },
}

impl StepInput {
    pub fn choose(value: impl Into<String>) -> Self {
        Self::Choose { value: value.into() }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Choose { .. } => "choose",
            Self::Slide { .. } => "slide",
        }
    }
}

/// Result of pressing Next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Advance {
    Step(usize),
    /// The last step was confirmed; run the recommendation pipeline on this
    /// snapshot and hand the outcome to `Wizard::show_results`.
    Submit(AnswerMap),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OptionView {
    pub value: String,
    pub label: String,
    pub image: Option<String>,
    pub color: Option<String>,
    pub desc: Option<String>,
    pub selected: bool,
    /// Face tiles outside the active tone group.
    pub dimmed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SliderView {
    pub index: usize,
    pub max: usize,
    pub stops: Vec<String>,
}

impl SliderView {
    pub fn active_stop(&self) -> Option<&str> {
        self.stops.get(self.index).map(String::as_str)
    }
}

/// Layout-specific part of a rendered step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StepBody {
    pub multi: bool,
    pub options: Vec<OptionView>,
    pub slider: Option<SliderView>,
}

/// UI-neutral rendering of the current step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepView {
    pub question_id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub layout: Layout,
    pub step: usize,
    pub total: usize,
    pub can_go_back: bool,
    pub next_enabled: bool,
    pub next_label: &'static str,
    pub body: StepBody,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WizardError {
    #[error("step {step} is incomplete; Next stays disabled")]
    StepIncomplete { step: usize },
    #[error("there is no step before the first one")]
    AtFirstStep,
    #[error("wizard is not collecting answers in state {state:?}")]
    NotCollecting { state: WizardState },
    #[error("wizard is not awaiting results in state {state:?}")]
    NotSubmitting { state: WizardState },
    #[error("option `{value}` does not exist in question `{question_id}`")]
    UnknownOption { question_id: String, value: String },
    #[error("slider position {index} is outside 0..={max} for question `{question_id}`")]
    SliderOutOfRange { question_id: String, index: usize, max: usize },
    #[error("question `{question_id}` has no slider positions")]
    NoSliderPositions { question_id: String },
    #[error("{layout:?} steps do not accept `{input}` inputs")]
    UnsupportedInput { layout: Layout, input: &'static str },
}

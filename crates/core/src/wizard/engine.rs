use tracing::debug;

use crate::domain::answers::AnswerMap;
use crate::domain::product::ProductSummary;
use crate::domain::quiz::{Question, QuizConfig};
use crate::wizard::layouts::behavior;
use crate::wizard::results::ResultsView;
use crate::wizard::states::{Advance, StepInput, StepView, WizardError, WizardState};

const CONTINUE_LABEL: &str = "Continue";
const SUBMIT_LABEL: &str = "See results";

/// Walks a user through the quiz one question at a time.
///
/// Step order is fixed by the document; answers never change it. The wizard
/// does not run the recommendation pipeline itself: [`Wizard::next`] hands
/// back an answer snapshot on the last step and the caller reports the
/// outcome through [`Wizard::show_results`].
#[derive(Clone, Debug)]
pub struct Wizard {
    config: QuizConfig,
    state: WizardState,
    answers: AnswerMap,
    results: Option<ResultsView>,
}

impl Wizard {
    pub fn new(config: QuizConfig) -> Self {
        let state = if config.questions.is_empty() {
            WizardState::Submitting
        } else {
            WizardState::Step(0)
        };
        let mut wizard = Self { config, state, answers: AnswerMap::new(), results: None };
        wizard.enter_current();
        wizard
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    pub fn current_question(&self) -> Option<&Question> {
        match self.state {
            WizardState::Step(index) => self.config.questions.get(index),
            _ => None,
        }
    }

    pub fn view(&self) -> Result<StepView, WizardError> {
        let (step, question) = self.collecting()?;
        let total = self.config.question_count();
        let layout = behavior(question.layout);

        Ok(StepView {
            question_id: question.id.clone(),
            title: question.title.clone(),
            subtitle: question.subtitle.clone(),
            layout: question.layout,
            step,
            total,
            can_go_back: step > 0,
            next_enabled: layout.is_valid(question, &self.answers),
            next_label: if step + 1 == total { SUBMIT_LABEL } else { CONTINUE_LABEL },
            body: layout.body(question, &self.answers),
        })
    }

    pub fn input(&mut self, input: StepInput) -> Result<(), WizardError> {
        let (_, question) = self.collecting()?;
        let mut staged = self.answers.clone();
        behavior(question.layout).apply(question, &mut staged, &input)?;
        self.answers = staged;
        Ok(())
    }

    pub fn can_advance(&self) -> bool {
        self.collecting()
            .map(|(_, question)| behavior(question.layout).is_valid(question, &self.answers))
            .unwrap_or(false)
    }

    pub fn can_go_back(&self) -> bool {
        matches!(self.state, WizardState::Step(index) if index > 0)
    }

    pub fn next(&mut self) -> Result<Advance, WizardError> {
        let (step, _) = self.collecting()?;
        if !self.can_advance() {
            return Err(WizardError::StepIncomplete { step });
        }

        if step + 1 < self.config.question_count() {
            self.state = WizardState::Step(step + 1);
            self.enter_current();
            debug!(event_name = "quiz.wizard.advanced", step = step + 1, "wizard advanced");
            return Ok(Advance::Step(step + 1));
        }

        self.state = WizardState::Submitting;
        debug!(
            event_name = "quiz.wizard.submitted",
            answers = self.answers.len(),
            "wizard submitted answers"
        );
        Ok(Advance::Submit(self.answers.clone()))
    }

    pub fn previous(&mut self) -> Result<usize, WizardError> {
        let (step, _) = self.collecting()?;
        if step == 0 {
            return Err(WizardError::AtFirstStep);
        }
        self.state = WizardState::Step(step - 1);
        self.enter_current();
        Ok(step - 1)
    }

    /// Completes a submission with the pipeline outcome.
    pub fn show_results<E>(
        &mut self,
        outcome: Result<Vec<ProductSummary>, E>,
    ) -> Result<&ResultsView, WizardError> {
        if self.state != WizardState::Submitting {
            return Err(WizardError::NotSubmitting { state: self.state });
        }
        self.state = WizardState::Results;
        let view = ResultsView::from_outcome(&self.config.results_title, outcome);
        Ok(&*self.results.insert(view))
    }

    pub fn results(&self) -> Option<&ResultsView> {
        self.results.as_ref()
    }

    fn collecting(&self) -> Result<(usize, &Question), WizardError> {
        match self.state {
            WizardState::Step(index) => self
                .config
                .questions
                .get(index)
                .map(|question| (index, question))
                .ok_or(WizardError::NotCollecting { state: self.state }),
            state => Err(WizardError::NotCollecting { state }),
        }
    }

    fn enter_current(&mut self) {
        if let WizardState::Step(index) = self.state {
            if let Some(question) = self.config.questions.get(index) {
                behavior(question.layout).enter(question, &mut self.answers);
            }
        }
    }
}

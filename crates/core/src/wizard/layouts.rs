use crate::domain::answers::{AnswerMap, FACE_KEY, TONE_KEY, UNDERTONE_KEY};
use crate::domain::quiz::{Layout, Question, QuizOption, SelectionType};
use crate::wizard::states::{OptionView, SliderView, StepBody, StepInput, WizardError};

/// Behavior shared by every step layout.
pub trait StepLayout: Sync {
    fn layout(&self) -> Layout;

    /// Runs when the step becomes current, before it is rendered.
    fn enter(&self, _question: &Question, _answers: &mut AnswerMap) {}

    fn body(&self, question: &Question, answers: &AnswerMap) -> StepBody;

    /// Commits `input`. On error the answer map is left unchanged.
    fn apply(
        &self,
        question: &Question,
        answers: &mut AnswerMap,
        input: &StepInput,
    ) -> Result<(), WizardError>;

    /// Whether Next is enabled for this step.
    fn is_valid(&self, question: &Question, answers: &AnswerMap) -> bool;
}

pub struct DefaultStep;
pub struct ImageGridStep;
pub struct SliderStep;
pub struct ToneFacesStep;
pub struct UndertoneStep;

pub fn behavior(layout: Layout) -> &'static dyn StepLayout {
    match layout {
        Layout::Default => &DefaultStep,
        Layout::ImageGrid => &ImageGridStep,
        Layout::Slider => &SliderStep,
        Layout::ToneFaces => &ToneFacesStep,
        Layout::Undertone => &UndertoneStep,
    }
}

/// Answer value written for the tone stop `label`: `"Light Medium"` becomes
/// `tone_light_medium`.
pub fn tone_key(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    for ch in label.trim().chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    format!("tone_{slug}")
}

impl StepLayout for DefaultStep {
    fn layout(&self) -> Layout {
        Layout::Default
    }

    fn body(&self, question: &Question, answers: &AnswerMap) -> StepBody {
        let multi = question.selection == SelectionType::Multi;
        let stored = answers.get(&question.id);
        let options = question
            .options
            .iter()
            .map(|option| {
                let value = option.value.as_key();
                let selected = match stored {
                    Some(answer) if multi => answer.as_scalar().is_none() && answer.contains(&value),
                    Some(answer) => answer.as_scalar() == Some(value.as_str()),
                    None => false,
                };
                option_view(option, selected, false)
            })
            .collect();
        StepBody { multi, options, slider: None }
    }

    fn apply(
        &self,
        question: &Question,
        answers: &mut AnswerMap,
        input: &StepInput,
    ) -> Result<(), WizardError> {
        let value = chosen_value(self.layout(), question, input)?;
        match question.selection {
            SelectionType::Multi => answers.toggle(&question.id, &value),
            SelectionType::Single => answers.set_scalar(question.id.clone(), value),
        }
        Ok(())
    }

    fn is_valid(&self, _question: &Question, _answers: &AnswerMap) -> bool {
        true
    }
}

impl StepLayout for ImageGridStep {
    fn layout(&self) -> Layout {
        Layout::ImageGrid
    }

    fn body(&self, question: &Question, answers: &AnswerMap) -> StepBody {
        let stored = answers.scalar(&question.id);
        let options = question
            .options
            .iter()
            .map(|option| option_view(option, stored == Some(option.value.as_key().as_str()), false))
            .collect();
        StepBody { multi: false, options, slider: None }
    }

    fn apply(
        &self,
        question: &Question,
        answers: &mut AnswerMap,
        input: &StepInput,
    ) -> Result<(), WizardError> {
        let value = chosen_value(self.layout(), question, input)?;
        answers.set_scalar(question.id.clone(), value);
        Ok(())
    }

    fn is_valid(&self, question: &Question, answers: &AnswerMap) -> bool {
        answers
            .scalar(&question.id)
            .is_some_and(|stored| find_option(question, stored).is_some())
    }
}

impl SliderStep {
    fn position(question: &Question, answers: &AnswerMap) -> usize {
        answers
            .scalar(&question.id)
            .and_then(|stored| {
                question.options.iter().position(|option| option.value.as_key() == stored)
            })
            .unwrap_or(0)
    }

    fn labels(question: &Question) -> Vec<String> {
        if question.stops.is_empty() {
            question.options.iter().map(|option| option.label.clone()).collect()
        } else {
            question.stops.clone()
        }
    }
}

impl StepLayout for SliderStep {
    fn layout(&self) -> Layout {
        Layout::Slider
    }

    fn enter(&self, question: &Question, answers: &mut AnswerMap) {
        if answers.contains_key(&question.id) {
            return;
        }
        if let Some(first) = question.options.first() {
            answers.set_scalar(question.id.clone(), first.value.as_key());
        }
    }

    fn body(&self, question: &Question, answers: &AnswerMap) -> StepBody {
        let index = Self::position(question, answers);
        let options = question
            .options
            .iter()
            .enumerate()
            .map(|(position, option)| option_view(option, position == index, false))
            .collect();
        StepBody {
            multi: false,
            options,
            slider: Some(SliderView {
                index,
                max: question.options.len().saturating_sub(1),
                stops: Self::labels(question),
            }),
        }
    }

    fn apply(
        &self,
        question: &Question,
        answers: &mut AnswerMap,
        input: &StepInput,
    ) -> Result<(), WizardError> {
        let value = match input {
            StepInput::Slide { index } => question
                .options
                .get(*index)
                .map(|option| option.value.as_key())
                .ok_or_else(|| slider_error(question, *index, question.options.len()))?,
            StepInput::Choose { .. } => chosen_value(self.layout(), question, input)?,
        };
        answers.set_scalar(question.id.clone(), value);
        Ok(())
    }

    fn is_valid(&self, _question: &Question, _answers: &AnswerMap) -> bool {
        true
    }
}

impl ToneFacesStep {
    /// Slider index restored from the stored tone, defaulting to the first stop.
    fn tone_index(question: &Question, answers: &AnswerMap) -> usize {
        answers
            .scalar(TONE_KEY)
            .and_then(|tone| question.stops.iter().position(|stop| tone_key(stop) == tone))
            .unwrap_or(0)
    }

    /// Slider stop a face belongs to. Groups past the last stop pin to it,
    /// the way a range input clamps its value.
    fn face_stop(question: &Question, option: &QuizOption) -> usize {
        option.group_index().min(question.stops.len().saturating_sub(1))
    }

    fn set_tone(
        question: &Question,
        answers: &mut AnswerMap,
        index: usize,
    ) -> Result<(), WizardError> {
        let stop =
            question.stops.get(index).ok_or_else(|| slider_error(question, index, question.stops.len()))?;
        answers.set_scalar(TONE_KEY, tone_key(stop));
        Ok(())
    }
}

impl StepLayout for ToneFacesStep {
    fn layout(&self) -> Layout {
        Layout::ToneFaces
    }

    fn body(&self, question: &Question, answers: &AnswerMap) -> StepBody {
        let index = Self::tone_index(question, answers);
        let face = answers.scalar(FACE_KEY);
        let options = question
            .options
            .iter()
            .map(|option| {
                let selected = face == Some(option.value.as_key().as_str());
                option_view(option, selected, Self::face_stop(question, option) != index)
            })
            .collect();
        StepBody {
            multi: false,
            options,
            slider: Some(SliderView {
                index,
                max: question.stops.len().saturating_sub(1),
                stops: question.stops.clone(),
            }),
        }
    }

    fn apply(
        &self,
        question: &Question,
        answers: &mut AnswerMap,
        input: &StepInput,
    ) -> Result<(), WizardError> {
        match input {
            StepInput::Slide { index } => {
                Self::set_tone(question, answers, *index)?;
                let face_in_group = answers
                    .scalar(FACE_KEY)
                    .and_then(|face| find_option(question, face))
                    .is_some_and(|option| Self::face_stop(question, option) == *index);
                if !face_in_group {
                    answers.remove(FACE_KEY);
                }
            }
            StepInput::Choose { value } => {
                let option = find_option(question, value).ok_or_else(|| {
                    WizardError::UnknownOption {
                        question_id: question.id.clone(),
                        value: value.clone(),
                    }
                })?;
                if !question.stops.is_empty() {
                    Self::set_tone(question, answers, Self::face_stop(question, option))?;
                }
                answers.set_scalar(FACE_KEY, option.value.as_key());
            }
        }
        Ok(())
    }

    fn is_valid(&self, _question: &Question, answers: &AnswerMap) -> bool {
        answers.contains_key(TONE_KEY) && answers.contains_key(FACE_KEY)
    }
}

impl StepLayout for UndertoneStep {
    fn layout(&self) -> Layout {
        Layout::Undertone
    }

    fn body(&self, question: &Question, answers: &AnswerMap) -> StepBody {
        let stored = answers.scalar(UNDERTONE_KEY);
        let options = question
            .options
            .iter()
            .map(|option| option_view(option, stored == Some(option.value.as_key().as_str()), false))
            .collect();
        StepBody { multi: false, options, slider: None }
    }

    fn apply(
        &self,
        question: &Question,
        answers: &mut AnswerMap,
        input: &StepInput,
    ) -> Result<(), WizardError> {
        let value = chosen_value(self.layout(), question, input)?;
        answers.set_scalar(UNDERTONE_KEY, value);
        Ok(())
    }

    // Skippable on purpose; the undertone step is soft onboarding.
    fn is_valid(&self, _question: &Question, _answers: &AnswerMap) -> bool {
        true
    }
}

fn find_option<'q>(question: &'q Question, value: &str) -> Option<&'q QuizOption> {
    question.options.iter().find(|option| option.value.as_key() == value)
}

/// Canonical value for a `Choose` input; other inputs are rejected.
fn chosen_value(
    layout: Layout,
    question: &Question,
    input: &StepInput,
) -> Result<String, WizardError> {
    let StepInput::Choose { value } = input else {
        return Err(WizardError::UnsupportedInput { layout, input: input.kind() });
    };
    find_option(question, value).map(|option| option.value.as_key()).ok_or_else(|| {
        WizardError::UnknownOption { question_id: question.id.clone(), value: value.clone() }
    })
}

fn slider_error(question: &Question, index: usize, positions: usize) -> WizardError {
    if positions == 0 {
        WizardError::NoSliderPositions { question_id: question.id.clone() }
    } else {
        WizardError::SliderOutOfRange {
            question_id: question.id.clone(),
            index,
            max: positions - 1,
        }
    }
}

fn option_view(option: &QuizOption, selected: bool, dimmed: bool) -> OptionView {
    OptionView {
        value: option.value.as_key(),
        label: option.label.clone(),
        image: option.image.clone(),
        color: option.color.clone(),
        desc: option.desc.clone(),
        selected,
        dimmed,
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::answers::{AnswerMap, AnswerValue, FACE_KEY, TONE_KEY, UNDERTONE_KEY};
    use crate::domain::quiz::{Layout, Question};
    use crate::wizard::layouts::{behavior, tone_key};
    use crate::wizard::states::{StepInput, WizardError};

    fn question(raw: serde_json::Value) -> Question {
        serde_json::from_value(raw).expect("question fixture")
    }

    fn tone_faces() -> Question {
        question(serde_json::json!({
            "id": "tonefaces",
            "title": "Find your tone",
            "layout": "tone-faces",
            "stops": ["Light", "Medium", "Deep"],
            "options": [
                {"value": "f1", "label": "Ava", "group": 0},
                {"value": "f2", "label": "Bea", "group": 0},
                {"value": "f3", "label": "Cy", "group": 1},
                {"value": "f4", "label": "Dee", "group": 2}
            ]
        }))
    }

    #[test]
    fn tone_keys_slug_stop_labels() {
        assert_eq!(tone_key("Light"), "tone_light");
        assert_eq!(tone_key("Light Medium"), "tone_light_medium");
        assert_eq!(tone_key(" Tan / Deep "), "tone_tan_deep");
    }

    #[test]
    fn behavior_dispatch_covers_every_layout() {
        for layout in [
            Layout::Default,
            Layout::ImageGrid,
            Layout::Slider,
            Layout::ToneFaces,
            Layout::Undertone,
        ] {
            assert_eq!(behavior(layout).layout(), layout);
        }
    }

    #[test]
    fn default_multi_toggles_and_single_replaces() {
        let multi = question(serde_json::json!({
            "id": "concerns", "type": "multi",
            "options": [{"value": "redness"}, {"value": "dryness"}]
        }));
        let single = question(serde_json::json!({
            "id": "finish", "options": [{"value": "matte"}, {"value": "dewy"}]
        }));
        let step = behavior(Layout::Default);
        let mut answers = AnswerMap::new();

        step.apply(&multi, &mut answers, &StepInput::choose("redness")).expect("toggle on");
        step.apply(&multi, &mut answers, &StepInput::choose("dryness")).expect("toggle on");
        step.apply(&multi, &mut answers, &StepInput::choose("redness")).expect("toggle off");
        step.apply(&single, &mut answers, &StepInput::choose("matte")).expect("choose");
        step.apply(&single, &mut answers, &StepInput::choose("dewy")).expect("replace");

        assert_eq!(
            answers.get("concerns"),
            Some(&AnswerValue::MultiSelect(vec!["dryness".to_string()]))
        );
        assert_eq!(answers.scalar("finish"), Some("dewy"));
        assert!(step.is_valid(&single, &AnswerMap::new()));

        let body = step.body(&multi, &answers);
        assert!(body.multi);
        let selected: Vec<_> =
            body.options.iter().filter(|option| option.selected).map(|option| &option.value).collect();
        assert_eq!(selected, vec!["dryness"]);
    }

    #[test]
    fn unknown_options_leave_answers_untouched() {
        let single = question(serde_json::json!({
            "id": "finish", "options": [{"value": "matte"}]
        }));
        let mut answers = AnswerMap::new();

        let error = behavior(Layout::Default)
            .apply(&single, &mut answers, &StepInput::choose("glitter"))
            .expect_err("unknown option");

        assert!(matches!(error, WizardError::UnknownOption { .. }));
        assert!(answers.is_empty());
    }

    #[test]
    fn image_grid_requires_exactly_one_choice() {
        let grid = question(serde_json::json!({
            "id": "coverage", "layout": "image-grid", "type": "multi",
            "options": [{"value": "sheer", "image": "sheer.png"}, {"value": "full"}]
        }));
        let step = behavior(Layout::ImageGrid);
        let mut answers = AnswerMap::new();
        assert!(!step.is_valid(&grid, &answers));

        step.apply(&grid, &mut answers, &StepInput::choose("sheer")).expect("choose");
        step.apply(&grid, &mut answers, &StepInput::choose("full")).expect("replace");

        assert!(step.is_valid(&grid, &answers));
        assert_eq!(answers.scalar("coverage"), Some("full"));
        let selected: Vec<_> =
            step.body(&grid, &answers).options.into_iter().filter(|option| option.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].value, "full");
    }

    #[test]
    fn slider_commits_implicit_default_and_restores_position() {
        let slider = question(serde_json::json!({
            "id": "coverage", "layout": "slider", "stops": ["Sheer", "Medium", "Full"],
            "options": [{"value": 1}, {"value": 2}, {"value": 3}]
        }));
        let step = behavior(Layout::Slider);
        let mut answers = AnswerMap::new();

        step.enter(&slider, &mut answers);
        assert_eq!(answers.scalar("coverage"), Some("1"));
        assert!(step.is_valid(&slider, &answers));

        step.apply(&slider, &mut answers, &StepInput::Slide { index: 2 }).expect("slide");
        step.enter(&slider, &mut answers);
        assert_eq!(answers.scalar("coverage"), Some("3"));

        let view = step.body(&slider, &answers).slider.expect("slider view");
        assert_eq!(view.index, 2);
        assert_eq!(view.active_stop(), Some("Full"));

        let error = step
            .apply(&slider, &mut answers, &StepInput::Slide { index: 3 })
            .expect_err("out of range");
        assert_eq!(
            error,
            WizardError::SliderOutOfRange { question_id: "coverage".to_string(), index: 3, max: 2 }
        );
    }

    #[test]
    fn picking_a_face_moves_the_slider_to_its_group() {
        let question = tone_faces();
        let step = behavior(Layout::ToneFaces);
        let mut answers = AnswerMap::new();
        assert!(!step.is_valid(&question, &answers));

        step.apply(&question, &mut answers, &StepInput::choose("f3")).expect("pick face");

        assert_eq!(answers.scalar(TONE_KEY), Some("tone_medium"));
        assert_eq!(answers.scalar(FACE_KEY), Some("f3"));
        assert!(step.is_valid(&question, &answers));

        let body = step.body(&question, &answers);
        assert_eq!(body.slider.expect("slider").index, 1);
        let dimmed: Vec<_> =
            body.options.iter().filter(|option| option.dimmed).map(|option| &option.value).collect();
        assert_eq!(dimmed, vec!["f1", "f2", "f4"]);
    }

    #[test]
    fn moving_the_slider_away_clears_a_face_from_another_group() {
        let question = tone_faces();
        let step = behavior(Layout::ToneFaces);
        let mut answers = AnswerMap::new();
        step.apply(&question, &mut answers, &StepInput::choose("f1")).expect("pick face");

        step.apply(&question, &mut answers, &StepInput::Slide { index: 2 }).expect("slide");

        assert_eq!(answers.scalar(TONE_KEY), Some("tone_deep"));
        assert!(!answers.contains_key(FACE_KEY));
        assert!(!step.is_valid(&question, &answers));

        step.apply(&question, &mut answers, &StepInput::choose("f4")).expect("pick face");
        assert!(step.is_valid(&question, &answers));
    }

    #[test]
    fn moving_the_slider_within_the_group_keeps_the_face() {
        let question = tone_faces();
        let step = behavior(Layout::ToneFaces);
        let mut answers = AnswerMap::new();
        step.apply(&question, &mut answers, &StepInput::choose("f2")).expect("pick face");

        step.apply(&question, &mut answers, &StepInput::Slide { index: 0 }).expect("slide");

        assert_eq!(answers.scalar(FACE_KEY), Some("f2"));
        assert!(step.is_valid(&question, &answers));
    }

    #[test]
    fn face_grouped_past_the_last_stop_pins_the_slider_to_it() {
        let question = question(serde_json::json!({
            "id": "tonefaces", "layout": "tone-faces", "stops": ["Light"],
            "options": [{"value": "f1", "group": 0}, {"value": "f9", "group": 3}]
        }));
        let step = behavior(Layout::ToneFaces);
        let mut answers = AnswerMap::new();

        step.apply(&question, &mut answers, &StepInput::choose("f9")).expect("pick face");

        assert_eq!(answers.scalar(TONE_KEY), Some("tone_light"));
        assert_eq!(answers.scalar(FACE_KEY), Some("f9"));
        assert!(step.is_valid(&question, &answers));
        let body = step.body(&question, &answers);
        assert!(body.options.iter().all(|option| !option.dimmed));

        step.apply(&question, &mut answers, &StepInput::Slide { index: 0 }).expect("slide");
        assert_eq!(answers.scalar(FACE_KEY), Some("f9"));
    }

    #[test]
    fn tone_slider_without_stops_is_rejected() {
        let question = question(serde_json::json!({
            "id": "tonefaces", "layout": "tone-faces", "options": [{"value": "f1"}]
        }));
        let mut answers = AnswerMap::new();

        let error = behavior(Layout::ToneFaces)
            .apply(&question, &mut answers, &StepInput::Slide { index: 0 })
            .expect_err("no stops");

        assert_eq!(error, WizardError::NoSliderPositions { question_id: "tonefaces".to_string() });
        assert!(answers.is_empty());
    }

    #[test]
    fn undertone_writes_its_own_key_and_is_skippable() {
        let undertone = question(serde_json::json!({
            "id": "step-2", "layout": "undertone",
            "options": [{"value": "warm", "color": "#e0b080"}, {"value": "cool"}]
        }));
        let step = behavior(Layout::Undertone);
        let mut answers = AnswerMap::new();
        assert!(step.is_valid(&undertone, &answers));

        step.apply(&undertone, &mut answers, &StepInput::choose("cool")).expect("choose");

        assert_eq!(answers.scalar(UNDERTONE_KEY), Some("cool"));
        assert!(!answers.contains_key("step-2"));
        let error = step
            .apply(&undertone, &mut answers, &StepInput::Slide { index: 0 })
            .expect_err("radio group has no slider");
        assert_eq!(
            error,
            WizardError::UnsupportedInput { layout: Layout::Undertone, input: "slide" }
        );
    }
}

use std::convert::Infallible;
use std::path::Path;

use quizlite_core::config::LoadOptions;
use quizlite_core::materializer::ResultMaterializer;
use quizlite_core::recommend::RecommendationService;
use quizlite_core::wizard::{StepInput, Wizard, WizardState};
use serde::Deserialize;
use serde_json::json;

use super::{
    load_config, load_document, read_input, runtime, CommandResult, EXIT_INPUT, EXIT_RUNTIME,
};

const COMMAND: &str = "walk";

/// One scripted interaction, e.g. `{"action": "choose", "value": "dry"}`.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum ScriptAction {
    Choose { value: String },
    Slide { index: usize },
    Next,
    Previous,
}

/// Replays a scripted session through the wizard, then runs the offline
/// recommendation pipeline on the submitted answers.
pub fn run(options: LoadOptions, script_path: &Path) -> CommandResult {
    match execute(options, script_path) {
        Ok(result) | Err(result) => result,
    }
}

fn execute(options: LoadOptions, script_path: &Path) -> Result<CommandResult, CommandResult> {
    let config = load_config(COMMAND, options)?;
    let (store, quiz) = load_document(COMMAND, &config)?;
    let script: Vec<ScriptAction> = read_input(COMMAND, script_path)?;

    let mut wizard = Wizard::new(quiz.clone());
    for (position, action) in script.into_iter().enumerate() {
        let applied = match action {
            ScriptAction::Choose { value } => wizard.input(StepInput::Choose { value }),
            ScriptAction::Slide { index } => wizard.input(StepInput::Slide { index }),
            // A submit snapshot equals the wizard's answers; it is resolved
            // once the script is exhausted.
            ScriptAction::Next => wizard.next().map(|_| ()),
            ScriptAction::Previous => wizard.previous().map(|_| ()),
        };
        applied.map_err(|error| {
            CommandResult::failure(
                COMMAND,
                "invalid_input",
                format!("script action {position} rejected: {error}"),
                EXIT_INPUT,
            )
        })?;
    }

    if let WizardState::Step(step) = wizard.state() {
        return Err(CommandResult::failure(
            COMMAND,
            "invalid_input",
            format!("script ended on step {step} without submitting"),
            EXIT_INPUT,
        ));
    }

    let answers = wizard.answers().clone();
    let service = RecommendationService::new(store, ResultMaterializer::without_catalog());
    let recommendation =
        runtime(COMMAND)?.block_on(service.recommend_with(&quiz, &answers, "cli-walk"));

    let results = wizard
        .show_results(Ok::<_, Infallible>(recommendation.products))
        .map_err(|error| {
            CommandResult::failure(COMMAND, "runtime", error.to_string(), EXIT_RUNTIME)
        })?;

    let message = format!("{} result cards", results.cards().len());
    let data = json!({
        "answers": answers.to_entries(),
        "tier": recommendation.resolution.tier,
        "results": results,
    });
    Ok(CommandResult::success_with(COMMAND, message, Some(data)))
}

use std::path::Path;

use quizlite_core::config::LoadOptions;
use quizlite_core::domain::answers::{AnswerEntry, AnswerMap};
use quizlite_core::materializer::ResultMaterializer;
use quizlite_core::recommend::RecommendationService;
use serde::Deserialize;

use super::{load_config, load_document, read_input, runtime, CommandResult, EXIT_RUNTIME};

const COMMAND: &str = "recommend";

/// Either the widget's request body or just its `answers` array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AnswersFile {
    Request { answers: Vec<AnswerEntry> },
    Entries(Vec<AnswerEntry>),
}

impl AnswersFile {
    fn into_entries(self) -> Vec<AnswerEntry> {
        match self {
            Self::Request { answers } | Self::Entries(answers) => answers,
        }
    }
}

/// Resolves an answers file against the configured quiz document. Catalog
/// lookups are never made; products carry their handle only.
pub fn run(options: LoadOptions, answers_path: &Path) -> CommandResult {
    match execute(options, answers_path) {
        Ok(result) | Err(result) => result,
    }
}

fn execute(options: LoadOptions, answers_path: &Path) -> Result<CommandResult, CommandResult> {
    let config = load_config(COMMAND, options)?;
    let (store, quiz) = load_document(COMMAND, &config)?;
    let answers_file: AnswersFile = read_input(COMMAND, answers_path)?;
    let answers = AnswerMap::from_entries(answers_file.into_entries());

    let service = RecommendationService::new(store, ResultMaterializer::without_catalog());
    let recommendation =
        runtime(COMMAND)?.block_on(service.recommend_with(&quiz, &answers, "cli-recommend"));

    let message = format!(
        "{} products via {:?}",
        recommendation.products.len(),
        recommendation.resolution.tier
    );
    let data = serde_json::to_value(&recommendation).map_err(|error| {
        CommandResult::failure(COMMAND, "runtime", error.to_string(), EXIT_RUNTIME)
    })?;
    Ok(CommandResult::success_with(COMMAND, message, Some(data)))
}

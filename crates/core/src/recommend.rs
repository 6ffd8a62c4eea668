use serde::Serialize;
use tracing::info;

use crate::domain::answers::AnswerMap;
use crate::domain::product::ProductSummary;
use crate::domain::quiz::QuizConfig;
use crate::materializer::ResultMaterializer;
use crate::resolver::{resolve_traced, Resolution};
use crate::store::{ConfigStore, StoreError};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Recommendation {
    pub resolution: Resolution,
    pub products: Vec<ProductSummary>,
}

/// Full pipeline behind a quiz submission: load the current document,
/// resolve handles, then materialize summaries.
#[derive(Clone)]
pub struct RecommendationService {
    store: ConfigStore,
    materializer: ResultMaterializer,
}

impl RecommendationService {
    pub fn new(store: ConfigStore, materializer: ResultMaterializer) -> Self {
        Self { store, materializer }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn materializer(&self) -> &ResultMaterializer {
        &self.materializer
    }

    pub async fn recommend(
        &self,
        answers: &AnswerMap,
        correlation_id: &str,
    ) -> Result<Recommendation, StoreError> {
        let config = self.store.load_async().await?;
        Ok(self.recommend_with(&config, answers, correlation_id).await)
    }

    /// Same pipeline against an already loaded document.
    pub async fn recommend_with(
        &self,
        config: &QuizConfig,
        answers: &AnswerMap,
        correlation_id: &str,
    ) -> Recommendation {
        let resolution = resolve_traced(answers, config);
        info!(
            event_name = "quiz.recommend.resolved",
            correlation_id = %correlation_id,
            answers = answers.len(),
            handles = resolution.handles.len(),
            tier = ?resolution.tier,
            "resolved quiz answers"
        );

        let products = self.materializer.materialize(&resolution.handles).await;
        let degraded = products.iter().filter(|product| product.is_degraded()).count();
        info!(
            event_name = "quiz.recommend.materialized",
            correlation_id = %correlation_id,
            products = products.len(),
            degraded,
            enriching = self.materializer.is_enriching(),
            "materialized recommendations"
        );

        Recommendation { resolution, products }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use crate::domain::answers::{AnswerEntry, AnswerMap, EntryValue};
    use crate::domain::product::{Handle, ProductSummary};
    use crate::materializer::ResultMaterializer;
    use crate::recommend::RecommendationService;
    use crate::resolver::ResolutionTier;
    use crate::store::{ConfigStore, StoreError};

    const DOCUMENT: &str = r#"{
        "questions": [{"id": "skin", "options": [{"value": "dry"}, {"value": "oily"}]}],
        "rules": [
            {"questionId": "skin", "value": "dry", "recommend": ["hydra-glow"]},
            {"questionId": "skin", "value": "oily", "recommend": ["matte-pro"]}
        ],
        "combos": [{"when": {"tone": "tone_light", "undertone": "warm"}, "recommend": ["shade-a"]}]
    }"#;

    fn service(dir: &TempDir) -> RecommendationService {
        let path = dir.path().join("quiz.json");
        fs::write(&path, DOCUMENT).expect("seed document");
        RecommendationService::new(ConfigStore::new(path), ResultMaterializer::without_catalog())
    }

    fn answers(pairs: &[(&str, &str)]) -> AnswerMap {
        AnswerMap::from_entries(pairs.iter().map(|(key, value)| AnswerEntry {
            question_id: key.to_string(),
            value: Some(EntryValue::One((*value).into())),
        }))
    }

    #[tokio::test]
    async fn combo_match_returns_degraded_summaries_without_catalog() {
        let dir = TempDir::new().expect("tempdir");

        let recommendation = service(&dir)
            .recommend(&answers(&[("tone", "tone_light"), ("undertone", "warm")]), "req-1")
            .await
            .expect("recommendation");

        assert_eq!(recommendation.resolution.tier, ResolutionTier::Combos { matched: vec![0] });
        assert_eq!(recommendation.products, vec![ProductSummary::degraded(Handle::from("shade-a"))]);
    }

    #[tokio::test]
    async fn rules_answer_when_no_combo_matches() {
        let dir = TempDir::new().expect("tempdir");

        let recommendation =
            service(&dir).recommend(&answers(&[("skin", "oily")]), "req-2").await.expect("ok");

        assert_eq!(recommendation.resolution.tier, ResolutionTier::Rules { matched: vec![1] });
        assert_eq!(recommendation.products[0].handle, Handle::from("matte-pro"));
    }

    #[tokio::test]
    async fn no_match_is_an_empty_list() {
        let dir = TempDir::new().expect("tempdir");

        let recommendation =
            service(&dir).recommend(&AnswerMap::new(), "req-3").await.expect("ok");

        assert_eq!(recommendation.resolution.tier, ResolutionTier::NoMatch);
        assert!(recommendation.products.is_empty());
    }

    #[tokio::test]
    async fn unreadable_document_fails_the_request() {
        let dir = TempDir::new().expect("tempdir");
        let service = RecommendationService::new(
            ConfigStore::new(dir.path().join("missing.json")),
            ResultMaterializer::without_catalog(),
        );

        let result = service.recommend(&AnswerMap::new(), "req-4").await;

        assert!(matches!(result, Err(StoreError::Missing(_))));
    }
}

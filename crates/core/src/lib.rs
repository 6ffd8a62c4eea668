pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod materializer;
pub mod recommend;
pub mod resolver;
pub mod store;
pub mod wizard;

pub use catalog::{cents_to_major, CatalogLookupError, ProductCatalog};
pub use domain::answers::{AnswerEntry, AnswerMap, AnswerValue};
pub use domain::product::{CatalogProduct, Handle, HandleSet, ProductSummary};
pub use domain::quiz::{Combo, Layout, Question, QuizConfig, QuizOption, Rule, ScalarValue};
pub use errors::{ApplicationError, InterfaceError};
pub use materializer::ResultMaterializer;
pub use recommend::{Recommendation, RecommendationService};
pub use resolver::{resolve, resolve_traced, Resolution, ResolutionTier};
pub use store::{validate_document, ConfigStore, StoreError, ValidationError};
pub use wizard::{Advance, ResultsView, StepInput, StepView, Wizard, WizardError, WizardState};

pub mod dsl;
pub mod engine;
pub mod intent;

pub use dsl::{QueryResultRecord, QuestionRequest, QuestionResponse, QuestionValidationError, NO_ANSWER};
pub use engine::QuestionEngine;
pub use intent::{classify_intent, extract_entities, Intent};

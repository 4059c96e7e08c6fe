//! Domain types for the tens10n quiz catalog.
//!
//! Questions carry correct answers and decoy ("tension") answers; answer
//! categories are named lists of candidate strings used to fill in extra
//! distractors. Identity is case-insensitive for both, so every lookup goes
//! through the normalized keys in [`key`].

pub mod category;
pub mod error;
pub mod key;
pub mod question;
pub mod sampler;

pub use category::AnswerCategory;
pub use error::ValidationError;
pub use key::{normalize_category, QuestionKey};
pub use question::{AnswerMap, Question, QuestionList};
pub use sampler::Sampler;

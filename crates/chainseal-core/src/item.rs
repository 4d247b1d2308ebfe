//! The default content item: an exam question.
//!
//! Sealing is generic over any `Serialize + DeserializeOwned` item; this
//! type is what the exam workflow stores.

use serde::{Deserialize, Serialize};

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Question {
    /// Prompt shown to the candidate.
    pub text: String,
    /// Answer options, in display order.
    pub options: Vec<String>,
    /// Index into `options` of the correct answer.
    pub correct_option: u32,
}

impl Question {
    /// Create a new question.
    pub fn new(
        text: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
        correct_option: u32,
    ) -> Self {
        Self {
            text: text.into(),
            options: options.into_iter().map(Into::into).collect(),
            correct_option,
        }
    }
}

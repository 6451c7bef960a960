//! The client-visible success shape.
//!
//! Serialises to exactly `{"choices":[{"message":{"content":"…"}}]}`, a
//! strict subset of an OpenAI-style completion, so browser code written
//! against the remote API keeps working unchanged.

use serde::{Deserialize, Serialize};

/// Normalised result of one document analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceResult {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub message: Message,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub content: String,
}

impl InferenceResult {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            choices: vec![Choice {
                message: Message {
                    content: content.into(),
                },
            }],
        }
    }

    /// The single content string.
    pub fn content(&self) -> &str {
        self.choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialises_to_exact_shape() {
        let json = serde_json::to_string(&InferenceResult::new("42")).unwrap();
        assert_eq!(json, r#"{"choices":[{"message":{"content":"42"}}]}"#);
    }
}

use serde::{Deserialize, Serialize};

/// Nicks are unique, case-sensitive keys handed to us by the chat transport.
pub type Nick = String;

/// One entry of a question source, immutable once loaded.
///
/// `answer` may mark a canonical substring with a pair of `#` characters;
/// the surrounding text is flavor that is only shown once the round ends.
/// `regexp` overrides the answer matcher for questions whose canonical
/// answer is not a usable literal pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub question: String,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regexp: Option<String>,
}

use serde::{Deserialize, Serialize};

/// Body for topic creation, explanation and question generation.
///
/// Fields are optional so a missing value surfaces as a validation error
/// rather than a JSON rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopicRequest {
    #[serde(default)]
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicsResponse {
    pub success: bool,
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplanationResponse {
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResponse {
    pub question: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitAnswerRequest {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub follow_up_question: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Verdict parsed from the grader's reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradingResult {
    pub correct: bool,
    pub explanation: String,
}

/// Body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Context a follow-up question is asked in
#[derive(Debug, Clone, Default)]
pub struct FollowUp<'a> {
    pub topic: &'a str,
    pub question: &'a str,
    pub answer: &'a str,
    pub follow_up_question: &'a str,
}

use tracing::{debug, info};

use crate::gateway::ProviderGateway;
use crate::llm_providers::{CompletionRequest, ProviderError};
use crate::models::{FollowUp, GradingResult};
use crate::prompts::{self, QuestionStyle};

// Import logging macros
use crate::log_llm_operation;

const EXPLANATION_MAX_TOKENS: u32 = 200;
const QUESTION_MAX_TOKENS: u32 = 400;
const GRADING_MAX_TOKENS: u32 = 600;
const FOLLOW_UP_MAX_TOKENS: u32 = 600;

/// Higher than the provider default so repeated questions on one topic vary
const QUESTION_TEMPERATURE: f32 = 1.2;

const DEFAULT_EXPLANATION: &str = "No explanation provided.";

#[derive(Debug, Clone)]
pub struct GeneratedQuestion {
    pub style: QuestionStyle,
    pub question: String,
}

#[derive(Clone)]
pub struct QuizService {
    gateway: ProviderGateway,
}

impl QuizService {
    pub fn new(gateway: ProviderGateway) -> Self {
        Self { gateway }
    }

    /// Explain a topic. Served by the primary provider only.
    pub async fn explain_topic(&self, topic: &str) -> Result<String, ProviderError> {
        log_llm_operation!(start, "explain_topic", topic = topic);

        let request = CompletionRequest::new(prompts::explanation_prompt(topic), EXPLANATION_MAX_TOKENS)
            .with_system(prompts::EXPLANATION_SYSTEM);

        self.gateway.complete_primary_only(&request).await
    }

    pub async fn generate_question(&self, topic: &str) -> Result<GeneratedQuestion, ProviderError> {
        log_llm_operation!(start, "generate_question", topic = topic);

        let template = prompts::choose_question_template(&mut rand::thread_rng());
        debug!(topic = %topic, style = ?template.style, "Selected question template");

        let request = CompletionRequest::new(template.render(topic), QUESTION_MAX_TOKENS)
            .with_system(prompts::QUESTION_SYSTEM)
            .with_temperature(QUESTION_TEMPERATURE);

        let question = self.gateway.complete(&request).await?;

        info!(
            topic = %topic,
            style = ?template.style,
            question_length = question.len(),
            "Generated quiz question"
        );

        Ok(GeneratedQuestion {
            style: template.style,
            question,
        })
    }

    pub async fn grade_answer(
        &self,
        topic: &str,
        question: &str,
        answer: &str,
    ) -> Result<GradingResult, ProviderError> {
        log_llm_operation!(start, "grade_answer", topic = topic);

        let request = CompletionRequest::new(
            prompts::grading_prompt(topic, question, answer),
            GRADING_MAX_TOKENS,
        )
        .with_system(prompts::GRADING_SYSTEM);

        let verdict = self.gateway.complete(&request).await?;
        debug!(topic = %topic, response_content = %verdict, "Raw grading response");

        let result = parse_grading(&verdict);
        info!(
            topic = %topic,
            correct = result.correct,
            "Graded quiz answer"
        );

        Ok(result)
    }

    pub async fn answer_follow_up(&self, follow_up: &FollowUp<'_>) -> Result<String, ProviderError> {
        log_llm_operation!(start, "answer_follow_up", topic = follow_up.topic);

        let prompt = prompts::follow_up_prompt(
            follow_up.topic,
            follow_up.question,
            follow_up.answer,
            follow_up.follow_up_question,
        );
        let request =
            CompletionRequest::new(prompt, FOLLOW_UP_MAX_TOKENS).with_system(prompts::FOLLOW_UP_SYSTEM);

        self.gateway.complete(&request).await
    }
}

/// Read the verdict from the first line and the explanation from the rest.
///
/// `INCORRECT` contains `CORRECT`, so a first line mentioning both is
/// treated as incorrect.
pub fn parse_grading(text: &str) -> GradingResult {
    let (first_line, rest) = match text.split_once('\n') {
        Some((first, rest)) => (first, Some(rest)),
        None => (text, None),
    };

    let verdict = first_line.trim().to_uppercase();
    let correct = verdict.contains("CORRECT") && !verdict.contains("INCORRECT");

    let explanation = rest
        .map(str::trim)
        .filter(|rest| !rest.is_empty())
        .unwrap_or(DEFAULT_EXPLANATION)
        .to_string();

    GradingResult {
        correct,
        explanation,
    }
}

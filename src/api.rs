use axum::{
    Router,
    extract::{Path, State, rejection::JsonRejection},
    response::Json,
    routing::{delete, get, post},
};
use tracing::debug;

use crate::{
    errors::{ApiError, ErrorContext, ErrorReply},
    models::*,
    quiz_service::QuizService,
    topic_store::TopicStore,
};

// Import logging macros
use crate::{log_api_error, log_api_start, log_api_success, log_api_warn, log_validation};

#[derive(Clone)]
pub struct AppState {
    pub topic_store: TopicStore,
    pub quiz_service: QuizService,
}

pub type ApiResult<T> = Result<Json<T>, ErrorReply>;

/// Return the trimmed value of a required field, or a validation error
fn required(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn validation_error(operation: &str, message: &str) -> ErrorReply {
    log_validation!(failure, "api_request", error = message);
    ApiError::ValidationError(message.to_string())
        .to_response_with_context(ErrorContext::new(operation, "request"))
}

/// Unwrap a JSON body, answering malformed or mistyped input with a 400
fn json_body<T>(operation: &str, payload: Result<Json<T>, JsonRejection>) -> Result<T, ErrorReply> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        validation_error(
            operation,
            &format!("Invalid request body: {}", rejection.body_text()),
        )
    })
}

// Topic endpoints
pub async fn list_topics(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    log_api_start!("list_topics");

    match state.topic_store.load().await {
        Ok(topics) => {
            log_api_success!("list_topics", count = topics.len(), "topics listed");
            Ok(Json(topics))
        }
        Err(e) => {
            log_api_error!("list_topics", error = e, "failed to load topics");
            Err(ApiError::from(e).to_response_with_context(ErrorContext::new("list_topics", "topic")))
        }
    }
}

pub async fn add_topic(
    State(state): State<AppState>,
    payload: Result<Json<TopicRequest>, JsonRejection>,
) -> ApiResult<TopicsResponse> {
    let request = json_body("add_topic", payload)?;
    let topic = request.topic.unwrap_or_default();
    log_api_start!("add_topic", topic = topic);

    match state.topic_store.add(&topic).await {
        Ok(topics) => {
            log_api_success!("add_topic", topic = topic.trim(), "topic added");
            Ok(Json(TopicsResponse {
                success: true,
                topics,
            }))
        }
        Err(e) => {
            let context = ErrorContext::new("add_topic", "topic").with_id(topic.trim());
            Err(ApiError::from(e).to_response_with_context(context))
        }
    }
}

pub async fn delete_topic(
    State(state): State<AppState>,
    Path(topic): Path<String>,
) -> ApiResult<TopicsResponse> {
    log_api_start!("delete_topic", topic = topic);

    match state.topic_store.remove(&topic).await {
        Ok(topics) => {
            log_api_success!("delete_topic", topic = topic, "topic deleted");
            Ok(Json(TopicsResponse {
                success: true,
                topics,
            }))
        }
        Err(e) => {
            log_api_warn!("delete_topic", topic = topic, e);
            let context = ErrorContext::new("delete_topic", "topic").with_id(&topic);
            Err(ApiError::from(e).to_response_with_context(context))
        }
    }
}

// Quiz endpoints
pub async fn topic_explanation(
    State(state): State<AppState>,
    payload: Result<Json<TopicRequest>, JsonRejection>,
) -> ApiResult<ExplanationResponse> {
    let request = json_body("topic_explanation", payload)?;
    let Some(topic) = required(&request.topic) else {
        return Err(validation_error("topic_explanation", "Topic is required"));
    };
    log_api_start!("topic_explanation", topic = topic);

    match state.quiz_service.explain_topic(topic).await {
        Ok(explanation) => {
            log_api_success!("topic_explanation", topic = topic, "explanation generated");
            Ok(Json(ExplanationResponse { explanation }))
        }
        Err(e) => {
            // No local fallback here, so every failure reads the same to the client
            let context = ErrorContext::new("topic_explanation", "topic")
                .with_id(topic)
                .with_user_message("Failed to get explanation");
            Err(ApiError::LLMError(e.to_string()).to_response_with_context(context))
        }
    }
}

pub async fn generate_question(
    State(state): State<AppState>,
    payload: Result<Json<TopicRequest>, JsonRejection>,
) -> ApiResult<QuestionResponse> {
    let request = json_body("generate_question", payload)?;
    let Some(topic) = required(&request.topic) else {
        return Err(validation_error("generate_question", "Topic is required"));
    };
    log_api_start!("generate_question", topic = topic);

    match state.quiz_service.generate_question(topic).await {
        Ok(generated) => {
            debug!(topic = %topic, style = ?generated.style, "Question ready");
            log_api_success!("generate_question", topic = topic, "question generated");
            Ok(Json(QuestionResponse {
                question: generated.question,
            }))
        }
        Err(e) => {
            let context = ErrorContext::new("generate_question", "question").with_id(topic);
            Err(ApiError::from(e).to_response_with_context(context))
        }
    }
}

pub async fn submit_answer(
    State(state): State<AppState>,
    payload: Result<Json<SubmitAnswerRequest>, JsonRejection>,
) -> ApiResult<GradingResult> {
    let request = json_body("submit_answer", payload)?;
    let (Some(topic), Some(question), Some(answer)) = (
        required(&request.topic),
        required(&request.question),
        required(&request.answer),
    ) else {
        return Err(validation_error(
            "submit_answer",
            "Topic, question, and answer are required",
        ));
    };
    log_api_start!("submit_answer", topic = topic);

    match state.quiz_service.grade_answer(topic, question, answer).await {
        Ok(result) => {
            log_api_success!(
                "submit_answer",
                topic = topic,
                if result.correct { "answer graded correct" } else { "answer graded incorrect" }
            );
            Ok(Json(result))
        }
        Err(e) => {
            let context = ErrorContext::new("submit_answer", "answer").with_id(topic);
            Err(ApiError::from(e).to_response_with_context(context))
        }
    }
}

pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<ChatResponse> {
    let request = json_body("chat", payload)?;
    let Some(follow_up_question) = required(&request.follow_up_question) else {
        return Err(validation_error("chat", "Follow-up question is required"));
    };

    let follow_up = FollowUp {
        topic: request.topic.as_deref().unwrap_or_default(),
        question: request.question.as_deref().unwrap_or_default(),
        answer: request.answer.as_deref().unwrap_or_default(),
        follow_up_question,
    };
    log_api_start!("chat", topic = follow_up.topic);

    match state.quiz_service.answer_follow_up(&follow_up).await {
        Ok(response) => {
            log_api_success!("chat", topic = follow_up.topic, "follow-up answered");
            Ok(Json(ChatResponse { response }))
        }
        Err(e) => {
            let context = ErrorContext::new("chat", "follow_up").with_id(follow_up.topic);
            Err(ApiError::from(e).to_response_with_context(context))
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Topic routes
        .route("/api/topics", get(list_topics).post(add_topic))
        .route("/api/topics/:topic", delete(delete_topic))
        // Quiz routes
        .route("/api/topic-explanation", post(topic_explanation))
        .route("/api/question", post(generate_question))
        .route("/api/submit", post(submit_answer))
        .route("/api/chat", post(chat))
        .with_state(state)
}

//! Content transformation endpoints. Each one formats a deterministic prompt
//! from the request fields and forwards it to the generative model, returning
//! the model's text unmodified — except simplify, which also attaches a
//! readability score computed over the generated text.

use crate::error::AppError;
use crate::gemini::JobState;
use crate::prompts;
use crate::readability;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

fn default_reading_level() -> u32 {
    8
}

fn default_disability_type() -> String {
    "general".to_string()
}

fn default_aid_type() -> String {
    "flashcards".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

#[derive(Debug, Deserialize)]
pub struct SimplifyRequest {
    pub content: String,
    #[serde(default = "default_reading_level")]
    pub reading_level: u32,
    #[serde(default = "default_disability_type")]
    pub disability_type: String,
}

#[derive(Debug, Deserialize)]
pub struct StudyAidsRequest {
    pub content: String,
    #[serde(default = "default_aid_type")]
    pub aid_type: String,
}

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub content: String,
    #[serde(default = "default_language")]
    pub target_language: String,
}

#[derive(Debug, Deserialize)]
pub struct TutorChatRequest {
    pub question: String,
    pub context: Option<String>,
}

/// `POST /api/v1/simplify-content`
pub async fn simplify_content(
    state: web::Data<AppState>,
    body: web::Json<SimplifyRequest>,
) -> Result<HttpResponse, AppError> {
    let prompt = prompts::simplify(&body.content, &body.disability_type, body.reading_level);
    let simplified_text = state.gemini.generate(&prompt).await?;
    let reading_score = readability::round2(readability::score(&simplified_text));

    Ok(HttpResponse::Ok().json(json!({
        "simplified_text": simplified_text,
        "reading_score": reading_score
    })))
}

/// `POST /api/v1/generate-study-aids`
pub async fn generate_study_aids(
    state: web::Data<AppState>,
    body: web::Json<StudyAidsRequest>,
) -> Result<HttpResponse, AppError> {
    let (prompt, resolved_type) = prompts::study_aid(&body.content, &body.aid_type);
    let content = state.gemini.generate(&prompt).await?;

    Ok(HttpResponse::Ok().json(json!({
        "type": resolved_type,
        "content": content
    })))
}

/// `POST /api/v1/translate-content`
pub async fn translate_content(
    state: web::Data<AppState>,
    body: web::Json<TranslateRequest>,
) -> Result<HttpResponse, AppError> {
    let prompt = prompts::translate(&body.content, &body.target_language);
    let translated_text = state.gemini.generate(&prompt).await?;

    Ok(HttpResponse::Ok().json(translate_response(translated_text, &body.target_language)))
}

/// Response body for the translate endpoint: the text plus the resolved
/// language code and display name, so clients can label the result without
/// carrying their own language table.
fn translate_response(translated_text: String, requested_language: &str) -> serde_json::Value {
    let (code, name) = prompts::resolve_language(requested_language);
    json!({
        "translated_text": translated_text,
        "target_language": code,
        "language_name": name
    })
}

/// `POST /api/v1/describe-image` — multipart upload with an `image` field.
///
/// The image goes to the model service's file store and is referenced from
/// the generation request, then deleted best-effort once the description is
/// back.
pub async fn describe_image(
    state: web::Data<AppState>,
    mut payload: actix_multipart::Multipart,
) -> Result<HttpResponse, AppError> {
    use actix_multipart::Field;
    use futures_util::stream::StreamExt;

    let mut image_bytes: Option<Vec<u8>> = None;
    let mut content_type: Option<String> = None;

    while let Some(item) = payload.next().await {
        let mut field: Field =
            item.map_err(|e| AppError::Validation(format!("Multipart error: {}", e)))?;

        let field_name = field
            .content_disposition()
            .and_then(|cd| cd.get_name())
            .ok_or_else(|| AppError::Validation("Missing field name".to_string()))?
            .to_string();

        if field_name == "image" {
            content_type = field.content_type().map(|m| m.to_string());

            let mut bytes = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk =
                    chunk.map_err(|e| AppError::Validation(format!("Chunk error: {}", e)))?;
                bytes.extend_from_slice(&chunk);
            }
            image_bytes = Some(bytes);
        }
    }

    let bytes =
        image_bytes.ok_or_else(|| AppError::Validation("No image file provided".to_string()))?;
    let content_type = content_type.unwrap_or_default();
    if !content_type.starts_with("image/") {
        return Err(AppError::Validation(format!(
            "File must be an image, got content type '{}'",
            content_type
        )));
    }

    let file = state.gemini.upload_bytes(bytes, &content_type).await?;

    // Images are usually ready on upload; give slow ones the same bounded
    // poll budget the video pipeline uses.
    let config = &state.config.gemini;
    let mut job_state = file.state;
    let mut attempts = 0;
    while job_state == JobState::Processing && attempts < config.poll_max_attempts {
        tokio::time::sleep(Duration::from_secs(config.poll_interval_secs)).await;
        attempts += 1;
        job_state = state.gemini.file_state(&file.name).await?;
    }

    let result = if job_state == JobState::Ready {
        state
            .gemini
            .generate_with_file(prompts::describe_image(), &file)
            .await
    } else {
        Err(AppError::Upstream(
            "Image processing did not complete".to_string(),
        ))
    };
    state.gemini.delete_file(&file.name).await;
    let description = result?;

    Ok(HttpResponse::Ok().json(json!({
        "description": description
    })))
}

/// `POST /api/v1/tutor-chat`
pub async fn tutor_chat(
    state: web::Data<AppState>,
    body: web::Json<TutorChatRequest>,
) -> Result<HttpResponse, AppError> {
    let prompt = prompts::tutor_chat(&body.question, body.context.as_deref());
    let reply = state.gemini.generate(&prompt).await?;

    Ok(HttpResponse::Ok().json(json!({
        "reply": reply
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simplify_request_defaults() {
        let request: SimplifyRequest =
            serde_json::from_str(r#"{"content": "some text"}"#).unwrap();
        assert_eq!(request.reading_level, 8);
        assert_eq!(request.disability_type, "general");
    }

    #[test]
    fn test_study_aids_request_defaults() {
        let request: StudyAidsRequest =
            serde_json::from_str(r#"{"content": "some text"}"#).unwrap();
        assert_eq!(request.aid_type, "flashcards");
    }

    #[test]
    fn test_translate_request_defaults() {
        let request: TranslateRequest =
            serde_json::from_str(r#"{"content": "some text"}"#).unwrap();
        assert_eq!(request.target_language, "en");
    }

    #[test]
    fn test_translate_response_carries_code_and_name() {
        let body = translate_response("hola".to_string(), "es");
        assert_eq!(body["translated_text"], "hola");
        assert_eq!(body["target_language"], "es");
        assert_eq!(body["language_name"], "Spanish");
    }

    #[test]
    fn test_translate_response_fallback_is_labelled_english() {
        let body = translate_response("text".to_string(), "xx");
        assert_eq!(body["target_language"], "en");
        assert_eq!(body["language_name"], "English");
    }

    #[test]
    fn test_tutor_chat_context_is_optional() {
        let request: TutorChatRequest =
            serde_json::from_str(r#"{"question": "what is gravity?"}"#).unwrap();
        assert!(request.context.is_none());
    }
}

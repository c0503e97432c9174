pub mod transform;
pub mod video;

use actix_web::HttpResponse;
use serde_json::json;

/// Service banner at the API root.
pub async fn root() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "message": "StudyBridge API" }))
}

//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::{ErrorBody, RequestError};
use crate::web::auth::{LoginRequest, LoginResponse};
use crate::web::middleware::AuthenticatedUser;
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::Json,
    Extension,
};
use question_paper_core::{DownloadLink, GenerationRequest, TopicSelection};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::login_handler,
        list_subjects_handler,
        list_topics_handler,
        generate_paper_handler,
        download_paper_handler,
    ),
    components(
        schemas(
            LoginRequest,
            LoginResponse,
            SubjectResponse,
            TopicResponse,
            TopicSelectionBody,
            GeneratePaperRequest,
            PaperLinkResponse,
            ErrorBody
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Question Paper Generator API", description = "API endpoints for generating custom question papers.")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubjectResponse {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TopicResponse {
    pub id: String,
    pub name: String,
    pub subject_id: String,
}

#[derive(Deserialize)]
pub struct TopicsQuery {
    pub subject: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TopicSelectionBody {
    pub topic_id: String,
    /// Must be greater than zero.
    pub question_count: u32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "title": "Mathematics Midterm Exam",
    "subject": "mathematics",
    "topics": [
        {"topic_id": "algebra", "question_count": 5},
        {"topic_id": "geometry", "question_count": 3},
        {"topic_id": "calculus", "question_count": 2}
    ],
    "duration_minutes": 120
}))]
pub struct GeneratePaperRequest {
    pub title: String,
    pub subject: String,
    pub topics: Vec<TopicSelectionBody>,
    /// Must be greater than zero.
    pub duration_minutes: u32,
}

/// Returned by both generation and download: where to fetch the paper and for how long.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaperLinkResponse {
    pub paper_id: Uuid,
    pub title: String,
    pub download_url: String,
    pub expires_in: u64,
}

impl PaperLinkResponse {
    fn new(paper_id: Uuid, title: String, link: DownloadLink) -> Self {
        Self {
            paper_id,
            title,
            download_url: link.url,
            expires_in: link.expires_in.as_secs(),
        }
    }
}

impl GeneratePaperRequest {
    /// Checks the request and converts it into the core representation.
    pub fn validate(self) -> Result<GenerationRequest, RequestError> {
        check_segment("subject", &self.subject)?;
        if self.duration_minutes == 0 {
            return Err(RequestError::Validation(
                "duration_minutes must be greater than 0".to_string(),
            ));
        }
        if self.topics.is_empty() {
            return Err(RequestError::Validation(
                "at least one topic must be selected".to_string(),
            ));
        }

        let topics = self
            .topics
            .into_iter()
            .map(|t| {
                check_segment("topic_id", &t.topic_id)?;
                if t.question_count == 0 {
                    return Err(RequestError::Validation(format!(
                        "question_count for topic '{}' must be greater than 0",
                        t.topic_id
                    )));
                }
                Ok(TopicSelection {
                    topic_id: t.topic_id,
                    question_count: t.question_count,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(GenerationRequest {
            title: self.title,
            subject: self.subject,
            topics,
            duration_minutes: self.duration_minutes,
        })
    }
}

/// Subject and topic ids become storage path segments.
fn check_segment(field: &str, value: &str) -> Result<(), RequestError> {
    if value.is_empty() || value.contains('/') {
        return Err(RequestError::Validation(format!(
            "{field} must be a non-empty name without '/'"
        )));
    }
    Ok(())
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List all available subjects.
#[utoipa::path(
    get,
    path = "/subjects",
    responses(
        (status = 200, description = "Subjects in the question bank", body = Vec<SubjectResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn list_subjects_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SubjectResponse>>, RequestError> {
    let subjects = state.catalogue.list_subjects().await?;

    Ok(Json(
        subjects
            .into_iter()
            .map(|s| SubjectResponse {
                id: s.id,
                name: s.name,
            })
            .collect(),
    ))
}

/// List all topics for a given subject.
#[utoipa::path(
    get,
    path = "/topics",
    params(
        ("subject" = String, Query, description = "The subject id.")
    ),
    responses(
        (status = 200, description = "Topics of the subject", body = Vec<TopicResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn list_topics_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TopicsQuery>,
) -> Result<Json<Vec<TopicResponse>>, RequestError> {
    let topics = state.catalogue.list_topics(&query.subject).await?;

    Ok(Json(
        topics
            .into_iter()
            .map(|t| TopicResponse {
                id: t.id,
                name: t.name,
                subject_id: t.subject_id,
            })
            .collect(),
    ))
}

/// Generate a custom question paper from the selected topics.
///
/// The paper is always owned by the caller.
#[utoipa::path(
    post,
    path = "/generate",
    request_body = GeneratePaperRequest,
    responses(
        (status = 200, description = "Paper generated", body = PaperLinkResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 422, description = "Invalid request", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn generate_paper_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(body): Json<GeneratePaperRequest>,
) -> Result<Json<PaperLinkResponse>, RequestError> {
    let request = body.validate()?;

    let generated = state
        .assembler
        .generate(request, &user.user_id)
        .await
        .map_err(|e| RequestError::Internal(e.to_string()))?;

    Ok(Json(PaperLinkResponse::new(
        generated.paper.id,
        generated.paper.title,
        generated.link,
    )))
}

/// Get a fresh download link for a previously generated paper.
#[utoipa::path(
    get,
    path = "/download/{paper_id}",
    params(
        ("paper_id" = String, Path, description = "The id returned by /generate.")
    ),
    responses(
        (status = 200, description = "Download link issued", body = PaperLinkResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "The paper belongs to another user", body = ErrorBody),
        (status = 404, description = "Paper not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn download_paper_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(paper_id): Path<String>,
) -> Result<Json<PaperLinkResponse>, RequestError> {
    let paper_id = Uuid::parse_str(&paper_id).map_err(|_| RequestError::NotFound)?;

    let (paper, link) = state.library.download(paper_id, &user.user_id).await?;

    Ok(Json(PaperLinkResponse::new(paper.id, paper.title, link)))
}

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tracing::{debug, warn};
use uuid::Uuid;

use forge5e_core::backstory::{BackstoryError, BackstoryInput, BackstoryResult, generate_backstory};
use forge5e_core::export::{
    CharacterExport, character_filename, character_markdown, progression_filename,
    progression_markdown,
};
use forge5e_core::generation::{GenerationError, ImageGenerator, TextGenerator};
use forge5e_core::portrait::{portrait_filename, portrait_prompt};
use forge5e_core::roll::{AbilitySet, roll_ability_set};
use forge5e_core::rules::RulesProvider;
use forge5e_core::{
    CharacterDraft, ForgeError, GenerateInput, LookupError, ProgressionInput, ProgressionPlan,
    derive_character, plan_progression,
};
use forge5e_db::models::{DEFAULT_PAGE_LIMIT, LibrarySummary, ListQuery, NewCharacter, Page};
use forge5e_db::queries::{characters, progressions};

use crate::config::ForgeConfig;
use crate::ollama::OllamaTextGenerator;
use crate::portrait_client::{HttpImageGenerator, ImageParams};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn bad_gateway(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, msg)
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, msg)
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, format!("{err:#}"))
    }
}

impl From<ForgeError> for AppError {
    fn from(err: ForgeError) -> Self {
        let status = match &err {
            ForgeError::Validation(_) => StatusCode::BAD_REQUEST,
            ForgeError::Lookup(LookupError::NotFound(_)) => StatusCode::NOT_FOUND,
            ForgeError::Lookup(LookupError::Provider { .. }) => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, err.to_string())
    }
}

impl From<BackstoryError> for AppError {
    fn from(err: BackstoryError) -> Self {
        Self::bad_gateway(err.to_string())
    }
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        Self::bad_gateway(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Shared handler state. Generators are optional; their routes answer 503
/// when unset.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub rules: Arc<dyn RulesProvider>,
    pub text: Option<Arc<dyn TextGenerator>>,
    pub image: Option<Arc<dyn ImageGenerator>>,
}

impl AppState {
    pub fn from_config(
        pool: PgPool,
        rules: Arc<dyn RulesProvider>,
        config: &ForgeConfig,
    ) -> Result<Self> {
        let text: Option<Arc<dyn TextGenerator>> = match &config.inference.llm_url {
            Some(url) => Some(Arc::new(OllamaTextGenerator::new(
                url,
                &config.inference.llm_model,
            )?)),
            None => None,
        };
        let image: Option<Arc<dyn ImageGenerator>> = match &config.inference.portrait_url {
            Some(url) => Some(Arc::new(HttpImageGenerator::new(url, ImageParams::default())?)),
            None => None,
        };
        Ok(Self {
            pool,
            rules,
            text,
            image,
        })
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RollParams {
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    limit: Option<i64>,
    page: Option<i64>,
    search: Option<String>,
    sort: Option<String>,
}

impl ListParams {
    fn query(self) -> ListQuery {
        ListQuery::new(
            self.page.unwrap_or(1),
            self.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
            self.search,
            self.sort.as_deref(),
        )
    }
}

/// A draft plus optional attachments, as sent by export and portrait calls.
#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    draft: CharacterDraft,
    #[serde(default)]
    backstory: Option<BackstoryResult>,
    #[serde(default)]
    progression: Option<ProgressionPlan>,
    #[serde(default)]
    custom_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LibrarySaveRequest {
    draft: CharacterDraft,
    #[serde(default)]
    backstory: Option<BackstoryResult>,
    #[serde(default)]
    progression: Option<ProgressionPlan>,
    /// PNG, base64 without a data-URL prefix.
    #[serde(default)]
    portrait_base64: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProgressionSaveRequest {
    plan: ProgressionPlan,
    #[serde(default)]
    prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProgressionExportRequest {
    plan: ProgressionPlan,
    #[serde(default)]
    draft: Option<CharacterDraft>,
}

#[derive(Debug, Serialize)]
pub struct LibraryEntryResponse {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub draft: CharacterDraft,
    pub backstory: Option<BackstoryResult>,
    pub progression: Option<ProgressionPlan>,
    pub portrait_base64: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProgressionEntryResponse {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub plan: ProgressionPlan,
    pub prompt: Option<String>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/roll/abilities", get(roll_abilities))
        .route("/api/generate", post(generate))
        .route("/api/progression/generate", post(progression_generate))
        .route("/api/progression/export/md", post(progression_export_md))
        .route("/api/progression/save", post(progression_save))
        .route("/api/progression/list", get(progression_list))
        .route("/api/progression/get/{id}", get(progression_get))
        .route("/api/progression/delete/{id}", delete(progression_delete))
        .route("/api/backstory", post(backstory))
        .route("/api/portrait", post(portrait))
        .route("/api/export/json", post(export_json))
        .route("/api/export/md", post(export_md))
        .route("/api/library/save", post(library_save))
        .route("/api/library/list", get(library_list))
        .route("/api/library/get/{id}", get(library_get))
        .route("/api/library/delete/{id}", delete(library_delete))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("forge5e serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("forge5e serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

fn attachment(content_type: &'static str, filename: &str, body: impl IntoResponse) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

fn ok() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

// ---------------------------------------------------------------------------
// Handlers: rules engine
// ---------------------------------------------------------------------------

async fn health() -> Json<serde_json::Value> {
    ok()
}

async fn roll_abilities(Query(params): Query<RollParams>) -> Json<AbilitySet> {
    Json(roll_ability_set(params.seed))
}

async fn generate(
    State(state): State<AppState>,
    Json(input): Json<GenerateInput>,
) -> Result<Json<CharacterDraft>, AppError> {
    debug!(class = %input.class_index, race = %input.race_index, level = input.level, "generate");
    let draft = derive_character(state.rules.as_ref(), &input).await?;
    Ok(Json(draft))
}

async fn progression_generate(
    State(state): State<AppState>,
    Json(input): Json<ProgressionInput>,
) -> Result<Json<ProgressionPlan>, AppError> {
    debug!(class = %input.class_index, target = input.target_level, "progression generate");
    let plan = plan_progression(state.rules.as_ref(), &input).await?;
    Ok(Json(plan))
}

async fn progression_export_md(Json(req): Json<ProgressionExportRequest>) -> Response {
    let md = progression_markdown(&req.plan, req.draft.as_ref());
    attachment("text/markdown", &progression_filename(&req.plan, "md"), md)
}

// ---------------------------------------------------------------------------
// Handlers: generation
// ---------------------------------------------------------------------------

async fn backstory(
    State(state): State<AppState>,
    Json(input): Json<BackstoryInput>,
) -> Result<Json<BackstoryResult>, AppError> {
    let generator = state
        .text
        .as_deref()
        .ok_or_else(|| AppError::unavailable("no text generator configured"))?;
    let result = generate_backstory(generator, &input).await?;
    Ok(Json(result))
}

async fn portrait(
    State(state): State<AppState>,
    Json(req): Json<ExportRequest>,
) -> Result<Response, AppError> {
    let generator = state
        .image
        .as_deref()
        .ok_or_else(|| AppError::unavailable("no image generator configured"))?;
    let prompt = portrait_prompt(&req.draft, req.backstory.as_ref(), req.custom_prompt.as_deref());
    debug!(backend = generator.name(), prompt_len = prompt.len(), "generating portrait");
    let png = generator.generate(&prompt).await?;
    Ok(attachment("image/png", &portrait_filename(&req.draft), png))
}

// ---------------------------------------------------------------------------
// Handlers: exports
// ---------------------------------------------------------------------------

async fn export_json(Json(req): Json<ExportRequest>) -> Response {
    let filename = character_filename(&req.draft, "json");
    let bundle = CharacterExport {
        draft: req.draft,
        backstory: req.backstory,
        progression: req.progression,
    };
    attachment("application/json", &filename, Json(bundle))
}

async fn export_md(Json(req): Json<ExportRequest>) -> Response {
    let md = character_markdown(&req.draft, req.backstory.as_ref(), req.progression.as_ref());
    attachment("text/markdown", &character_filename(&req.draft, "md"), md)
}

// ---------------------------------------------------------------------------
// Handlers: character library
// ---------------------------------------------------------------------------

async fn library_save(
    State(state): State<AppState>,
    Json(req): Json<LibrarySaveRequest>,
) -> Result<Json<LibrarySummary>, AppError> {
    let name = req.draft.display_name();
    let portrait = req
        .portrait_base64
        .as_deref()
        .and_then(|b64| match BASE64.decode(b64.trim()) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(error = %e, "dropping undecodable portrait");
                None
            }
        });

    let saved = characters::insert_character(
        &state.pool,
        &NewCharacter {
            name: &name,
            draft: &req.draft,
            backstory: req.backstory.as_ref(),
            progression: req.progression.as_ref(),
            portrait_png: portrait.as_deref(),
        },
    )
    .await
    .map_err(AppError::internal)?;
    Ok(Json(saved))
}

async fn library_list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<LibrarySummary>>, AppError> {
    let page = characters::list_characters(&state.pool, &params.query())
        .await
        .map_err(AppError::internal)?;
    Ok(Json(page))
}

async fn library_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LibraryEntryResponse>, AppError> {
    let record = characters::get_character(&state.pool, id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found("Not found"))?;

    Ok(Json(LibraryEntryResponse {
        id: record.id,
        name: record.name,
        created_at: record.created_at,
        draft: record.draft.0,
        backstory: record.backstory.map(|b| b.0),
        progression: record.progression.map(|p| p.0),
        portrait_base64: record.portrait_png.map(|png| BASE64.encode(png)),
    }))
}

async fn library_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let deleted = characters::delete_character(&state.pool, id)
        .await
        .map_err(AppError::internal)?;
    if !deleted {
        return Err(AppError::not_found("Not found"));
    }
    Ok(ok())
}

// ---------------------------------------------------------------------------
// Handlers: progression library
// ---------------------------------------------------------------------------

async fn progression_save(
    State(state): State<AppState>,
    Json(req): Json<ProgressionSaveRequest>,
) -> Result<Json<LibrarySummary>, AppError> {
    let saved = progressions::insert_progression(
        &state.pool,
        req.plan.display_name(),
        &req.plan,
        req.prompt.as_deref(),
    )
    .await
    .map_err(AppError::internal)?;
    Ok(Json(saved))
}

async fn progression_list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<LibrarySummary>>, AppError> {
    let page = progressions::list_progressions(&state.pool, &params.query())
        .await
        .map_err(AppError::internal)?;
    Ok(Json(page))
}

async fn progression_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProgressionEntryResponse>, AppError> {
    let record = progressions::get_progression(&state.pool, id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found("Not found"))?;

    Ok(Json(ProgressionEntryResponse {
        id: record.id,
        name: record.name,
        created_at: record.created_at,
        plan: record.plan.0,
        prompt: record.prompt,
    }))
}

async fn progression_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let deleted = progressions::delete_progression(&state.pool, id)
        .await
        .map_err(AppError::internal)?;
    if !deleted {
        return Err(AppError::not_found("Not found"));
    }
    Ok(ok())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

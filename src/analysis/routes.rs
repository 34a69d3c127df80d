use std::sync::OnceLock;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use anyhow::anyhow;
use regex::Regex;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    db::models::{AnalysisDetail, AnalysisSummary},
    error::ApiError,
    log_debug,
    validation::{parse_json_body, FieldRule, Schema},
    AppState,
};

use super::{csv::content_disposition, service::CreateAnalysisInput};

const ENABLE_LOGS: bool = true;

const NOT_FOUND_MESSAGE: &str = "分析結果が見つかりません";
const ENGLISH_ONLY_MESSAGE: &str = "本文は英語とスペースのみで入力してください";

fn english_only() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z\s]*$").unwrap())
}

/// Rules for `POST /api/analyses`.
pub fn create_schema(config: &AppConfig) -> Schema {
    Schema::new(vec![
        FieldRule::new("title", "タイトル").max_length(config.title_max_length),
        FieldRule::new("text", "本文")
            .required()
            .max_length(config.text_max_length)
            .pattern(english_only().clone(), ENGLISH_ONLY_MESSAGE),
    ])
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/analyses", get(list_analyses).post(create_analysis))
        .route("/analyses/:id", get(get_analysis))
        .route("/analyses/:id/csv", get(export_analysis_csv))
}

/// Malformed ids cannot match a record, so they are reported as not found.
fn parse_analysis_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(NOT_FOUND_MESSAGE.into()))
}

async fn list_analyses(
    State(state): State<AppState>,
) -> Result<Json<Vec<AnalysisSummary>>, ApiError> {
    Ok(Json(state.analyses.list().await?))
}

async fn create_analysis(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut fields = state
        .analysis_schema
        .validate(&parse_json_body(&body))
        .map_err(ApiError::Validation)?;
    let input = CreateAnalysisInput {
        title: fields.take_optional("title"),
        text: fields.take("text"),
    };

    let id = state.analyses.analyze(input).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn get_analysis(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AnalysisDetail>, ApiError> {
    let id = parse_analysis_id(&id)?;
    state
        .analyses
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND_MESSAGE.into()))
}

async fn export_analysis_csv(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_analysis_id(&id)?;
    let export = state
        .analyses
        .export_csv(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND_MESSAGE.into()))?;
    log_debug!("Exporting analysis {id} as {}", export.filename);

    let disposition = HeaderValue::from_str(&content_disposition(&export.filename))
        .map_err(|err| anyhow!("invalid Content-Disposition header: {err}"))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    headers.insert(CONTENT_DISPOSITION, disposition);

    Ok((headers, export.body).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_schema_rules() {
        let schema = create_schema(&AppConfig::default());

        assert!(schema
            .validate(&json!({ "text": "Hello world\nagain" }))
            .is_ok());
        assert_eq!(
            schema.validate(&json!({ "title": "t" })).unwrap_err(),
            "本文は必須です"
        );
        assert_eq!(
            schema.validate(&json!({ "text": "don't" })).unwrap_err(),
            ENGLISH_ONLY_MESSAGE
        );
        assert_eq!(
            schema
                .validate(&json!({ "title": "x".repeat(31), "text": "ok" }))
                .unwrap_err(),
            "タイトルは30文字以内で入力してください"
        );
        assert_eq!(
            schema
                .validate(&json!({ "text": "a".repeat(10_001) }))
                .unwrap_err(),
            "本文は10000文字以内で入力してください"
        );
    }

    #[test]
    fn test_malformed_id_is_not_found() {
        assert!(matches!(
            parse_analysis_id("42"),
            Err(ApiError::NotFound(_))
        ));
        let id = Uuid::new_v4();
        assert_eq!(parse_analysis_id(&id.to_string()).unwrap(), id);
    }
}

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crate::{
    db::models::NoteInput,
    error::ApiError,
    validation::{parse_json_body, FieldRule, Schema},
    AppState,
};

const NOT_FOUND_MESSAGE: &str = "ノートが見つかりません";
const INVALID_ID_MESSAGE: &str = "IDは正の整数で指定してください";

pub const TITLE_MAX_LENGTH: usize = 30;
pub const CONTENT_MAX_LENGTH: usize = 200;

/// Rules shared by note creation and update.
pub fn note_schema() -> Schema {
    Schema::new(vec![
        FieldRule::new("title", "タイトル")
            .required()
            .max_length(TITLE_MAX_LENGTH),
        FieldRule::new("content", "内容")
            .required()
            .max_length(CONTENT_MAX_LENGTH),
    ])
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notes", get(list_notes).post(create_note))
        .route(
            "/notes/:id",
            get(get_note).put(update_note).delete(delete_note),
        )
}

fn parse_note_id(raw: &str) -> Result<i64, ApiError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::BadRequest(INVALID_ID_MESSAGE.into())),
    }
}

fn parse_note_input(state: &AppState, body: &[u8]) -> Result<NoteInput, ApiError> {
    let mut fields = state
        .note_schema
        .validate(&parse_json_body(body))
        .map_err(ApiError::Validation)?;
    Ok(NoteInput {
        title: fields.take("title"),
        content: fields.take("content"),
    })
}

async fn list_notes(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let notes = state.db.list_notes().await?;
    Ok(Json(json!({ "notes": notes })))
}

async fn create_note(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let input = parse_note_input(&state, &body)?;
    let note = state.db.create_note(input).await?;
    Ok((StatusCode::CREATED, Json(json!({ "note": note }))))
}

async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_note_id(&id)?;
    match state.db.get_note(id).await? {
        Some(note) => Ok(Json(json!({ "note": note }))),
        None => Err(ApiError::NotFound(NOT_FOUND_MESSAGE.into())),
    }
}

async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let id = parse_note_id(&id)?;
    let input = parse_note_input(&state, &body)?;
    match state.db.update_note(id, input).await? {
        Some(note) => Ok(Json(json!({ "note": note }))),
        None => Err(ApiError::NotFound(NOT_FOUND_MESSAGE.into())),
    }
}

async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_note_id(&id)?;
    if state.db.delete_note(id).await? {
        Ok(Json(json!({ "success": true })))
    } else {
        Err(ApiError::NotFound(NOT_FOUND_MESSAGE.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_note_id() {
        assert_eq!(parse_note_id("7").unwrap(), 7);
        for raw in ["0", "-3", "abc", "1.5", ""] {
            assert!(matches!(parse_note_id(raw), Err(ApiError::BadRequest(_))));
        }
    }

    #[test]
    fn test_note_schema_messages() {
        let schema = note_schema();
        assert_eq!(
            schema.validate(&json!({ "content": "x" })).unwrap_err(),
            "タイトルは必須です"
        );
        assert_eq!(
            schema
                .validate(&json!({ "title": "t", "content": "x".repeat(201) }))
                .unwrap_err(),
            "内容は200文字以内で入力してください"
        );
        assert!(schema
            .validate(&json!({ "title": "t", "content": "Any text, 123!" }))
            .is_ok());
    }
}

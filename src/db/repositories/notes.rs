use anyhow::{anyhow, Result};
use chrono::Utc;
use rusqlite::{params, Connection, Row};

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_datetime},
    models::{Note, NoteInput},
};

fn row_to_note(row: &Row) -> Result<Note> {
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(Note {
        id: row.get("id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

fn select_note(conn: &Connection, note_id: i64) -> Result<Option<Note>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, content, created_at, updated_at
         FROM notes
         WHERE id = ?1",
    )?;
    let mut rows = stmt.query(params![note_id])?;
    match rows.next()? {
        Some(row) => Ok(Some(row_to_note(row)?)),
        None => Ok(None),
    }
}

impl Database {
    /// All notes in creation order
    pub async fn list_notes(&self) -> Result<Vec<Note>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, content, created_at, updated_at
                 FROM notes
                 ORDER BY id ASC",
            )?;

            let mut rows = stmt.query([])?;
            let mut notes = Vec::new();
            while let Some(row) = rows.next()? {
                notes.push(row_to_note(row)?);
            }

            Ok(notes)
        })
        .await
    }

    pub async fn get_note(&self, note_id: i64) -> Result<Option<Note>> {
        self.execute(move |conn| select_note(conn, note_id)).await
    }

    /// Create a note; title and content are stored trimmed
    pub async fn create_note(&self, input: NoteInput) -> Result<Note> {
        self.execute(move |conn| {
            let now = format_datetime(&Utc::now());

            conn.execute(
                "INSERT INTO notes (title, content, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![input.title.trim(), input.content.trim(), now, now],
            )?;

            let note_id = conn.last_insert_rowid();
            select_note(conn, note_id)?.ok_or_else(|| anyhow!("Note not found after insert"))
        })
        .await
    }

    /// Replace a note's title and content. Returns `None` if the note does not exist.
    pub async fn update_note(&self, note_id: i64, input: NoteInput) -> Result<Option<Note>> {
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE notes
                 SET title = ?1, content = ?2, updated_at = ?3
                 WHERE id = ?4",
                params![
                    input.title.trim(),
                    input.content.trim(),
                    format_datetime(&Utc::now()),
                    note_id,
                ],
            )?;

            if rows_affected == 0 {
                return Ok(None);
            }

            select_note(conn, note_id)
        })
        .await
    }

    /// Returns `false` if there was no such note.
    pub async fn delete_note(&self, note_id: i64) -> Result<bool> {
        self.execute(move |conn| {
            let rows_affected = conn.execute("DELETE FROM notes WHERE id = ?1", params![note_id])?;
            Ok(rows_affected > 0)
        })
        .await
    }
}

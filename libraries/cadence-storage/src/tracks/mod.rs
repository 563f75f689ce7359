use cadence_core::{error::Result, types::*, CadenceError};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

const TRACK_COLUMNS: &str = "id, file_path, title, artist, duration_minutes, created_at, updated_at";

pub(crate) fn track_from_row(row: &SqliteRow) -> Track {
    Track {
        id: row.get("id"),
        file_path: row.get("file_path"),
        title: row.get("title"),
        artist: row.get("artist"),
        duration_minutes: row.get("duration_minutes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Get all tracks
pub async fn get_all(pool: &SqlitePool) -> Result<Vec<Track>> {
    let rows = sqlx::query(&format!("SELECT {TRACK_COLUMNS} FROM tracks ORDER BY id"))
        .fetch_all(pool)
        .await?;

    Ok(rows.iter().map(track_from_row).collect())
}

/// Get track by ID
pub async fn get_by_id(pool: &SqlitePool, id: TrackId) -> Result<Option<Track>> {
    let row = sqlx::query(&format!("SELECT {TRACK_COLUMNS} FROM tracks WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(track_from_row))
}

/// Search tracks by title or artist
///
/// Substring match; SQLite `LIKE` is case-insensitive for ASCII.
pub async fn search(pool: &SqlitePool, query: &str) -> Result<Vec<Track>> {
    let pattern = format!("%{}%", escape_like(query.trim()));

    let rows = sqlx::query(&format!(
        r#"
        SELECT {TRACK_COLUMNS}
        FROM tracks
        WHERE title LIKE ?1 ESCAPE '\' OR artist LIKE ?1 ESCAPE '\'
        ORDER BY id
        "#
    ))
    .bind(pattern)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(track_from_row).collect())
}

/// Create new track
pub async fn create(pool: &SqlitePool, track: CreateTrack) -> Result<Track> {
    track.validate()?;

    let result = sqlx::query(
        r#"
        INSERT INTO tracks (file_path, title, artist, duration_minutes)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&track.file_path)
    .bind(&track.title)
    .bind(&track.artist)
    .bind(track.duration_minutes)
    .execute(pool)
    .await?;

    let id = TrackId::new(result.last_insert_rowid());

    get_by_id(pool, id)
        .await?
        .ok_or_else(|| CadenceError::storage("Failed to retrieve created track"))
}

/// Replace a track's fields
pub async fn update(pool: &SqlitePool, id: TrackId, track: UpdateTrack) -> Result<Track> {
    track.validate()?;

    let result = sqlx::query(
        r#"
        UPDATE tracks
        SET file_path = ?, title = ?, artist = ?, duration_minutes = ?,
            updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(&track.file_path)
    .bind(&track.title)
    .bind(&track.artist)
    .bind(track.duration_minutes)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CadenceError::TrackNotFound(id));
    }

    // Deleted between the write and the read
    get_by_id(pool, id)
        .await?
        .ok_or(CadenceError::TrackNotFound(id))
}

/// Delete a track
///
/// Playlist memberships go with it (`ON DELETE CASCADE`).
pub async fn delete(pool: &SqlitePool, id: TrackId) -> Result<()> {
    let result = sqlx::query("DELETE FROM tracks WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(CadenceError::TrackNotFound(id));
    }

    Ok(())
}

fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("100%_done\\"), "100\\%\\_done\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}

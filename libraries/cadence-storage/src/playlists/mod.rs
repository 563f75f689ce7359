use crate::{error::StorageError, tracks::track_from_row};
use cadence_core::{error::Result, types::*, CadenceError};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

fn playlist_from_row(row: &SqliteRow) -> Playlist {
    Playlist {
        id: row.get("id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        tracks: None,
    }
}

/// Get all playlists
pub async fn get_all(pool: &SqlitePool) -> Result<Vec<Playlist>> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, created_at, updated_at
        FROM playlists
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(playlist_from_row).collect())
}

/// Get playlist by ID
pub async fn get_by_id(pool: &SqlitePool, id: PlaylistId) -> Result<Option<Playlist>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, created_at, updated_at
        FROM playlists
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(playlist_from_row))
}

/// Member tracks in playlist order, or `None` if the playlist does not exist
pub async fn get_tracks(pool: &SqlitePool, id: PlaylistId) -> Result<Option<Vec<Track>>> {
    if get_by_id(pool, id).await?.is_none() {
        return Ok(None);
    }

    let rows = sqlx::query(
        r#"
        SELECT t.id, t.file_path, t.title, t.artist, t.duration_minutes,
               t.created_at, t.updated_at
        FROM playlist_tracks pt
        INNER JOIN tracks t ON pt.track_id = t.id
        WHERE pt.playlist_id = ?
        ORDER BY pt.position, pt.added_at
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(Some(rows.iter().map(track_from_row).collect()))
}

/// Get playlist with all tracks
pub async fn get_with_tracks(pool: &SqlitePool, id: PlaylistId) -> Result<Option<Playlist>> {
    let Some(mut playlist) = get_by_id(pool, id).await? else {
        return Ok(None);
    };

    // Deleted between the two reads
    playlist.tracks = Some(get_tracks(pool, id).await?.unwrap_or_default());

    Ok(Some(playlist))
}

/// Create new playlist
pub async fn create(pool: &SqlitePool, playlist: CreatePlaylist) -> Result<Playlist> {
    playlist.validate()?;

    let result = sqlx::query("INSERT INTO playlists (name) VALUES (?)")
        .bind(playlist.name.trim())
        .execute(pool)
        .await?;

    let id = PlaylistId::new(result.last_insert_rowid());

    get_by_id(pool, id)
        .await?
        .ok_or_else(|| CadenceError::storage("Failed to retrieve created playlist"))
}

/// Rename a playlist
pub async fn rename(pool: &SqlitePool, id: PlaylistId, name: &str) -> Result<Playlist> {
    validate_playlist_name(name)?;

    let result = sqlx::query(
        "UPDATE playlists SET name = ?, updated_at = datetime('now') WHERE id = ?",
    )
    .bind(name.trim())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CadenceError::PlaylistNotFound(id));
    }

    get_by_id(pool, id)
        .await?
        .ok_or(CadenceError::PlaylistNotFound(id))
}

/// Add track to the end of a playlist
///
/// Re-adding an existing member keeps its original position.
pub async fn add_track(pool: &SqlitePool, playlist_id: PlaylistId, track_id: TrackId) -> Result<()> {
    let mut tx = pool.begin().await?;

    let playlist_exists = sqlx::query("SELECT 1 FROM playlists WHERE id = ?")
        .bind(playlist_id)
        .fetch_optional(&mut *tx)
        .await?
        .is_some();
    if !playlist_exists {
        return Err(CadenceError::PlaylistNotFound(playlist_id));
    }

    let track_exists = sqlx::query("SELECT 1 FROM tracks WHERE id = ?")
        .bind(track_id)
        .fetch_optional(&mut *tx)
        .await?
        .is_some();
    if !track_exists {
        return Err(CadenceError::TrackNotFound(track_id));
    }

    let next_position: i64 = sqlx::query(
        "SELECT COALESCE(MAX(position), -1) + 1 AS next_pos FROM playlist_tracks WHERE playlist_id = ?",
    )
    .bind(playlist_id)
    .fetch_one(&mut *tx)
    .await?
    .get("next_pos");

    let inserted = sqlx::query(
        r#"
        INSERT INTO playlist_tracks (playlist_id, track_id, position)
        VALUES (?, ?, ?)
        ON CONFLICT(playlist_id, track_id) DO NOTHING
        "#,
    )
    .bind(playlist_id)
    .bind(track_id)
    .bind(next_position)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if inserted > 0 {
        sqlx::query("UPDATE playlists SET updated_at = datetime('now') WHERE id = ?")
            .bind(playlist_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(())
}

/// Remove track from playlist
pub async fn remove_track(
    pool: &SqlitePool,
    playlist_id: PlaylistId,
    track_id: TrackId,
) -> Result<()> {
    let mut tx = pool.begin().await?;

    let position: Option<i64> = sqlx::query(
        "SELECT position FROM playlist_tracks WHERE playlist_id = ? AND track_id = ?",
    )
    .bind(playlist_id)
    .bind(track_id)
    .fetch_optional(&mut *tx)
    .await?
    .map(|row| row.get("position"));

    let Some(position) = position else {
        let playlist_exists = sqlx::query("SELECT 1 FROM playlists WHERE id = ?")
            .bind(playlist_id)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if !playlist_exists {
            return Err(CadenceError::PlaylistNotFound(playlist_id));
        }
        return Err(StorageError::not_found(
            "Playlist track",
            format!("{playlist_id}/{track_id}"),
        )
        .into());
    };

    sqlx::query("DELETE FROM playlist_tracks WHERE playlist_id = ? AND track_id = ?")
        .bind(playlist_id)
        .bind(track_id)
        .execute(&mut *tx)
        .await?;

    // Close the gap so positions stay dense
    sqlx::query(
        "UPDATE playlist_tracks SET position = position - 1 WHERE playlist_id = ? AND position > ?",
    )
    .bind(playlist_id)
    .bind(position)
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE playlists SET updated_at = datetime('now') WHERE id = ?")
        .bind(playlist_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}

/// Delete a playlist
pub async fn delete(pool: &SqlitePool, id: PlaylistId) -> Result<()> {
    let result = sqlx::query("DELETE FROM playlists WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(CadenceError::PlaylistNotFound(id));
    }

    Ok(())
}

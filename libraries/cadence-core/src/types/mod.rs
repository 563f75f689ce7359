mod ids;
mod playlist;
mod track;

pub use ids::{PlaylistId, TrackId};
pub use playlist::{validate_playlist_name, CreatePlaylist, Playlist};
pub use track::{
    duration_to_minutes, has_mp3_extension, trim_locator, CreateTrack, Track, TrackForm,
    UpdateTrack,
};

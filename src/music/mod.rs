//! Client side of the external music streaming service (playlists and track metadata).

mod error;
mod offline;
mod spotify;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use error::{MusicError, MusicResult};
pub use offline::OfflineMusicClient;
pub use spotify::{SpotifyClient, SpotifyConfig};

/// Playlist created on the music service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistHandle {
    pub id: String,
    pub external_url: String,
}

/// Metadata of a single track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub name: String,
    pub artists: Vec<String>,
}

impl TrackInfo {
    /// Display name shown in surveys and results, `"{track} - {artist}, {artist}"`.
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.name, self.artists.join(", "))
    }
}

/// Operations the round engine needs from the music service.
///
/// `acting_user` identifies the participant on whose behalf the call is made; the
/// service may use it to pick credentials or only for auditing.
pub trait MusicClient: Send + Sync {
    fn create_playlist(
        &self,
        name: String,
        description: String,
        acting_user: Uuid,
    ) -> BoxFuture<'static, MusicResult<PlaylistHandle>>;

    /// Append tracks in the given order.
    fn add_tracks(
        &self,
        playlist_id: String,
        track_uris: Vec<String>,
        acting_user: Uuid,
    ) -> BoxFuture<'static, MusicResult<()>>;

    fn lookup_track(
        &self,
        track_id: String,
        acting_user: Uuid,
    ) -> BoxFuture<'static, MusicResult<TrackInfo>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_joins_artists() {
        let track = TrackInfo {
            name: "Heroes".into(),
            artists: vec!["David Bowie".into(), "Brian Eno".into()],
        };
        assert_eq!(track.display_name(), "Heroes - David Bowie, Brian Eno");
    }
}

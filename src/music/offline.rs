use futures::future::BoxFuture;
use tracing::info;
use uuid::Uuid;

use super::{MusicClient, MusicResult, PlaylistHandle, TrackInfo};

/// Stand-in used when no music service credentials are configured.
///
/// Playlists get synthetic identifiers and track lookups echo the track id, so the
/// round engine stays usable on a developer machine.
#[derive(Debug, Clone, Default)]
pub struct OfflineMusicClient;

impl MusicClient for OfflineMusicClient {
    fn create_playlist(
        &self,
        name: String,
        _description: String,
        acting_user: Uuid,
    ) -> BoxFuture<'static, MusicResult<PlaylistHandle>> {
        Box::pin(async move {
            let id = Uuid::new_v4().simple().to_string();
            info!(playlist_id = %id, name = %name, acting_user = %acting_user, "offline playlist created");
            Ok(PlaylistHandle {
                external_url: format!("offline://playlist/{id}"),
                id,
            })
        })
    }

    fn add_tracks(
        &self,
        playlist_id: String,
        track_uris: Vec<String>,
        _acting_user: Uuid,
    ) -> BoxFuture<'static, MusicResult<()>> {
        Box::pin(async move {
            info!(playlist_id = %playlist_id, count = track_uris.len(), "offline tracks added");
            Ok(())
        })
    }

    fn lookup_track(
        &self,
        track_id: String,
        _acting_user: Uuid,
    ) -> BoxFuture<'static, MusicResult<TrackInfo>> {
        Box::pin(async move {
            Ok(TrackInfo {
                name: track_id,
                artists: vec!["Unknown artist".to_owned()],
            })
        })
    }
}

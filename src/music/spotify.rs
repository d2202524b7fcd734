use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;
use uuid::Uuid;

use super::{
    MusicClient, PlaylistHandle, TrackInfo,
    error::{MusicError, MusicResult},
};

const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";
/// Maximum number of tracks accepted by a single add request.
const TRACKS_PER_REQUEST: usize = 100;

/// Runtime configuration of the Spotify Web API client.
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub api_base: String,
    pub access_token: String,
    /// Account owning every playlist created by the service.
    pub user_id: String,
    pub public_playlists: bool,
}

impl SpotifyConfig {
    /// Build a configuration from `SPOTIFY_ACCESS_TOKEN`, `SPOTIFY_USER_ID` and the
    /// optional `SPOTIFY_API_BASE`.
    pub fn from_env() -> MusicResult<Self> {
        let access_token = std::env::var("SPOTIFY_ACCESS_TOKEN").map_err(|_| {
            MusicError::Credentials("missing environment variable `SPOTIFY_ACCESS_TOKEN`".into())
        })?;
        let user_id = std::env::var("SPOTIFY_USER_ID").map_err(|_| {
            MusicError::Credentials("missing environment variable `SPOTIFY_USER_ID`".into())
        })?;
        let api_base = std::env::var("SPOTIFY_API_BASE")
            .ok()
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_owned());

        Ok(Self {
            api_base,
            access_token,
            user_id,
            public_playlists: true,
        })
    }

    pub fn with_public_playlists(mut self, public: bool) -> Self {
        self.public_playlists = public;
        self
    }
}

/// [`MusicClient`] backed by the Spotify Web API.
#[derive(Clone)]
pub struct SpotifyClient {
    client: Client,
    api_base: Arc<str>,
    access_token: Arc<str>,
    user_id: Arc<str>,
    public_playlists: bool,
}

#[derive(Serialize)]
struct CreatePlaylistBody<'a> {
    name: &'a str,
    description: &'a str,
    public: bool,
}

#[derive(Deserialize)]
struct PlaylistResponse {
    id: String,
    external_urls: ExternalUrls,
}

#[derive(Deserialize)]
struct ExternalUrls {
    spotify: String,
}

#[derive(Serialize)]
struct AddTracksBody<'a> {
    uris: &'a [String],
}

#[derive(Deserialize)]
struct TrackResponse {
    name: String,
    artists: Vec<ArtistResponse>,
}

#[derive(Deserialize)]
struct ArtistResponse {
    name: String,
}

impl SpotifyClient {
    pub fn new(config: SpotifyConfig) -> MusicResult<Self> {
        let client = Client::builder().build().map_err(|source| MusicError::Request {
            path: config.api_base.clone(),
            source,
        })?;

        Ok(Self {
            client,
            api_base: Arc::from(config.api_base.trim_end_matches('/')),
            access_token: Arc::from(config.access_token),
            user_id: Arc::from(config.user_id),
            public_playlists: config.public_playlists,
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.api_base, path);
        self.client
            .request(method, url)
            .bearer_auth(self.access_token.as_ref())
    }

    async fn send_json<B, T>(&self, method: Method, path: String, body: Option<&B>) -> MusicResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut builder = self.request(method, &path);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|source| MusicError::Request {
            path: path.clone(),
            source,
        })?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(MusicError::Credentials(
                format!("access token rejected for `{path}`"),
            )),
            status if status.is_success() => response
                .json::<T>()
                .await
                .map_err(|source| MusicError::Decode { path, source }),
            status => Err(MusicError::Status { path, status }),
        }
    }

    async fn create_playlist(&self, name: String, description: String) -> MusicResult<PlaylistHandle> {
        let path = format!("users/{}/playlists", self.user_id);
        let body = CreatePlaylistBody {
            name: &name,
            description: &description,
            public: self.public_playlists,
        };
        let playlist: PlaylistResponse = self.send_json(Method::POST, path, Some(&body)).await?;
        debug!(playlist_id = %playlist.id, name = %name, "created playlist");

        Ok(PlaylistHandle {
            id: playlist.id,
            external_url: playlist.external_urls.spotify,
        })
    }

    async fn add_tracks(&self, playlist_id: String, track_uris: Vec<String>) -> MusicResult<()> {
        let path = format!("playlists/{playlist_id}/tracks");
        for chunk in track_uris.chunks(TRACKS_PER_REQUEST) {
            let _: serde_json::Value = self
                .send_json(Method::POST, path.clone(), Some(&AddTracksBody { uris: chunk }))
                .await?;
        }
        debug!(playlist_id = %playlist_id, count = track_uris.len(), "added tracks");
        Ok(())
    }

    async fn lookup_track(&self, track_id: String) -> MusicResult<TrackInfo> {
        let track: TrackResponse = self
            .send_json::<(), _>(Method::GET, format!("tracks/{track_id}"), None)
            .await?;

        Ok(TrackInfo {
            name: track.name,
            artists: track.artists.into_iter().map(|artist| artist.name).collect(),
        })
    }
}

impl MusicClient for SpotifyClient {
    fn create_playlist(
        &self,
        name: String,
        description: String,
        acting_user: Uuid,
    ) -> BoxFuture<'static, MusicResult<PlaylistHandle>> {
        let client = self.clone();
        Box::pin(async move {
            debug!(acting_user = %acting_user, "creating playlist");
            client.create_playlist(name, description).await
        })
    }

    fn add_tracks(
        &self,
        playlist_id: String,
        track_uris: Vec<String>,
        acting_user: Uuid,
    ) -> BoxFuture<'static, MusicResult<()>> {
        let client = self.clone();
        Box::pin(async move {
            debug!(acting_user = %acting_user, "adding tracks");
            client.add_tracks(playlist_id, track_uris).await
        })
    }

    fn lookup_track(
        &self,
        track_id: String,
        _acting_user: Uuid,
    ) -> BoxFuture<'static, MusicResult<TrackInfo>> {
        let client = self.clone();
        Box::pin(async move { client.lookup_track(track_id).await })
    }
}

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::error::{Result, JellysubError};
use super::{ItemDto, ItemsResponse, MediaItem, MediaServer, SubtitleStreamDescriptor, SubtitleUpload, UserDto};

const TOKEN_HEADER: &str = "X-MediaBrowser-Token";

/// Jellyfin REST client scoped to one user's library view
#[derive(Debug, Clone)]
pub struct JellyfinClient {
    client: Client,
    base_url: String,
    user_id: String,
}

impl JellyfinClient {
    /// Build a client and resolve the configured user name to its id.
    pub async fn connect(config: &ServerConfig) -> Result<Self> {
        let client = build_http_client(&config.api_token)?;
        let base_url = config.base_url.trim_end_matches('/').to_string();

        let users: Vec<UserDto> = checked(client.get(format!("{}/Users", base_url)).send().await?)
            .await?
            .json()
            .await?;

        let user = users
            .into_iter()
            .find(|u| u.name == config.user_name)
            .ok_or_else(|| {
                JellysubError::Config(format!("User '{}' not found on media server", config.user_name))
            })?;

        info!("Connected to {} as {} ({})", base_url, user.name, user.id);

        Ok(Self {
            client,
            base_url,
            user_id: user.id,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

fn build_http_client(api_token: &str) -> Result<Client> {
    let token = HeaderValue::from_str(api_token)
        .map_err(|e| JellysubError::Config(format!("Invalid API token: {}", e)))?;
    let mut headers = HeaderMap::new();
    headers.insert(TOKEN_HEADER, token);

    Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(120))
        .build()
        .map_err(|e| JellysubError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Turn a non-success status into a server error carrying the body text.
async fn checked(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(JellysubError::Server {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl MediaServer for JellyfinClient {
    async fn list_children(&self, folder_id: Option<&str>) -> Result<Vec<MediaItem>> {
        let mut query = vec![("Fields", "Path,HasSubtitles")];
        if let Some(id) = folder_id {
            query.push(("ParentId", id));
        }

        debug!("Listing children of {}", folder_id.unwrap_or("<root>"));

        let response = self
            .client
            .get(self.url(&format!("Users/{}/Items", self.user_id)))
            .query(&query)
            .send()
            .await?;
        let listing: ItemsResponse = checked(response).await?.json().await?;

        Ok(listing.items.into_iter().map(MediaItem::from).collect())
    }

    async fn item_detail(&self, item_id: &str) -> Result<MediaItem> {
        let response = self
            .client
            .get(self.url(&format!("Users/{}/Items/{}", self.user_id, item_id)))
            .query(&[("Fields", "MediaStreams")])
            .send()
            .await?;
        let item: ItemDto = checked(response).await?.json().await?;

        Ok(item.into())
    }

    async fn fetch_subtitle(&self, item_id: &str, stream: &SubtitleStreamDescriptor) -> Result<String> {
        let codec = stream
            .subtitle_codec()
            .ok_or_else(|| JellysubError::UnsupportedFormat(stream.codec.clone()))?;

        let path = format!(
            "Videos/{id}/{id}/Subtitles/{}/Stream.{}",
            stream.index,
            codec.extension(),
            id = item_id
        );
        let bytes = checked(self.client.get(self.url(&path)).send().await?)
            .await?
            .bytes()
            .await?;

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn upload_subtitle(&self, item_id: &str, upload: &SubtitleUpload) -> Result<()> {
        let response = self
            .client
            .post(self.url(&format!("Videos/{}/Subtitles", item_id)))
            .json(upload)
            .send()
            .await?;
        checked(response).await?;
        Ok(())
    }
}

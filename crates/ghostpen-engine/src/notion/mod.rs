//! Minimal Notion REST client: read one page as Markdown, create a draft
//! page in a database.

pub mod markdown;

use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use ghostpen_store::PostRecord;

pub use self::markdown::{blocks_to_markdown, extract_page_id, markdown_to_blocks};

const DEFAULT_BASE_URL: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";
const PAGE_SIZE: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum NotionError {
    #[error("Notion API timeout ({0:?})")]
    Timeout(Duration),

    #[error("Notion request failed: {0}")]
    Http(String),

    #[error("Notion API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected Notion response: {0}")]
    Malformed(String),
}

/// A page read back from Notion.
#[derive(Clone, Debug, PartialEq)]
pub struct NotionPage {
    pub id: String,
    pub title: String,
    pub markdown: String,
    pub blocks_count: usize,
}

/// Where drafts are mirrored: a client plus the target database.
#[derive(Clone, Debug)]
pub struct NotionTarget {
    pub client: NotionClient,
    pub database_id: String,
}

#[derive(Clone)]
pub struct NotionClient {
    client: Client,
    token: SecretString,
    base_url: String,
    timeout: Duration,
}

impl std::fmt::Debug for NotionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotionClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl NotionClient {
    pub fn new(token: SecretString, timeout: Duration) -> Result<Self, NotionError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotionError::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            token,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(self.token.expose_secret())
            .header("Notion-Version", NOTION_VERSION)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, NotionError> {
        let resp = request.send().await.map_err(|e| {
            if e.is_timeout() {
                NotionError::Timeout(self.timeout)
            } else {
                NotionError::Http(e.to_string())
            }
        })?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .map_err(|e| NotionError::Malformed(e.to_string()))?;
        if !status.is_success() {
            return Err(NotionError::Api {
                status: status.as_u16(),
                message: body["message"].as_str().unwrap_or("unknown error").to_string(),
            });
        }
        Ok(body)
    }

    async fn list_children(
        &self,
        block_id: &str,
        cursor: Option<&str>,
    ) -> Result<(Vec<Value>, Option<String>), NotionError> {
        let mut query = vec![("page_size", PAGE_SIZE.to_string())];
        if let Some(cursor) = cursor {
            query.push(("start_cursor", cursor.to_string()));
        }
        let body = self
            .send(
                self.request(reqwest::Method::GET, &format!("/blocks/{block_id}/children"))
                    .query(&query),
            )
            .await?;

        let results = body["results"]
            .as_array()
            .cloned()
            .ok_or_else(|| NotionError::Malformed("missing results".into()))?;
        let next = if body["has_more"] == true {
            body["next_cursor"].as_str().map(str::to_string)
        } else {
            None
        };
        Ok((results, next))
    }

    /// Title plus all top-level blocks, with one level of children inlined.
    #[instrument(skip(self))]
    pub async fn read_page(&self, page_id: &str) -> Result<NotionPage, NotionError> {
        let page = self
            .send(self.request(reqwest::Method::GET, &format!("/pages/{page_id}")))
            .await?;
        let title = page_title(&page).unwrap_or_else(|| "Untitled".to_string());

        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let (batch, next) = self.list_children(page_id, cursor.as_deref()).await?;
            blocks.extend(batch);
            match next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        for block in &mut blocks {
            let kind = block["type"].as_str().unwrap_or_default().to_string();
            let wants_children = block["has_children"] == true
                && !kind.is_empty()
                && kind != "child_page"
                && kind != "child_database";
            let Some(id) = block["id"].as_str().map(str::to_string) else {
                continue;
            };
            if !wants_children {
                continue;
            }
            match self.list_children(&id, None).await {
                Ok((children, _)) => {
                    if let Some(data) = block.get_mut(&kind).and_then(Value::as_object_mut) {
                        data.insert("children".into(), Value::Array(children));
                    }
                }
                Err(e) => warn!(block = %id, error = %e, "skipping children of block"),
            }
        }

        debug!(blocks = blocks.len(), "notion page read");
        Ok(NotionPage {
            id: page_id.to_string(),
            title,
            markdown: blocks_to_markdown(&blocks),
            blocks_count: blocks.len(),
        })
    }

    /// Create a `Draft` page for `post` and return its URL.
    #[instrument(skip(self, post), fields(platform = %post.platform))]
    pub async fn create_page(&self, database_id: &str, post: &PostRecord) -> Result<String, NotionError> {
        let blocks = markdown_to_blocks(&post.content);
        let mut batches = blocks.chunks(PAGE_SIZE);
        let first: Vec<Value> = batches.next().map(<[Value]>::to_vec).unwrap_or_default();

        let body = json!({
            "parent": {"database_id": database_id},
            "properties": {
                "Title": {"title": [{"text": {"content": post.title}}]},
                "Platform": {"select": {"name": post.platform}},
                "Topic": {"rich_text": [{"text": {"content": post.topic}}]},
                "Status": {"select": {"name": "Draft"}},
                "Created": {"date": {"start": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)}},
                "Profile": {"rich_text": [{"text": {"content": post.profile_used}}]},
            },
            "children": first,
        });
        let page = self
            .send(self.request(reqwest::Method::POST, "/pages").json(&body))
            .await?;

        let page_id = page["id"]
            .as_str()
            .ok_or_else(|| NotionError::Malformed("created page has no id".into()))?
            .to_string();
        for batch in batches {
            self.send(
                self.request(reqwest::Method::PATCH, &format!("/blocks/{page_id}/children"))
                    .json(&json!({"children": batch})),
            )
            .await?;
        }

        Ok(page["url"].as_str().unwrap_or_default().to_string())
    }
}

fn page_title(page: &Value) -> Option<String> {
    page["properties"]
        .as_object()?
        .values()
        .find(|prop| prop["type"] == "title")
        .and_then(|prop| prop["title"].as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p["plain_text"].as_str())
                .collect::<String>()
        })
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = "0123456789abcdef0123456789abcdef";

    fn client(server: &MockServer) -> NotionClient {
        NotionClient::new(SecretString::from("secret_test".to_string()), Duration::from_secs(5))
            .unwrap()
            .with_base_url(server.uri())
    }

    fn post(content: &str) -> PostRecord {
        PostRecord {
            content: content.into(),
            platform: "linkedin".into(),
            topic: "remote work".into(),
            title: "Remote work".into(),
            profile_used: "default".into(),
        }
    }

    fn para(text: &str) -> Value {
        json!({"id": format!("b-{text}"), "type": "paragraph", "has_children": false,
               "paragraph": {"rich_text": [{"plain_text": text}]}})
    }

    #[tokio::test]
    async fn read_page_paginates_and_fetches_children() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/pages/{PAGE}")))
            .and(header("Notion-Version", NOTION_VERSION))
            .and(header("authorization", "Bearer secret_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "properties": {"Name": {"type": "title", "title": [{"plain_text": "Ideas"}]}}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/blocks/{PAGE}/children")))
            .and(query_param("start_cursor", "c2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [para("second")], "has_more": false, "next_cursor": null
            })))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/blocks/{PAGE}/children")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    para("first"),
                    {"id": "toggle1", "type": "bulleted_list_item", "has_children": true,
                     "bulleted_list_item": {"rich_text": [{"plain_text": "parent"}]}}
                ],
                "has_more": true, "next_cursor": "c2"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/blocks/toggle1/children"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [para("nested")], "has_more": false
            })))
            .mount(&server)
            .await;

        let page = client(&server).read_page(PAGE).await.unwrap();
        assert_eq!(page.title, "Ideas");
        assert_eq!(page.blocks_count, 3);
        assert_eq!(page.markdown, "first\n\n- parent\n  nested\n\nsecond");
    }

    #[tokio::test]
    async fn create_page_sends_properties_and_batches_children() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pages"))
            .and(body_partial_json(json!({
                "parent": {"database_id": "db1"},
                "properties": {
                    "Platform": {"select": {"name": "linkedin"}},
                    "Status": {"select": {"name": "Draft"}},
                    "Profile": {"rich_text": [{"text": {"content": "default"}}]}
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "newpage", "url": "https://notion.so/newpage"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/blocks/newpage/children"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .expect(1)
            .mount(&server)
            .await;

        let content = (0..150).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let url = client(&server).create_page("db1", &post(&content)).await.unwrap();
        assert_eq!(url, "https://notion.so/newpage");
    }

    #[tokio::test]
    async fn api_errors_carry_the_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pages"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "object": "error", "message": "database not shared"
            })))
            .mount(&server)
            .await;

        let err = client(&server).create_page("db1", &post("hi")).await.unwrap_err();
        match err {
            NotionError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "database not shared");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_responses_time_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = NotionClient::new(SecretString::from("t".to_string()), Duration::from_millis(50))
            .unwrap()
            .with_base_url(server.uri());
        assert!(matches!(
            client.read_page(PAGE).await.unwrap_err(),
            NotionError::Timeout(_)
        ));
    }
}

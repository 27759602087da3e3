//! Authenticated HTTP pipeline shared by every Interiora service client.
//!
//! Each call carries the stored access token. An expired token surfaces as a
//! 401, which triggers one refresh and one retry; see [`ApiClient::send`].

use std::sync::{Arc, Mutex};

use interiora_auth::{AuthClient, TokenStore};
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::routes::{Destination, Navigator};

/// A file attached to a multipart request.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FilePart {
    pub fn new(file_name: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    /// Read a file from disk, keeping its base name.
    pub async fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| Error::config(format!("cannot read {}: {}", path.display(), e)))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(&file_name, bytes))
    }
}

/// Multipart body kept as plain data so a retry can rebuild it.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    fields: Vec<(String, String)>,
    files: Vec<(String, FilePart)>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.push((name.to_string(), value.into()));
        self
    }

    pub fn file(mut self, name: &str, file: FilePart) -> Self {
        self.files.push((name.to_string(), file));
        self
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn files(&self) -> &[(String, FilePart)] {
        &self.files
    }

    fn to_form(&self) -> Result<Form> {
        let mut form = Form::new();
        for (name, value) in &self.fields {
            form = form.text(name.clone(), value.clone());
        }
        for (name, file) in &self.files {
            let mut part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
            if let Some(content_type) = &file.content_type {
                part = part.mime_str(content_type)?;
            }
            form = form.part(name.clone(), part);
        }
        Ok(form)
    }
}

#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(MultipartForm),
}

/// Method, query, headers and body of one call.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    method: Method,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: RequestBody,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            query: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    pub fn patch() -> Self {
        Self::new(Method::PATCH)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Add a JSON body to the request
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }
}

struct LoadingState {
    in_flight: Mutex<usize>,
    tx: watch::Sender<bool>,
}

/// Counts in-flight calls.
///
/// The flag stays up until the last concurrent call finishes, so one call
/// completing never clears it under a sibling that is still running.
#[derive(Clone)]
pub struct LoadingTracker {
    state: Arc<LoadingState>,
}

impl Default for LoadingTracker {
    fn default() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            state: Arc::new(LoadingState {
                in_flight: Mutex::new(0),
                tx,
            }),
        }
    }
}

impl LoadingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> LoadingGuard {
        self.adjust(true);
        LoadingGuard {
            tracker: self.clone(),
        }
    }

    pub fn in_flight(&self) -> usize {
        *self
            .state
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight() > 0
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.tx.subscribe()
    }

    fn adjust(&self, starting: bool) {
        let mut count = self
            .state
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if starting {
            *count += 1;
        } else {
            *count = count.saturating_sub(1);
        }
        let loading = *count > 0;
        self.state.tx.send_if_modified(|current| {
            let changed = *current != loading;
            *current = loading;
            changed
        });
    }
}

/// Held for the duration of one call.
pub struct LoadingGuard {
    tracker: LoadingTracker,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.tracker.adjust(false);
    }
}

/// Request client that attaches the session and recovers from expired tokens.
#[derive(Clone)]
pub struct ApiClient {
    base_url: Url,
    http_client: Client,
    auth: Arc<AuthClient>,
    navigator: Arc<dyn Navigator>,
    loading: LoadingTracker,
}

impl ApiClient {
    pub fn new(
        api_url: &Url,
        http_client: Client,
        auth: Arc<AuthClient>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let mut base_url = api_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            base_url,
            http_client,
            auth,
            navigator,
            loading: LoadingTracker::new(),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn auth(&self) -> &Arc<AuthClient> {
        &self.auth
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        self.auth.store()
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    pub fn loading(&self) -> &LoadingTracker {
        &self.loading
    }

    pub fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Send a request with the current access token.
    ///
    /// A 401 triggers exactly one refresh. If it succeeds the request is sent
    /// once more with the new token and that response is returned whatever
    /// its status. If it fails the session is cleared, the navigator is sent
    /// to the login page and [`Error::SessionExpired`] is returned. Every
    /// other outcome comes back as a plain response.
    pub async fn send(&self, path: &str, options: RequestOptions) -> Result<Response> {
        let _loading = self.loading.begin();

        let token = self.store().access_token();
        let response = self.dispatch(path, &options, token.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!(path, "401 received, refreshing access token");
        match self.auth.refresh().await {
            Ok(new_token) => {
                let retried = self.dispatch(path, &options, Some(&new_token)).await?;
                if retried.status() == StatusCode::UNAUTHORIZED {
                    warn!(path, "still unauthorized after refresh");
                }
                Ok(retried)
            }
            Err(e) => {
                warn!(path, error = %e, "token refresh failed, clearing session");
                self.auth.logout();
                self.navigator.navigate(Destination::Login);
                Err(Error::SessionExpired(e))
            }
        }
    }

    async fn dispatch(
        &self,
        path: &str,
        options: &RequestOptions,
        token: Option<&str>,
    ) -> Result<Response> {
        let url = self.url(path)?;
        debug!(method = %options.method, %url, "dispatch");

        let mut request = self.http_client.request(options.method.clone(), url);
        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        request = match &options.body {
            RequestBody::Empty => request.header(CONTENT_TYPE, "application/json"),
            RequestBody::Json(body) => request
                .header(CONTENT_TYPE, "application/json")
                .body(serde_json::to_vec(body)?),
            // reqwest sets the multipart boundary itself
            RequestBody::Multipart(form) => request.multipart(form.to_form()?),
        };

        Ok(request.send().await?)
    }

    /// Send and decode a JSON answer, turning failures into [`Error::Api`].
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T> {
        let response = self.send(path, options).await?;
        let bytes = Self::ensure_success(response).await?.bytes().await?;
        if bytes.is_empty() {
            return Ok(serde_json::from_str("null")?);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Send and only check the status.
    pub async fn send_empty(&self, path: &str, options: RequestOptions) -> Result<()> {
        let response = self.send(path, options).await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn ensure_success(response: Response) -> Result<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(Error::from_response_body(status, &body))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json(path, RequestOptions::get()).await
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.send_json(path, RequestOptions::post().json(body)?).await
    }

    pub async fn put_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.send_json(path, RequestOptions::put().json(body)?).await
    }

    pub async fn patch_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.send_json(path, RequestOptions::patch().json(body)?).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send_empty(path, RequestOptions::delete()).await
    }
}

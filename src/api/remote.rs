//! Purpose: Provide the HTTP client for fetching and saving JSON documents.
//! Exports: `RemoteStore`, `RemoteDoc`.
//! Role: Transport plumbing; speaks plain GET/PUT against the resolved URL.
//! Invariants: Base URLs are bare origins; document names carry the path.
//! Invariants: One fetch or save is one HTTP request; no retries, no caching.
//! Invariants: Non-success responses become tagged errors, never panics.
#![allow(clippy::result_large_err)]

use super::doc::{ApiResult, DocRef};
use crate::core::error::{Error, ErrorKind};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const MAX_SNIPPET_BYTES: usize = 200;

#[derive(Clone, Debug)]
pub struct RemoteStore {
    inner: Arc<RemoteStoreInner>,
}

#[derive(Debug)]
struct RemoteStoreInner {
    base_url: Url,
    agent: ureq::Agent,
    timeout: Option<Duration>,
}

#[derive(Clone, Debug)]
pub struct RemoteDoc {
    store: RemoteStore,
    url: Url,
}

impl RemoteStore {
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        Ok(Self::from_base(base_url))
    }

    /// Build a store rooted at the origin of an absolute document URL. Used
    /// when the caller supplies a full URL instead of a name plus base.
    pub fn for_origin(url: &Url) -> ApiResult<Self> {
        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(
                Error::new(ErrorKind::Usage).with_message("base url must use http or https")
            );
        }
        let mut base_url = url.clone();
        base_url.set_path("/");
        base_url.set_query(None);
        base_url.set_fragment(None);
        Ok(Self::from_base(base_url))
    }

    fn from_base(base_url: Url) -> Self {
        let agent = ureq::AgentBuilder::new().build();
        Self {
            inner: Arc::new(RemoteStoreInner {
                base_url,
                agent,
                timeout: None,
            }),
        }
    }

    /// Bound each request. Without a timeout a stalled endpoint blocks the
    /// calling thread for as long as the transport allows.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.timeout = Some(timeout);
        } else {
            self.inner = Arc::new(RemoteStoreInner {
                base_url: self.inner.base_url.clone(),
                agent: self.inner.agent.clone(),
                timeout: Some(timeout),
            });
        }
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Resolve a document reference to its URL. Performs no I/O.
    pub fn open_doc(&self, doc_ref: &DocRef) -> ApiResult<RemoteDoc> {
        let url = self.resolve_doc_ref(doc_ref)?;
        Ok(RemoteDoc {
            store: self.clone(),
            url,
        })
    }

    fn resolve_doc_ref(&self, doc_ref: &DocRef) -> ApiResult<Url> {
        match doc_ref {
            DocRef::Name(name) => build_doc_url(&self.inner.base_url, name),
            DocRef::Url(url) => Ok(url.clone()),
        }
    }

    fn request_json<T, R>(&self, method: &str, url: &Url, body: &T) -> ApiResult<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self.request_raw(method, url, body)?;
        read_json_response(response)
    }

    fn request_discard<T>(&self, method: &str, url: &Url, body: &T) -> ApiResult<()>
    where
        T: Serialize + ?Sized,
    {
        let response = self.request_raw(method, url, body)?;
        drain_response(response)
    }

    fn request_raw<T>(&self, method: &str, url: &Url, body: &T) -> ApiResult<ureq::Response>
    where
        T: Serialize + ?Sized,
    {
        debug!(%url, method, "remote request");
        let request = self.request(method, url).set("Accept", "application/json");
        let response = if method == "GET" {
            request.call()
        } else {
            let payload = serde_json::to_string(body).map_err(|err| {
                Error::new(ErrorKind::Internal)
                    .with_message("failed to encode request json")
                    .with_source(err)
            })?;
            request
                .set("Content-Type", "application/json")
                .send_string(&payload)
        };

        match response {
            Ok(resp) => {
                debug!(%url, status = resp.status(), "remote response");
                Ok(resp)
            }
            Err(ureq::Error::Status(code, resp)) => {
                warn!(%url, status = code, "remote request rejected");
                Err(error_from_status(code, resp))
            }
            Err(ureq::Error::Transport(err)) => {
                warn!(%url, error = %err, "remote request failed");
                Err(Error::new(ErrorKind::Io)
                    .with_message("request failed")
                    .with_source(err))
            }
        }
    }

    fn request(&self, method: &str, url: &Url) -> ureq::Request {
        let mut request = self.inner.agent.request(method, url.as_str());
        if let Some(timeout) = self.inner.timeout {
            request = request.timeout(timeout);
        }
        request
    }
}

impl RemoteDoc {
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// GET the document and hand back the parsed JSON body.
    pub fn fetch(&self) -> ApiResult<Value> {
        self.fetch_as()
    }

    /// GET the document into a caller-chosen type.
    pub fn fetch_as<R>(&self) -> ApiResult<R>
    where
        R: DeserializeOwned,
    {
        self.store
            .request_json("GET", &self.url, &())
            .map_err(|err| err.with_url(self.url.as_str()))
    }

    /// PUT the document. The response body is drained and discarded; only
    /// the status class matters.
    pub fn save(&self, data: &Value) -> ApiResult<()> {
        self.save_doc(data)
    }

    /// PUT a caller-chosen serializable value as the document.
    pub fn save_doc<T>(&self, data: &T) -> ApiResult<()>
    where
        T: Serialize + ?Sized,
    {
        self.store
            .request_discard("PUT", &self.url, data)
            .map_err(|err| err.with_url(self.url.as_str()))
    }

    /// Fetch the document, apply `apply`, save the result, and return it.
    /// Plain read-modify-write; concurrent writers can still interleave.
    pub fn update(&self, apply: impl FnOnce(&mut Value)) -> ApiResult<Value> {
        let mut doc = self.fetch()?;
        apply(&mut doc);
        self.save(&doc)?;
        Ok(doc)
    }
}

fn normalize_base_url(raw: String) -> ApiResult<Url> {
    let mut url = Url::parse(&raw).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid base url")
            .with_source(err)
    })?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(Error::new(ErrorKind::Usage).with_message("base url must use http or https"));
    }
    if url.path() != "/" && !url.path().is_empty() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("base url must not include a path; put it in the document name"));
    }
    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn build_doc_url(base_url: &Url, name: &str) -> ApiResult<Url> {
    let mut url = base_url.clone();
    {
        let mut path = url.path_segments_mut().map_err(|_| {
            Error::new(ErrorKind::Usage).with_message("base url cannot carry a document path")
        })?;
        path.clear();
        for segment in name.split('/') {
            path.push(segment);
        }
    }
    Ok(url)
}

fn read_json_response<R>(response: ureq::Response) -> ApiResult<R>
where
    R: DeserializeOwned,
{
    let body = response.into_string().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read response body")
            .with_source(err)
    })?;
    serde_json::from_str(&body).map_err(|err| {
        let mut message = String::from("response body is not valid json");
        let snippet = body_snippet(&body);
        if !snippet.is_empty() {
            message.push_str(&format!(" (body starts with {snippet:?})"));
        }
        Error::new(ErrorKind::Decode)
            .with_message(message)
            .with_source(err)
    })
}

fn drain_response(response: ureq::Response) -> ApiResult<()> {
    let mut reader = response.into_reader();
    std::io::copy(&mut reader, &mut std::io::sink()).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read response body")
            .with_source(err)
    })?;
    Ok(())
}

fn error_from_status(status: u16, response: ureq::Response) -> Error {
    let body = response.into_string().unwrap_or_default();
    let snippet = body_snippet(&body);
    let message = if snippet.is_empty() {
        format!("endpoint returned status {status}")
    } else {
        format!("endpoint returned status {status}: {snippet}")
    };
    Error::new(error_kind_from_status(status))
        .with_status(status)
        .with_message(message)
}

/// 5xx and anything unrecognized count as remote-side failures.
fn error_kind_from_status(status: u16) -> ErrorKind {
    match status {
        400 | 405 | 413 | 415 | 422 => ErrorKind::Usage,
        401 | 403 => ErrorKind::Permission,
        404 | 410 => ErrorKind::NotFound,
        408 | 423 | 429 => ErrorKind::Busy,
        _ => ErrorKind::Remote,
    }
}

fn body_snippet(input: &str) -> String {
    let input = input.trim();
    let mut snippet = String::new();
    if input.len() <= MAX_SNIPPET_BYTES {
        snippet.push_str(input);
        return snippet;
    }
    let suffix = "...";
    let mut take = MAX_SNIPPET_BYTES - suffix.len();
    while !input.is_char_boundary(take) {
        take -= 1;
    }
    snippet.push_str(&input[..take]);
    snippet.push_str(suffix);
    snippet
}

#[cfg(test)]
mod tests {
    use super::{RemoteStore, body_snippet, error_kind_from_status, normalize_base_url};
    use crate::api::DocRef;
    use crate::core::error::ErrorKind;

    #[test]
    fn normalize_base_url_keeps_bare_origin() {
        let url = normalize_base_url("http://localhost:8080".to_string()).expect("url");
        assert_eq!(url.as_str(), "http://localhost:8080/");
    }

    #[test]
    fn normalize_base_url_strips_query_and_fragment() {
        let url = normalize_base_url("http://localhost:8080/?x=1#top".to_string()).expect("url");
        assert_eq!(url.as_str(), "http://localhost:8080/");
    }

    #[test]
    fn normalize_base_url_rejects_paths() {
        let err = normalize_base_url("http://localhost:8080/api".to_string()).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn normalize_base_url_rejects_other_schemes() {
        let err = normalize_base_url("file:///tmp/data.json".to_string()).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn open_doc_resolves_names_against_the_base() {
        let store = RemoteStore::new("http://localhost:8080").expect("store");
        let doc_ref = DocRef::name("src/pages/data.json").expect("ref");
        let doc = store.open_doc(&doc_ref).expect("doc");
        assert_eq!(
            doc.url().as_str(),
            "http://localhost:8080/src/pages/data.json"
        );
    }

    #[test]
    fn open_doc_encodes_awkward_segments() {
        let store = RemoteStore::new("http://localhost:8080").expect("store");
        let doc_ref = DocRef::name("my docs/data.json").expect("ref");
        let doc = store.open_doc(&doc_ref).expect("doc");
        assert_eq!(doc.url().as_str(), "http://localhost:8080/my%20docs/data.json");
    }

    #[test]
    fn open_doc_keeps_absolute_urls() {
        let store = RemoteStore::new("http://localhost:8080").expect("store");
        let doc_ref = DocRef::url("https://example.com/other.json").expect("ref");
        let doc = store.open_doc(&doc_ref).expect("doc");
        assert_eq!(doc.url().as_str(), "https://example.com/other.json");
    }

    #[test]
    fn for_origin_strips_down_to_the_origin() {
        let url = url::Url::parse("http://localhost:8080/src/pages/data.json").expect("url");
        let store = RemoteStore::for_origin(&url).expect("store");
        assert_eq!(store.base_url().as_str(), "http://localhost:8080/");
    }

    #[test]
    fn error_kind_from_status_maps_classes() {
        assert_eq!(error_kind_from_status(400), ErrorKind::Usage);
        assert_eq!(error_kind_from_status(405), ErrorKind::Usage);
        assert_eq!(error_kind_from_status(401), ErrorKind::Permission);
        assert_eq!(error_kind_from_status(404), ErrorKind::NotFound);
        assert_eq!(error_kind_from_status(410), ErrorKind::NotFound);
        assert_eq!(error_kind_from_status(429), ErrorKind::Busy);
        assert_eq!(error_kind_from_status(500), ErrorKind::Remote);
        assert_eq!(error_kind_from_status(418), ErrorKind::Remote);
    }

    #[test]
    fn body_snippet_bounds_long_bodies() {
        let long = "x".repeat(5000);
        let snippet = body_snippet(&long);
        assert!(snippet.len() <= super::MAX_SNIPPET_BYTES);
        assert!(snippet.ends_with("..."));
    }

    #[test]
    fn body_snippet_respects_char_boundaries() {
        let long = "é".repeat(500);
        let snippet = body_snippet(&long);
        assert!(snippet.ends_with("..."));
        assert!(snippet.len() <= super::MAX_SNIPPET_BYTES);
    }
}

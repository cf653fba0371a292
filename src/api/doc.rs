//! Purpose: Name the JSON document a client operates on.
//! Exports: `DocRef` and the `ApiResult` alias shared across the API.
//! Role: Stable reference type; mirrors the CLI resolution rules.
//! Invariants: Names are relative slash paths without dot or empty segments.
//! Invariants: URL refs are http/https and carry no query or fragment.
#![allow(clippy::result_large_err)]

use crate::core::error::{Error, ErrorKind};
use url::Url;

pub type ApiResult<T> = Result<T, Error>;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DocRef {
    Name(String),
    Url(Url),
}

impl DocRef {
    /// Classify and validate a raw reference: anything containing `://` is
    /// treated as a URL, everything else as a name relative to a base URL.
    pub fn parse(raw: &str) -> ApiResult<Self> {
        if raw.contains("://") {
            Self::url(raw)
        } else {
            Self::name(raw)
        }
    }

    pub fn name(name: impl Into<String>) -> ApiResult<Self> {
        let name = name.into();
        let name = name.trim_start_matches('/');
        ensure_doc_name(name)?;
        Ok(Self::Name(name.to_string()))
    }

    pub fn url(raw: impl AsRef<str>) -> ApiResult<Self> {
        Ok(Self::Url(parse_doc_url(raw.as_ref())?))
    }

    pub fn describe(&self) -> String {
        match self {
            DocRef::Name(name) => name.clone(),
            DocRef::Url(url) => url.as_str().to_string(),
        }
    }
}

fn ensure_doc_name(name: &str) -> ApiResult<()> {
    if name.is_empty() {
        return Err(Error::new(ErrorKind::Usage).with_message("document name is empty"));
    }
    if name.contains('?') || name.contains('#') {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("document names must not contain a query or fragment"));
    }
    if name.contains('\\') {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("document names use forward slashes between segments"));
    }
    for segment in name.split('/') {
        if segment.is_empty() {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("document names must not contain empty segments"));
        }
        if segment == "." || segment == ".." {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("document names must not contain dot segments"));
        }
    }
    Ok(())
}

fn parse_doc_url(raw: &str) -> ApiResult<Url> {
    let url = Url::parse(raw).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid document url")
            .with_source(err)
    })?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(
            Error::new(ErrorKind::Usage).with_message("document urls must use http or https")
        );
    }
    if url.query().is_some() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("document urls must not carry a query string"));
    }
    if url.fragment().is_some() {
        return Err(
            Error::new(ErrorKind::Usage).with_message("document urls must not carry a fragment")
        );
    }
    Ok(url)
}

//! Key-addressed remote data sources.
//!
//! The engine only builds the request URL; the transport is injected as a [`DataFetcher`] so the
//! crate stays runtime-agnostic.

use crate::{Error, Result};
use futures::future::BoxFuture;
use indexmap::IndexMap;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;

/// Characters `encodeURIComponent` escapes: everything but `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Environment for the page host serving the creative. Unknown hosts are development.
    pub fn from_hostname(hostname: &str) -> Self {
        match hostname.trim().to_ascii_lowercase().as_str() {
            "assets.movableink-templates.com" | "cartridges.movableink-templates.com" => {
                Self::Production
            }
            "assets-staging.movableink-templates.com"
            | "cartridges-staging.movableink-templates.com" => Self::Staging,
            _ => Self::Development,
        }
    }

    /// Origin of the data-source service; empty in development (same-origin requests).
    pub fn service_origin(self) -> &'static str {
        match self {
            Self::Development => "",
            Self::Staging => "https://sorcerer-staging.movableink-templates.com",
            Self::Production => "https://sorcerer.movableink-templates.com",
        }
    }
}

pub trait DataFetcher {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    pub key: String,
    pub environment: Environment,
}

impl DataSource {
    pub fn new(key: impl Into<String>, environment: Environment) -> Self {
        Self {
            key: key.into(),
            environment,
        }
    }

    /// `<origin>/data_sources/<key>?<params>`, params in insertion order with keys and values
    /// percent-encoded as URI components (a space is `%20`).
    pub fn url(&self, params: &IndexMap<String, String>) -> String {
        let query = params
            .iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(k, COMPONENT),
                    utf8_percent_encode(v, COMPONENT)
                )
            })
            .collect::<Vec<_>>()
            .join("&");
        format!(
            "{}/data_sources/{}?{}",
            self.environment.service_origin(),
            self.key,
            query
        )
    }

    pub async fn raw_data<F>(&self, fetcher: &F, params: &IndexMap<String, String>) -> Result<String>
    where
        F: DataFetcher + ?Sized,
    {
        let url = self.url(params);
        tracing::debug!(key = %self.key, %url, "fetching data source");
        fetcher.get(&url).await.map_err(|err| match err {
            Error::Fetch { .. } => err,
            other => Error::Fetch {
                url,
                message: other.to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::RefCell;

    #[derive(Default)]
    struct CannedFetcher {
        requested: RefCell<Vec<String>>,
    }

    impl DataFetcher for CannedFetcher {
        fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String>> {
            self.requested.borrow_mut().push(url.to_string());
            Box::pin(async move { Ok("{\"ok\":true}".to_string()) })
        }
    }

    struct FailingFetcher;

    impl DataFetcher for FailingFetcher {
        fn get<'a>(&'a self, _url: &'a str) -> BoxFuture<'a, Result<String>> {
            Box::pin(async move { Err(Error::fatal("connection refused")) })
        }
    }

    fn params() -> IndexMap<String, String> {
        let mut p = IndexMap::new();
        p.insert("zip".to_string(), "10001".to_string());
        p.insert("city".to_string(), "New York".to_string());
        p
    }

    #[test]
    fn environment_from_hostname() {
        assert_eq!(
            Environment::from_hostname("assets.movableink-templates.com"),
            Environment::Production
        );
        assert_eq!(
            Environment::from_hostname("cartridges-staging.movableink-templates.com"),
            Environment::Staging
        );
        assert_eq!(Environment::from_hostname("localhost"), Environment::Development);
    }

    #[test]
    fn url_encodes_params_in_order() {
        let ds = DataSource::new("weather", Environment::Production);
        assert_eq!(
            ds.url(&params()),
            "https://sorcerer.movableink-templates.com/data_sources/weather?zip=10001&city=New%20York"
        );
        let dev = DataSource::new("weather", Environment::Development);
        assert_eq!(dev.url(&IndexMap::new()), "/data_sources/weather?");
    }

    #[test]
    fn url_leaves_uri_component_marks_alone() {
        let mut p = IndexMap::new();
        p.insert("q".to_string(), "a~b(c)!".to_string());
        p.insert("who's".to_string(), "x*y".to_string());
        p.insert("sum".to_string(), "1+1=2 & more/é".to_string());
        let ds = DataSource::new("w", Environment::Development);
        assert_eq!(
            ds.url(&p),
            "/data_sources/w?q=a~b(c)!&who's=x*y&sum=1%2B1%3D2%20%26%20more%2F%C3%A9"
        );
    }

    #[test]
    fn raw_data_goes_through_fetcher() {
        let fetcher = CannedFetcher::default();
        let ds = DataSource::new("weather", Environment::Staging);
        let body = block_on(ds.raw_data(&fetcher, &params())).unwrap();
        assert_eq!(body, "{\"ok\":true}");
        assert_eq!(
            fetcher.requested.borrow().as_slice(),
            ["https://sorcerer-staging.movableink-templates.com/data_sources/weather?zip=10001&city=New%20York"]
        );
    }

    #[test]
    fn fetch_failures_name_the_url() {
        let ds = DataSource::new("weather", Environment::Development);
        let err = block_on(ds.raw_data(&FailingFetcher, &IndexMap::new())).unwrap_err();
        assert_eq!(
            err.to_string(),
            "data source request failed (/data_sources/weather?): connection refused"
        );
    }
}

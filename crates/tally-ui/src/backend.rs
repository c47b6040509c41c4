//! The opaque handle to the hosted data service: build-time configuration
//! plus the fetch-based transport the task service runs on.

use async_trait::async_trait;
use gloo::net::http;
use tally_core::error::BackendError;
use tally_core::postgrest::{Method, Request};
use tally_core::service::Transport;
use tracing::{debug, warn};

const FALLBACK_URL: &str = "https://your-project.supabase.co";
const FALLBACK_ANON_KEY: &str = "your-anon-key";

/// Service URL and anonymous access key, captured from the build
/// environment once at startup. Missing values fall back to placeholders
/// so the app still renders against an unconfigured backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
}

impl BackendConfig {
    pub fn from_env() -> Self {
        let url = option_env!("TALLY_SUPABASE_URL").unwrap_or(FALLBACK_URL);
        let anon_key = option_env!("TALLY_SUPABASE_ANON_KEY").unwrap_or(FALLBACK_ANON_KEY);

        if url == FALLBACK_URL || anon_key == FALLBACK_ANON_KEY {
            warn!(
                "TALLY_SUPABASE_URL / TALLY_SUPABASE_ANON_KEY were not set at build time; \
                 using placeholder values"
            );
        }

        Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }
}

/// Fetch client for the query API. Every request carries the anonymous
/// key as both `apikey` and bearer token; access control beyond that is
/// the backend's row-level security.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    url: String,
    anon_key: String,
}

impl Backend {
    pub fn new(config: BackendConfig) -> Self {
        debug!(url = %config.url, "configured backend client");
        Self {
            url: config.url,
            anon_key: config.anon_key,
        }
    }

    fn builder(&self, request: &Request) -> http::RequestBuilder {
        let url = format!("{}{}", self.url, request.path);
        let builder = match request.method {
            Method::Get => http::Request::get(&url),
            Method::Post => http::Request::post(&url),
            Method::Patch => http::Request::patch(&url),
            Method::Delete => http::Request::delete(&url),
        };

        let mut builder = builder
            .query(request.query.iter().map(|(key, value)| (*key, value.as_str())))
            .header("apikey", &self.anon_key)
            .header("authorization", &format!("Bearer {}", self.anon_key));

        if request.accept_single {
            builder = builder.header("accept", "application/vnd.pgrst.object+json");
        }
        if let Some(prefer) = request.prefer {
            builder = builder.header("prefer", prefer);
        }

        builder
    }
}

#[async_trait(?Send)]
impl Transport for Backend {
    async fn run(&self, request: Request) -> Result<(u16, String), BackendError> {
        debug!(
            method = request.method.as_str(),
            path = request.path,
            "issuing backend request"
        );

        let builder = self.builder(&request);
        let prepared = match request.body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(body),
            None => builder.build(),
        }
        .map_err(|err| BackendError::Encode(err.to_string()))?;

        let response = prepared
            .send()
            .await
            .map_err(|err| BackendError::Transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| BackendError::Transport(err.to_string()))?;

        debug!(status, "backend request completed");
        Ok((status, body))
    }
}

use super::{MetadataProbe, ProbeError, ProbeResponse};
use futures_util::future::LocalBoxFuture;
use once_cell::sync::Lazy;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
#[cfg(not(target_arch = "wasm32"))]
use crate::diagnostics::ProbeTiming;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

/// `MetadataProbe` backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    #[cfg_attr(target_arch = "wasm32", allow(dead_code))]
    timeout_secs: u32,
}

impl HttpProbe {
    pub fn new(timeout_secs: u32) -> Self {
        Self { timeout_secs }
    }
}

fn header_text(response: &reqwest::Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

impl MetadataProbe for HttpProbe {
    fn probe(&self, url: &str) -> LocalBoxFuture<'static, Result<ProbeResponse, ProbeError>> {
        let url = url.to_string();
        #[cfg(not(target_arch = "wasm32"))]
        let timeout = Duration::from_secs(self.timeout_secs as u64);
        Box::pin(async move {
            #[cfg(not(target_arch = "wasm32"))]
            let timing = ProbeTiming::start(&url, timeout);

            let request = HTTP_CLIENT.head(&url);
            #[cfg(not(target_arch = "wasm32"))]
            let request = request.timeout(timeout);

            let response = match request.send().await {
                Ok(response) => response,
                Err(error) => {
                    #[cfg(not(target_arch = "wasm32"))]
                    timing.finish("transport error");
                    return Err(ProbeError::Transport(error.to_string()));
                }
            };

            #[cfg(not(target_arch = "wasm32"))]
            timing.finish(&format!("HTTP {}", response.status().as_u16()));

            Ok(ProbeResponse {
                status: response.status().as_u16(),
                content_length: header_text(&response, CONTENT_LENGTH),
                content_type: header_text(&response, CONTENT_TYPE),
            })
        })
    }
}

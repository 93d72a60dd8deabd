//! Network side of the metadata lookup: a header-only probe of a media source.

mod http_probe;

pub use http_probe::HttpProbe;

use futures_util::future::LocalBoxFuture;
use thiserror::Error;

/// Headers of interest from a HEAD response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProbeResponse {
    pub status: u16,
    pub content_length: Option<String>,
    pub content_type: Option<String>,
}

impl ProbeResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProbeError {
    #[error("HTTP {0}")]
    Status(u16),
    #[error("{0}")]
    Transport(String),
}

/// Issues one header-only request against a resolved source URI.
pub trait MetadataProbe {
    fn probe(&self, url: &str) -> LocalBoxFuture<'static, Result<ProbeResponse, ProbeError>>;
}

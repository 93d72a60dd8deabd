//! Shared metadata cache for media sources.
//! One record per resolved source URI, plus a registry of in-flight probes so a
//! source is never probed twice at the same time.

use crate::api::{MetadataProbe, ProbeError, ProbeResponse};
use crate::host::Scheduler;
use futures_util::future::{FutureExt, LocalBoxFuture, Shared};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Outcome of probing one source.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataRecord {
    Ready {
        byte_size: Option<u64>,
        content_type: String,
    },
    Failed {
        error_message: String,
    },
}

impl MetadataRecord {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// What the cache knows about a key right now, without doing any I/O.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Unknown,
    Pending,
    Ready {
        byte_size: Option<u64>,
        content_type: String,
    },
    Failed,
}

/// Future shared by every caller waiting on the same source.
pub type PendingMetadata = Shared<LocalBoxFuture<'static, MetadataRecord>>;

struct CacheInner {
    records: RefCell<HashMap<String, MetadataRecord>>,
    pending: RefCell<HashMap<String, PendingMetadata>>,
    probe: Box<dyn MetadataProbe>,
    scheduler: Rc<dyn Scheduler>,
}

/// Cheap-to-clone handle; every clone sees the same maps.
#[derive(Clone)]
pub struct MetadataCache {
    inner: Rc<CacheInner>,
}

impl MetadataCache {
    pub fn new(probe: Box<dyn MetadataProbe>, scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            inner: Rc::new(CacheInner {
                records: RefCell::new(HashMap::new()),
                pending: RefCell::new(HashMap::new()),
                probe,
                scheduler,
            }),
        }
    }

    pub fn lookup(&self, key: &str) -> CacheLookup {
        if key.is_empty() {
            return CacheLookup::Unknown;
        }
        if self.inner.pending.borrow().contains_key(key) {
            return CacheLookup::Pending;
        }
        match self.inner.records.borrow().get(key) {
            Some(MetadataRecord::Ready {
                byte_size,
                content_type,
            }) => CacheLookup::Ready {
                byte_size: *byte_size,
                content_type: content_type.clone(),
            },
            Some(MetadataRecord::Failed { .. }) => CacheLookup::Failed,
            None => CacheLookup::Unknown,
        }
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.inner.pending.borrow().contains_key(key)
    }

    pub fn record(&self, key: &str) -> Option<MetadataRecord> {
        self.inner.records.borrow().get(key).cloned()
    }

    /// Resolve metadata for `key`.
    ///
    /// A cached success is returned without I/O. A cached failure is dropped and
    /// probed again. A probe already in flight is shared rather than repeated.
    /// The returned future never fails; a failed probe yields
    /// [`MetadataRecord::Failed`]. The probe itself runs on the scheduler, so it
    /// settles (and leaves the pending registry) even if every caller goes away.
    pub fn resolve(&self, key: &str) -> PendingMetadata {
        let cached = self.inner.records.borrow().get(key).cloned();
        match cached {
            Some(record @ MetadataRecord::Ready { .. }) => {
                return futures_util::future::ready(record).boxed_local().shared();
            }
            Some(MetadataRecord::Failed { .. }) => {
                self.inner.records.borrow_mut().remove(key);
            }
            None => {}
        }

        if let Some(in_flight) = self.inner.pending.borrow().get(key) {
            return in_flight.clone();
        }

        log::debug!("probing media metadata for {key}");
        let probe = self.inner.probe.probe(key);
        let cache = Rc::downgrade(&self.inner);
        let owned_key = key.to_string();
        let request = async move {
            let record = record_from_probe(probe.await);
            if let MetadataRecord::Failed { error_message } = &record {
                log::warn!("metadata probe for {owned_key} failed: {error_message}");
            }
            settle(&cache, owned_key, record.clone());
            record
        }
        .boxed_local()
        .shared();

        self.inner
            .pending
            .borrow_mut()
            .insert(key.to_string(), request.clone());
        self.inner
            .scheduler
            .spawn_local(request.clone().map(|_| ()).boxed_local());
        request
    }
}

fn settle(cache: &Weak<CacheInner>, key: String, record: MetadataRecord) {
    let Some(cache) = cache.upgrade() else {
        return;
    };
    cache.pending.borrow_mut().remove(&key);
    cache.records.borrow_mut().insert(key, record);
}

fn record_from_probe(outcome: Result<ProbeResponse, ProbeError>) -> MetadataRecord {
    let response = match outcome {
        Ok(response) if response.is_success() => response,
        Ok(response) => {
            return MetadataRecord::Failed {
                error_message: ProbeError::Status(response.status).to_string(),
            }
        }
        Err(error) => {
            return MetadataRecord::Failed {
                error_message: error.to_string(),
            }
        }
    };

    let byte_size = response
        .content_length
        .as_deref()
        .and_then(|raw| raw.trim().parse::<u64>().ok());
    MetadataRecord::Ready {
        byte_size,
        content_type: response.content_type.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ok_response, ManualScheduler, ScriptedServer};
    use tokio::task::LocalSet;

    fn cache_with(server: &ScriptedServer) -> MetadataCache {
        MetadataCache::new(Box::new(server.clone()), Rc::new(ManualScheduler::default()))
    }

    const KEY: &str = "https://example.com/clip.mp4";

    #[tokio::test]
    async fn concurrent_resolves_share_one_request() {
        LocalSet::new()
            .run_until(async {
                let response = ok_response(Some("2048"), Some("video/mp4"));
                let server = ScriptedServer::new(vec![Ok(response)]);
                let cache = cache_with(&server);

                let first = cache.resolve(KEY);
                let second = cache.resolve(KEY);
                let third = cache.resolve(KEY);
                assert_eq!(cache.lookup(KEY), CacheLookup::Pending);

                let (a, b, c) = futures_util::join!(first, second, third);
                assert_eq!(server.calls(), 1);
                assert_eq!(a, b);
                assert_eq!(b, c);
                assert_eq!(
                    a,
                    MetadataRecord::Ready {
                        byte_size: Some(2048),
                        content_type: "video/mp4".to_string()
                    }
                );
                assert!(!cache.is_pending(KEY));
            })
            .await;
    }

    #[tokio::test]
    async fn successes_are_served_from_the_cache() {
        LocalSet::new()
            .run_until(async {
                let server = ScriptedServer::new(vec![Ok(ok_response(None, None))]);
                let cache = cache_with(&server);

                let first = cache.resolve(KEY).await;
                let second = cache.resolve(KEY).await;
                assert_eq!(server.calls(), 1);
                assert_eq!(first, second);
                assert_eq!(
                    cache.lookup(KEY),
                    CacheLookup::Ready {
                        byte_size: None,
                        content_type: String::new()
                    }
                );
            })
            .await;
    }

    #[tokio::test]
    async fn failures_are_retried_on_next_resolve() {
        LocalSet::new()
            .run_until(async {
                let server = ScriptedServer::new(vec![
                    Ok(ProbeResponse {
                        status: 404,
                        ..ProbeResponse::default()
                    }),
                    Ok(ok_response(Some("10"), Some("video/webm"))),
                ]);
                let cache = cache_with(&server);

                let failed = cache.resolve(KEY).await;
                assert_eq!(
                    failed,
                    MetadataRecord::Failed {
                        error_message: "HTTP 404".to_string()
                    }
                );
                assert_eq!(cache.lookup(KEY), CacheLookup::Failed);

                let retried = cache.resolve(KEY);
                assert_eq!(cache.record(KEY), None);
                assert_eq!(cache.lookup(KEY), CacheLookup::Pending);
                assert!(!retried.await.is_failed());
                assert_eq!(server.calls(), 2);
            })
            .await;
    }

    #[tokio::test]
    async fn transport_errors_become_failure_records() {
        LocalSet::new()
            .run_until(async {
                let reset = ProbeError::Transport("connection reset".into());
                let server = ScriptedServer::new(vec![Err(reset)]);
                let cache = cache_with(&server);
                assert_eq!(
                    cache.resolve(KEY).await,
                    MetadataRecord::Failed {
                        error_message: "connection reset".to_string()
                    }
                );
                assert!(!cache.is_pending(KEY));
            })
            .await;
    }

    #[tokio::test]
    async fn abandoned_requests_still_settle() {
        LocalSet::new()
            .run_until(async {
                let server = ScriptedServer::new(vec![Ok(ok_response(Some("1"), None))]);
                let cache = cache_with(&server);
                drop(cache.resolve(KEY));
                assert!(cache.is_pending(KEY));

                crate::testing::settle().await;
                assert!(!cache.is_pending(KEY));
                assert!(matches!(cache.lookup(KEY), CacheLookup::Ready { .. }));
            })
            .await;
    }

    #[test]
    fn invalid_content_length_is_dropped() {
        let record = record_from_probe(Ok(ok_response(Some("lots"), Some("video/mp4"))));
        assert_eq!(
            record,
            MetadataRecord::Ready {
                byte_size: None,
                content_type: "video/mp4".to_string()
            }
        );
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Subscribe side of the exchange.
//!
//! URL subscriptions are decoupled from transport subscriptions: any
//! number of URL subscriptions into the same package share one topic
//! subscription on the transport, tracked by refcount. Dropping the last
//! URL subscription tears the topic subscription down.
//!
//! Dispatch runs on the transport callback thread. The subscription table
//! is locked only to snapshot the matching callbacks; user callbacks are
//! invoked outside the lock, so a callback may itself subscribe or
//! unsubscribe without deadlocking.

use crate::explorer::SignalExplorer;
use crate::extractor::{BoundExtractor, StructExtractor};
use crate::package::Package;
use crate::transport::{Transport, TransportCallback, TransportHandle};
use crate::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Raw package delivery callback.
pub type PackageCallback = Arc<dyn Fn(&Package) + Send + Sync>;

/// Typed delivery callback; the extractor arrives bound to the inbound
/// payload.
pub type ExtractorCallback = Arc<dyn for<'a> Fn(&BoundExtractor<'a>) + Send + Sync>;

/// Identifier of one URL subscription. Never zero, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(NonZeroU64);

impl SubscriptionId {
    #[must_use]
    #[inline]
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

/// Subscription options.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubscribeOptions {
    /// Subscribe to the URL verbatim as a topic even when no registered
    /// description resolves it. Used for topics whose description arrives
    /// late.
    pub force: bool,
}

/// Point-in-time view of one live subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionInfo {
    pub id: SubscriptionId,
    pub url: String,
    pub topic: String,
}

enum Callback {
    Raw(PackageCallback),
    Extractor {
        extractor: Arc<StructExtractor>,
        callback: ExtractorCallback,
    },
}

struct Subscription {
    id: SubscriptionId,
    url: String,
    topic: String,
    callback: Callback,
}

struct TopicEntry {
    handle: TransportHandle,
    refcount: usize,
}

#[derive(Default)]
struct Inner {
    subscriptions: Mutex<Vec<Subscription>>,
    topics: Mutex<HashMap<String, TopicEntry>>,
}

impl Inner {
    fn dispatch(&self, topic: &str, package: &Package) {
        // snapshot under the lock, invoke outside it
        let matching: Vec<CallbackSnapshot> = {
            let subscriptions = self.subscriptions.lock();
            subscriptions
                .iter()
                .filter(|s| s.topic == topic)
                .map(|s| match &s.callback {
                    Callback::Raw(cb) => CallbackSnapshot::Raw(Arc::clone(cb)),
                    Callback::Extractor {
                        extractor,
                        callback,
                    } => CallbackSnapshot::Extractor {
                        extractor: Arc::clone(extractor),
                        callback: Arc::clone(callback),
                    },
                })
                .collect()
        };
        for snapshot in matching {
            match snapshot {
                CallbackSnapshot::Raw(cb) => cb(package),
                CallbackSnapshot::Extractor {
                    extractor,
                    callback,
                } => {
                    let bound = extractor.bind(package.payload());
                    callback(&bound);
                }
            }
        }
    }
}

enum CallbackSnapshot {
    Raw(PackageCallback),
    Extractor {
        extractor: Arc<StructExtractor>,
        callback: ExtractorCallback,
    },
}

/// Subscriber over one transport and one description registry.
pub struct DataSubscriber {
    explorer: Arc<SignalExplorer>,
    transport: Arc<dyn Transport>,
    inner: Arc<Inner>,
    next_id: AtomicU64,
}

impl DataSubscriber {
    #[must_use]
    pub fn new(explorer: Arc<SignalExplorer>, transport: Arc<dyn Transport>) -> Self {
        Self {
            explorer,
            transport,
            inner: Arc::new(Inner::default()),
            next_id: AtomicU64::new(1),
        }
    }

    fn resolve_topic(&self, url: &str, options: SubscribeOptions) -> Result<String> {
        let mut topics = self.explorer.get_package_url(url);
        if let Some(topic) = topics.drain(..).next() {
            return Ok(topic);
        }
        if options.force {
            log::debug!("[Subscriber] force-subscribing unresolved url '{url}'");
            return Ok(url.to_owned());
        }
        Err(Error::UrlNotFound(url.to_owned()))
    }

    fn register(&self, url: &str, topic: String, callback: Callback) -> Result<SubscriptionId> {
        {
            let mut topics = self.inner.topics.lock();
            if let Some(entry) = topics.get_mut(&topic) {
                entry.refcount += 1;
            } else {
                let inner = Arc::clone(&self.inner);
                let dispatch_topic = topic.clone();
                let transport_cb: TransportCallback =
                    Arc::new(move |pkg| inner.dispatch(&dispatch_topic, pkg));
                let handle = self
                    .transport
                    .subscribe(&topic, transport_cb)
                    .map_err(|_| Error::TransportClosed)?;
                topics.insert(
                    topic.clone(),
                    TopicEntry {
                        handle,
                        refcount: 1,
                    },
                );
                log::debug!("[Subscriber] opened topic subscription '{topic}'");
            }
        }

        // id 0 is skipped by construction (counter starts at 1)
        let raw = self.next_id.fetch_add(1, Ordering::Relaxed);
        let id = SubscriptionId(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN));
        self.inner.subscriptions.lock().push(Subscription {
            id,
            url: url.to_owned(),
            topic,
            callback,
        });
        Ok(id)
    }

    /// Subscribe a raw package callback to `url`.
    ///
    /// # Errors
    ///
    /// `Error::UrlNotFound` when no registered description resolves the
    /// URL to a topic (use [`SubscribeOptions::force`] to bypass),
    /// `Error::TransportClosed` after transport shutdown.
    pub fn subscribe(&self, url: &str, callback: PackageCallback) -> Result<SubscriptionId> {
        self.subscribe_with_options(url, SubscribeOptions::default(), callback)
    }

    /// [`subscribe`](Self::subscribe) with explicit options.
    pub fn subscribe_with_options(
        &self,
        url: &str,
        options: SubscribeOptions,
        callback: PackageCallback,
    ) -> Result<SubscriptionId> {
        let topic = self.resolve_topic(url, options)?;
        self.register(url, topic, Callback::Raw(callback))
    }

    /// Subscribe a typed callback; each inbound package arrives as the
    /// extractor bound to its payload.
    pub fn subscribe_extractor(
        &self,
        url: &str,
        extractor: Arc<StructExtractor>,
        callback: ExtractorCallback,
    ) -> Result<SubscriptionId> {
        let topic = self.resolve_topic(url, SubscribeOptions::default())?;
        self.register(
            url,
            topic,
            Callback::Extractor {
                extractor,
                callback,
            },
        )
    }

    /// Drop a subscription. Unknown or already-dropped ids are a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let topic = {
            let mut subscriptions = self.inner.subscriptions.lock();
            let Some(pos) = subscriptions.iter().position(|s| s.id == id) else {
                return;
            };
            subscriptions.remove(pos).topic
        };

        let mut topics = self.inner.topics.lock();
        if let Some(entry) = topics.get_mut(&topic) {
            entry.refcount -= 1;
            if entry.refcount == 0 {
                let handle = entry.handle;
                topics.remove(&topic);
                drop(topics);
                self.transport.unsubscribe(handle);
                log::debug!("[Subscriber] closed topic subscription '{topic}'");
            }
        }
    }

    /// Point-in-time copy of all live subscriptions.
    #[must_use]
    pub fn subscriptions_info(&self) -> Vec<SubscriptionInfo> {
        self.inner
            .subscriptions
            .lock()
            .iter()
            .map(|s| SubscriptionInfo {
                id: s.id,
                url: s.url.clone(),
                topic: s.topic.clone(),
            })
            .collect()
    }

    /// Whether the topic behind `url` currently has a live publisher.
    #[must_use]
    pub fn is_connected(&self, url: &str) -> bool {
        self.explorer
            .get_package_url(url)
            .first()
            .map(|topic| self.transport.publisher_count(topic) > 0)
            .unwrap_or(false)
    }
}

impl Drop for DataSubscriber {
    fn drop(&mut self) {
        let mut topics = self.inner.topics.lock();
        for (_, entry) in topics.drain() {
            self.transport.unsubscribe(entry.handle);
        }
        self.inner.subscriptions.lock().clear();
    }
}

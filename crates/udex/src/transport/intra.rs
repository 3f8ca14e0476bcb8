// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-process topic transport.
//!
//! One bounded queue, one dispatch thread. Publishers block (up to their
//! timeout) when the queue is full; the dispatch thread pops packages and
//! invokes every callback subscribed to the package's topic, preserving
//! arrival order per topic. The subscription table is an `ArcSwap`
//! snapshot: dispatch reads it lock-free, subscribe/unsubscribe build a
//! new map and swap it in. Shutdown is a sentinel pushed on drop and a
//! join of the dispatch thread, so no callback runs after the transport
//! is gone.

use super::{Transport, TransportCallback, TransportError, TransportHandle};
use crate::package::Package;
use arc_swap::ArcSwap;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

enum Event {
    Deliver { topic: String, package: Package },
    Shutdown,
}

/// topic -> subscribed callbacks, in subscription order
type TopicMap = HashMap<String, Vec<(TransportHandle, TransportCallback)>>;

/// Same-process [`Transport`] over a bounded crossbeam queue.
pub struct IntraProcessTransport {
    tx: crossbeam::channel::Sender<Event>,
    subscriptions: Arc<ArcSwap<TopicMap>>,
    /// Reverse index; the lock also serializes table writers.
    topic_of: Mutex<HashMap<TransportHandle, String>>,
    /// topic -> announced publisher count
    publishers: DashMap<String, usize>,
    next_handle: AtomicU64,
    closed: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl IntraProcessTransport {
    /// Start the transport with a send queue of `queue_capacity` packages.
    #[must_use]
    pub fn new(queue_capacity: usize) -> Self {
        let (tx, rx) = crossbeam::channel::bounded::<Event>(queue_capacity.max(1));
        let subscriptions: Arc<ArcSwap<TopicMap>> =
            Arc::new(ArcSwap::from_pointee(TopicMap::new()));

        let table = Arc::clone(&subscriptions);
        let worker = std::thread::Builder::new()
            .name("udex-intra-dispatch".into())
            .spawn(move || {
                while let Ok(event) = rx.recv() {
                    match event {
                        Event::Deliver { topic, package } => {
                            let snapshot = table.load();
                            if let Some(subs) = snapshot.get(&topic) {
                                for (_, cb) in subs {
                                    cb(&package);
                                }
                            }
                        }
                        Event::Shutdown => break,
                    }
                }
                log::debug!("[IntraTransport] dispatch thread exiting");
            })
            .ok();

        Self {
            tx,
            subscriptions,
            topic_of: Mutex::new(HashMap::new()),
            publishers: DashMap::new(),
            next_handle: AtomicU64::new(1),
            closed: AtomicBool::new(false),
            worker: Mutex::new(worker),
        }
    }
}

impl Default for IntraProcessTransport {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Transport for IntraProcessTransport {
    fn publish(
        &self,
        topic: &str,
        package: Package,
        timeout: Duration,
    ) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        self.tx
            .send_timeout(
                Event::Deliver {
                    topic: topic.to_owned(),
                    package,
                },
                timeout,
            )
            .map_err(|e| match e {
                crossbeam::channel::SendTimeoutError::Timeout(_) => TransportError::Timeout,
                crossbeam::channel::SendTimeoutError::Disconnected(_) => TransportError::Closed,
            })
    }

    fn subscribe(
        &self,
        topic: &str,
        callback: TransportCallback,
    ) -> Result<TransportHandle, TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        let handle = TransportHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));

        let mut topic_of = self.topic_of.lock();
        let mut map: TopicMap = (**self.subscriptions.load()).clone();
        map.entry(topic.to_owned())
            .or_default()
            .push((handle, callback));
        self.subscriptions.store(Arc::new(map));
        topic_of.insert(handle, topic.to_owned());

        log::debug!("[IntraTransport] subscribed {handle:?} to '{topic}'");
        Ok(handle)
    }

    fn unsubscribe(&self, handle: TransportHandle) {
        let mut topic_of = self.topic_of.lock();
        let Some(topic) = topic_of.remove(&handle) else {
            return;
        };
        let mut map: TopicMap = (**self.subscriptions.load()).clone();
        if let Some(subs) = map.get_mut(&topic) {
            subs.retain(|(h, _)| *h != handle);
            if subs.is_empty() {
                map.remove(&topic);
            }
        }
        self.subscriptions.store(Arc::new(map));
        log::debug!("[IntraTransport] unsubscribed {handle:?} from '{topic}'");
    }

    fn register_publisher(&self, topic: &str) {
        *self.publishers.entry(topic.to_owned()).or_insert(0) += 1;
        log::debug!("[IntraTransport] publisher announced on '{topic}'");
    }

    fn unregister_publisher(&self, topic: &str) {
        let drained = match self.publishers.get_mut(topic) {
            Some(mut count) => {
                *count -= 1;
                *count == 0
            }
            None => return,
        };
        if drained {
            self.publishers.remove_if(topic, |_, count| *count == 0);
        }
        log::debug!("[IntraTransport] publisher retracted from '{topic}'");
    }

    fn publisher_count(&self, topic: &str) -> usize {
        self.publishers.get(topic).map(|c| *c).unwrap_or(0)
    }
}

impl Drop for IntraProcessTransport {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Release);
        // the worker drains the queue before it sees the sentinel
        let _ = self.tx.send(Event::Shutdown);
        if let Some(worker) = self.worker.lock().take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{PackageBuffer, PackageMetaInfo};
    use std::time::Instant;

    fn package(cycle_id: u32) -> Package {
        let meta = PackageMetaInfo {
            source_id: 1,
            instance_number: 0,
            cycle_id,
            virtual_address: 0x1000,
        };
        Package::new(meta, PackageBuffer::zeroed(4), 0)
    }

    fn wait_for(mut done: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done() {
            assert!(Instant::now() < deadline, "condition not met in time");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn delivers_to_matching_topic_only() {
        let transport = IntraProcessTransport::new(16);
        let seen_a = Arc::new(Mutex::new(Vec::new()));
        let seen_b = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen_a);
        transport
            .subscribe("a", Arc::new(move |p: &Package| sink.lock().push(p.meta().cycle_id)))
            .unwrap();
        let sink = Arc::clone(&seen_b);
        transport
            .subscribe("b", Arc::new(move |p: &Package| sink.lock().push(p.meta().cycle_id)))
            .unwrap();

        transport
            .publish("a", package(1), Duration::from_secs(1))
            .unwrap();
        transport
            .publish("b", package(2), Duration::from_secs(1))
            .unwrap();

        wait_for(|| seen_a.lock().len() == 1 && seen_b.lock().len() == 1);
        assert_eq!(*seen_a.lock(), vec![1]);
        assert_eq!(*seen_b.lock(), vec![2]);
    }

    #[test]
    fn preserves_per_topic_order_under_load() {
        let transport = IntraProcessTransport::new(8);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        transport
            .subscribe("load", Arc::new(move |p: &Package| sink.lock().push(p.meta().cycle_id)))
            .unwrap();

        for i in 0..200 {
            transport
                .publish("load", package(i), Duration::from_secs(5))
                .unwrap();
        }
        wait_for(|| seen.lock().len() == 200);
        assert_eq!(*seen.lock(), (0..200).collect::<Vec<_>>());
    }

    #[test]
    fn saturated_queue_times_out() {
        let transport = IntraProcessTransport::new(1);
        let (gate_tx, gate_rx) = crossbeam::channel::unbounded::<()>();

        transport
            .subscribe(
                "slow",
                Arc::new(move |_: &Package| {
                    let _ = gate_rx.recv();
                }),
            )
            .unwrap();

        // first package occupies the dispatch thread inside the callback
        transport
            .publish("slow", package(0), Duration::from_secs(1))
            .unwrap();
        // second fills the single queue slot once the worker took the first
        transport
            .publish("slow", package(1), Duration::from_secs(5))
            .unwrap();
        // now nothing can move until the gate opens
        let err = transport
            .publish("slow", package(2), Duration::from_millis(50))
            .unwrap_err();
        assert_eq!(err, TransportError::Timeout);

        gate_tx.send(()).unwrap();
        gate_tx.send(()).unwrap();
    }

    #[test]
    fn unsubscribe_stops_delivery_and_is_idempotent() {
        let transport = IntraProcessTransport::new(16);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let handle = transport
            .subscribe("t", Arc::new(move |p: &Package| sink.lock().push(p.meta().cycle_id)))
            .unwrap();

        transport
            .publish("t", package(1), Duration::from_secs(1))
            .unwrap();
        wait_for(|| seen.lock().len() == 1);

        transport.unsubscribe(handle);
        transport.unsubscribe(handle);

        transport
            .publish("t", package(2), Duration::from_secs(1))
            .unwrap();
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(*seen.lock(), vec![1]);
    }

    #[test]
    fn publisher_count_follows_announcements() {
        let transport = IntraProcessTransport::new(4);
        assert_eq!(transport.publisher_count("t"), 0);

        transport.register_publisher("t");
        transport.register_publisher("t");
        assert_eq!(transport.publisher_count("t"), 2);
        assert_eq!(transport.publisher_count("other"), 0);

        transport.unregister_publisher("t");
        assert_eq!(transport.publisher_count("t"), 1);
        transport.unregister_publisher("t");
        assert_eq!(transport.publisher_count("t"), 0);
        // retracting with nothing announced is a no-op
        transport.unregister_publisher("t");
        assert_eq!(transport.publisher_count("t"), 0);
    }

    #[test]
    fn publishing_alone_does_not_announce_a_publisher() {
        let transport = IntraProcessTransport::new(4);
        transport
            .publish("t", package(0), Duration::from_secs(1))
            .unwrap();
        assert_eq!(transport.publisher_count("t"), 0);
    }
}

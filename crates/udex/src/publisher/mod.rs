// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Publish side of the exchange.
//!
//! A [`DataPublisher`] owns one data source identity, registers the
//! descriptions of the packages it emits, and pushes stamped packages
//! through the processor chain to the transport. Identity is frozen after
//! the first publish so a topic never changes provenance mid-stream.

mod processor;

pub use processor::{
    PackageProcessor, ProcessorDescription, ProcessorLoader, ProcessorRegistry,
};

use crate::config::UdexConfig;
use crate::explorer::{DataSourceInfo, PackageDescription, SignalExplorer};
use crate::package::{Package, PackageBuffer};
use crate::transport::{Transport, TransportError};
use crate::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

/// Publisher for one data source.
pub struct DataPublisher {
    explorer: Arc<SignalExplorer>,
    transport: Arc<dyn Transport>,
    config: UdexConfig,
    source: Mutex<Option<DataSourceInfo>>,
    processors: Mutex<Vec<Box<dyn PackageProcessor>>>,
    /// Topics announced to the transport; retracted again on drop.
    announced: Mutex<HashSet<String>>,
    published: AtomicBool,
}

impl DataPublisher {
    #[must_use]
    pub fn new(
        explorer: Arc<SignalExplorer>,
        transport: Arc<dyn Transport>,
        config: UdexConfig,
    ) -> Self {
        Self {
            explorer,
            transport,
            config,
            source: Mutex::new(None),
            processors: Mutex::new(Vec::new()),
            announced: Mutex::new(HashSet::new()),
            published: AtomicBool::new(false),
        }
    }

    /// Fix the identity stamped on every outgoing package.
    ///
    /// # Errors
    ///
    /// `Error::InvalidState` once the first package has been published;
    /// subscribers key on provenance and must not see it change.
    pub fn set_data_source_info(
        &self,
        name: &str,
        source_id: u16,
        instance_number: u32,
    ) -> Result<()> {
        if self.published.load(Ordering::Acquire) {
            return Err(Error::InvalidState(
                "data source info cannot change after publishing".into(),
            ));
        }
        let mut source = self.source.lock();
        *source = Some(DataSourceInfo {
            name: name.to_owned(),
            source_id,
            instance_number,
        });
        log::info!("[Publisher] data source \"{name}\" (id {source_id}/{instance_number})");
        Ok(())
    }

    fn source_info(&self) -> Result<DataSourceInfo> {
        self.source
            .lock()
            .clone()
            .ok_or_else(|| Error::InvalidState("data source info not set".into()))
    }

    /// Register description content under this publisher's source.
    ///
    /// # Errors
    ///
    /// `Error::InvalidState` before `set_data_source_info`; parse and
    /// format-mismatch errors pass through from the explorer with no
    /// partial registration.
    pub fn register_data_description(
        &self,
        content: &str,
        format: crate::types::DescriptionFormat,
    ) -> Result<Vec<Arc<PackageDescription>>> {
        let source = self.source_info()?;
        self.explorer
            .register_data_description(&source, content, format)
    }

    /// Register a description file; extension must match the format.
    pub fn register_data_description_file(
        &self,
        path: &Path,
        format: crate::types::DescriptionFormat,
    ) -> Result<Vec<Arc<PackageDescription>>> {
        let source = self.source_info()?;
        self.explorer
            .register_data_description_file(&source, path, format)
    }

    /// Append a processor to the publish chain. If the processor ships a
    /// data description for its output layout, it is registered too.
    pub fn add_processor(&self, processor: Box<dyn PackageProcessor>) -> Result<()> {
        if let Some(desc) = processor.provide_data_description() {
            let source = self.source_info()?;
            self.explorer
                .register_data_description(&source, &desc.content, desc.format)?;
        }
        self.processors.lock().push(processor);
        Ok(())
    }

    /// Publish `payload` under the package URL, waiting up to the
    /// configured default timeout for a transport slot.
    pub fn publish_package(&self, url: &str, payload: Vec<u8>) -> Result<()> {
        self.publish_package_timeout(url, payload, self.config.default_publish_timeout)
    }

    /// Publish with an explicit send timeout.
    ///
    /// # Errors
    ///
    /// `Error::UrlNotFound` for an unregistered URL,
    /// `Error::PublishTimeout` when no transport slot frees up in time,
    /// `Error::TransportClosed` after transport shutdown.
    pub fn publish_package_timeout(
        &self,
        url: &str,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<()> {
        let description = self
            .explorer
            .package_for_url(url)
            .ok_or_else(|| Error::UrlNotFound(url.to_owned()))?;
        let meta = description.meta_info();

        {
            // first publish onto a topic announces this publisher; the
            // announcement holds until drop
            let mut announced = self.announced.lock();
            if announced.insert(description.package_url.clone()) {
                self.transport.register_publisher(&description.package_url);
            }
        }

        let mut package = Package::new(meta, PackageBuffer::from_vec(payload), now_micros());
        {
            let mut processors = self.processors.lock();
            for processor in processors.iter_mut() {
                if processor.as_ref().wants(&meta) {
                    package = processor.process_package(package);
                }
            }
        }

        self.transport
            .publish(&description.package_url, package, timeout)
            .map_err(|e| match e {
                TransportError::Timeout => {
                    log::warn!(
                        "[Publisher] publish of '{}' timed out after {timeout:?}",
                        description.package_url
                    );
                    Error::PublishTimeout
                }
                TransportError::Closed => Error::TransportClosed,
            })?;
        self.published.store(true, Ordering::Release);
        Ok(())
    }

    /// Topics this publisher's source has registered, with their dispatch
    /// hashes.
    #[must_use]
    pub fn get_topics_and_hashes(&self) -> Vec<(String, u64)> {
        let Some(source) = self.source.lock().clone() else {
            return Vec::new();
        };
        self.explorer
            .packages_for_source(&source.name)
            .into_iter()
            .map(|pkg| {
                let hash = crate::package::package_hash(&pkg.meta_info());
                (pkg.package_url.clone(), hash)
            })
            .collect()
    }
}

impl Drop for DataPublisher {
    fn drop(&mut self) {
        for topic in self.announced.get_mut().drain() {
            self.transport.unregister_publisher(&topic);
        }
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Package processor plug points.
//!
//! A processor sits on the publish path and rewrites packages before they
//! reach the transport (format upgrades, unit conversion, enrichment). It
//! can also contribute its own data description so the packages it emits
//! are resolvable. Processors are discovered through [`ProcessorLoader`]
//! registrations at startup; the loader hands out owned instances, so one
//! processor type can serve several concurrent publishers without shared
//! state.

use crate::package::{Package, PackageMetaInfo};
use crate::types::DescriptionFormat;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Description content a processor contributes for its output packages.
#[derive(Debug, Clone)]
pub struct ProcessorDescription {
    pub content: String,
    pub format: DescriptionFormat,
}

/// Publish-path package transformer.
pub trait PackageProcessor: Send {
    /// Description of the packages this processor emits, if it changes the
    /// layout.
    fn provide_data_description(&self) -> Option<ProcessorDescription> {
        None
    }

    /// Meta infos this processor wants to see. An empty list means every
    /// package.
    fn provide_requested_package_info(&self) -> Vec<PackageMetaInfo> {
        Vec::new()
    }

    /// Transform one package. Ownership passes through; returning the
    /// input unchanged is a valid no-op.
    fn process_package(&mut self, package: Package) -> Package;

    /// An independent copy with fresh state, for a new stream.
    fn create_new_instance(&self) -> Box<dyn PackageProcessor>;
}

impl dyn PackageProcessor {
    /// Whether this processor asked to see packages with `meta`.
    #[must_use]
    pub fn wants(&self, meta: &PackageMetaInfo) -> bool {
        let requested = self.provide_requested_package_info();
        requested.is_empty() || requested.contains(meta)
    }
}

/// Source of processor instances, registered under a stable name.
pub trait ProcessorLoader: Send + Sync {
    fn name(&self) -> &str;
    fn load(&self) -> Box<dyn PackageProcessor>;
}

/// Startup-time registry of processor loaders.
#[derive(Default)]
pub struct ProcessorRegistry {
    loaders: Mutex<HashMap<String, Box<dyn ProcessorLoader>>>,
}

impl ProcessorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a loader; a later registration under the same name
    /// replaces the earlier one.
    pub fn register(&self, loader: Box<dyn ProcessorLoader>) {
        let name = loader.name().to_owned();
        log::debug!("[Processors] registered loader \"{name}\"");
        self.loaders.lock().insert(name, loader);
    }

    /// Instantiate the named processor.
    #[must_use]
    pub fn instantiate(&self, name: &str) -> Option<Box<dyn PackageProcessor>> {
        self.loaders.lock().get(name).map(|l| l.load())
    }

    /// Names of all registered loaders, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.loaders.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

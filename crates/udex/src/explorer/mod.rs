// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Signal URL registry and exploration queries.
//!
//! The explorer ingests data descriptions and merges them into a URL tree
//! keyed by full dotted URLs (`<device>.<view>.<group>.<...>.<signal>`).
//! After the initial load the registry is read-mostly: registration takes
//! the write lock, every query takes a read lock (single-writer /
//! multi-reader discipline per the concurrency model).
//!
//! Overlapping URLs are legal (the same signal name may be described by
//! two schema sources) and the registry keeps all of them; callers
//! disambiguate by package when needed.

use crate::description::{self, DescriptionError, ParsedPackage, SignalNode};
use crate::package::PackageMetaInfo;
use crate::types::{DescriptionFormat, SignalInfo, SignalType};
use crate::{Error, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Identity of a registered data source (device).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSourceInfo {
    pub name: String,
    pub source_id: u16,
    pub instance_number: u32,
}

/// One registered package: full URL plus the description subtree.
#[derive(Debug, Clone)]
pub struct PackageDescription {
    /// Full package URL, `<device>.<relative_url>`.
    pub package_url: String,
    pub source: DataSourceInfo,
    pub cycle_id: u32,
    pub virtual_address: u64,
    pub size: usize,
    pub format: DescriptionFormat,
    pub root: SignalNode,
}

impl PackageDescription {
    /// Meta info a package published under this description carries.
    #[must_use]
    pub fn meta_info(&self) -> PackageMetaInfo {
        PackageMetaInfo {
            source_id: self.source.source_id,
            instance_number: self.source.instance_number,
            cycle_id: self.cycle_id,
            virtual_address: self.virtual_address,
        }
    }
}

/// Immediate child of a URL node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildInfo {
    pub name: String,
    pub is_leaf: bool,
    pub array_len: usize,
    pub child_count: usize,
}

/// Registry of all known signal descriptions.
#[derive(Default)]
pub struct SignalExplorer {
    packages: RwLock<Vec<Arc<PackageDescription>>>,
}

impl SignalExplorer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register description content for a data source.
    ///
    /// Atomic: the content is parsed completely before anything becomes
    /// visible; on error no partial registration is left behind.
    ///
    /// # Errors
    ///
    /// [`DescriptionError`] via `Error::Description` on parse failures and
    /// declared-format mismatches.
    pub fn register_data_description(
        &self,
        source: &DataSourceInfo,
        content: &str,
        format: DescriptionFormat,
    ) -> Result<Vec<Arc<PackageDescription>>> {
        let parsed = description::parse_description(content, format)?;
        let registered: Vec<Arc<PackageDescription>> = parsed
            .into_iter()
            .map(|p| Arc::new(Self::into_package(source, p, format)))
            .collect();

        let mut packages = self.packages.write();
        packages.extend(registered.iter().cloned());
        log::debug!(
            "[Explorer] registered {} package(s) for source \"{}\"",
            registered.len(),
            source.name
        );
        Ok(registered)
    }

    /// Register a description file; the extension must match the declared
    /// format.
    pub fn register_data_description_file(
        &self,
        source: &DataSourceInfo,
        path: &Path,
        format: DescriptionFormat,
    ) -> Result<Vec<Arc<PackageDescription>>> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if extension != format.extension() {
            return Err(Error::Description(DescriptionError::FormatMismatch {
                declared: format,
                found: DescriptionFormat::from_tag(&extension),
            }));
        }
        let content = std::fs::read_to_string(path)?;
        self.register_data_description(source, &content, format)
    }

    fn into_package(
        source: &DataSourceInfo,
        parsed: ParsedPackage,
        format: DescriptionFormat,
    ) -> PackageDescription {
        PackageDescription {
            package_url: format!("{}.{}", source.name, parsed.relative_url),
            source: source.clone(),
            cycle_id: parsed.cycle_id,
            virtual_address: parsed.virtual_address,
            size: parsed.size,
            format,
            root: parsed.root,
        }
    }

    /// Immediate children of `url` with leaf markers.
    ///
    /// An empty `url` lists the registered device names. Duplicates from
    /// overlapping descriptions are merged by name.
    #[must_use]
    pub fn get_child_by_url(&self, url: &str) -> Vec<ChildInfo> {
        let packages = self.packages.read();
        let mut children: Vec<ChildInfo> = Vec::new();
        let mut push_unique = |info: ChildInfo| {
            if !children.iter().any(|c| c.name == info.name) {
                children.push(info);
            }
        };

        for pkg in packages.iter() {
            if url.is_empty() {
                push_unique(ChildInfo {
                    name: pkg.source.name.clone(),
                    is_leaf: false,
                    array_len: 1,
                    child_count: 0,
                });
                continue;
            }
            if pkg.package_url == url {
                for child in &pkg.root.children {
                    push_unique(ChildInfo {
                        name: child.name.clone(),
                        is_leaf: child.is_leaf(),
                        array_len: child.array_len,
                        child_count: child.children.len(),
                    });
                }
            } else if let Some(rest) = strip_url_prefix(&pkg.package_url, url) {
                // url addresses a package-URL prefix (device or view level)
                let name = rest.split('.').next().unwrap_or(rest);
                let is_package = !rest.contains('.');
                push_unique(ChildInfo {
                    name: name.to_owned(),
                    is_leaf: is_package && pkg.root.is_leaf(),
                    array_len: if is_package { pkg.root.array_len } else { 1 },
                    child_count: if is_package { pkg.root.children.len() } else { 0 },
                });
            } else if let Some((node, _)) = resolve_in_package(pkg, url) {
                for child in &node.children {
                    push_unique(ChildInfo {
                        name: child.name.clone(),
                        is_leaf: child.is_leaf(),
                        array_len: child.array_len,
                        child_count: child.children.len(),
                    });
                }
            }
        }
        children
    }

    /// Top-level package URLs whose description contains `url`.
    ///
    /// An exact package URL match is placed first so subscribers preferring
    /// the verbatim topic find it at index 0.
    #[must_use]
    pub fn get_package_url(&self, url: &str) -> Vec<String> {
        let packages = self.packages.read();
        let mut result: Vec<String> = Vec::new();
        for pkg in packages.iter() {
            let contains = pkg.package_url == url
                || strip_url_prefix(&pkg.package_url, url).is_some()
                || resolve_in_package(pkg, url).is_some();
            if contains && !result.contains(&pkg.package_url) {
                if pkg.package_url == url {
                    result.insert(0, pkg.package_url.clone());
                } else {
                    result.push(pkg.package_url.clone());
                }
            }
        }
        result
    }

    /// Complete mapping from package URL to the ordered list of all URLs it
    /// exposes. Debug/UI enumeration, not a hot path.
    #[must_use]
    pub fn get_full_url_tree(&self) -> BTreeMap<String, Vec<String>> {
        let packages = self.packages.read();
        let mut tree = BTreeMap::new();
        for pkg in packages.iter() {
            let mut urls = Vec::new();
            pkg.root.collect_urls(&pkg.package_url, &mut urls);
            urls.sort();
            tree.entry(pkg.package_url.clone())
                .or_insert_with(Vec::new)
                .extend(urls);
        }
        tree
    }

    /// All full leaf URLs whose path contains the dotted `keyword` fragment
    /// as a segment-aligned sub-path. Matching an internal node returns
    /// every leaf below it.
    #[must_use]
    pub fn search_signal_tree(&self, keyword: &str) -> Vec<String> {
        let needle: Vec<&str> = keyword.split('.').filter(|s| !s.is_empty()).collect();
        if needle.is_empty() {
            return Vec::new();
        }
        let packages = self.packages.read();
        let mut result = Vec::new();
        for pkg in packages.iter() {
            let mut leaves = Vec::new();
            collect_leaf_urls(&pkg.root, &pkg.package_url, &mut leaves);
            for url in leaves {
                let segments: Vec<&str> = url.split('.').collect();
                let matched = segments
                    .windows(needle.len())
                    .any(|w| w == needle.as_slice());
                if matched && !result.contains(&url) {
                    result.push(url);
                }
            }
        }
        result
    }

    /// Data source names registered with the given description format.
    #[must_use]
    pub fn get_device_by_format(&self, format: DescriptionFormat) -> Vec<String> {
        let packages = self.packages.read();
        let mut devices = Vec::new();
        for pkg in packages.iter() {
            if pkg.format == format && !devices.contains(&pkg.source.name) {
                devices.push(pkg.source.name.clone());
            }
        }
        devices
    }

    /// Reconstruct a minimal SDL description for the subtree at `url`.
    ///
    /// # Errors
    ///
    /// `Error::UrlNotFound` if no registered description contains `url`.
    pub fn generate_sdl(&self, url: &str) -> Result<String> {
        let packages = self.packages.read();
        for pkg in packages.iter() {
            if pkg.package_url == url {
                return Ok(description::sdl::generate(
                    view_name(pkg),
                    pkg.cycle_id,
                    pkg.virtual_address,
                    &pkg.root,
                ));
            }
            if let Some((node, abs_offset)) = resolve_in_package(pkg, url) {
                return Ok(description::sdl::generate(
                    view_name(pkg),
                    pkg.cycle_id,
                    pkg.virtual_address + abs_offset as u64,
                    node,
                ));
            }
        }
        Err(Error::UrlNotFound(url.to_owned()))
    }

    /// Resolve a full URL to its addressing info (absolute offset within
    /// the owning package buffer). First registered match wins.
    #[must_use]
    pub fn signal_info(&self, url: &str) -> Option<SignalInfo> {
        let packages = self.packages.read();
        for pkg in packages.iter() {
            if pkg.package_url == url {
                return Some(SignalInfo {
                    signal_type: SignalType::Struct,
                    signal_size: pkg.size,
                    array_size: pkg.root.array_len,
                    offset: 0,
                });
            }
            if let Some((node, abs_offset)) = resolve_in_package(pkg, url) {
                return Some(SignalInfo {
                    signal_type: node.signal_type,
                    signal_size: node.elem_size,
                    array_size: node.array_len,
                    offset: abs_offset,
                });
            }
        }
        None
    }

    /// Package owning `url`, if any (exact package match preferred).
    #[must_use]
    pub fn package_for_url(&self, url: &str) -> Option<Arc<PackageDescription>> {
        let packages = self.packages.read();
        packages
            .iter()
            .find(|pkg| {
                pkg.package_url == url || resolve_in_package(pkg, url).is_some()
            })
            .cloned()
    }

    /// All packages registered by the named data source.
    #[must_use]
    pub fn packages_for_source(&self, source_name: &str) -> Vec<Arc<PackageDescription>> {
        let packages = self.packages.read();
        packages
            .iter()
            .filter(|pkg| pkg.source.name == source_name)
            .cloned()
            .collect()
    }

    /// Number of registered packages.
    #[must_use]
    pub fn package_count(&self) -> usize {
        self.packages.read().len()
    }
}

/// Depth-first walk yielding the full URLs of leaf signals only.
fn collect_leaf_urls(node: &SignalNode, prefix: &str, out: &mut Vec<String>) {
    for child in &node.children {
        let url = format!("{prefix}.{}", child.name);
        if child.is_leaf() {
            out.push(url);
        } else {
            collect_leaf_urls(child, &url, out);
        }
    }
}

/// `prefix` is a segment-aligned proper prefix of `url`: returns the rest.
fn strip_url_prefix<'a>(url: &'a str, prefix: &str) -> Option<&'a str> {
    url.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('.'))
        .filter(|rest| !rest.is_empty())
}

/// Descend from the package root along `url`, accumulating the absolute
/// byte offset. Returns the resolved node and its absolute offset.
fn resolve_in_package<'a>(
    pkg: &'a PackageDescription,
    url: &str,
) -> Option<(&'a SignalNode, usize)> {
    let rest = strip_url_prefix(url, &pkg.package_url)?;
    let mut node = &pkg.root;
    let mut offset = 0usize;
    for segment in rest.split('.') {
        node = node.child(segment)?;
        offset += node.offset;
    }
    Some((node, offset))
}

fn view_name(pkg: &PackageDescription) -> &str {
    // package URL is <device>.<view>.<group> for SDL sources; fall back to
    // the device name for flat formats
    let mut segments = pkg.package_url.split('.');
    let device = segments.next().unwrap_or("");
    segments.next().unwrap_or(device)
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! udex: typed signal data exchange for simulation rigs.
//!
//! Sensor and algorithm nodes exchange opaque binary packages over a
//! topic transport; this crate makes those packages addressable and
//! typed. A package is described once (SDL, DBC, FIBEX or CDL), every
//! signal inside it gets a dotted URL, and consumers read native values
//! without knowing the wire layout:
//!
//! - [`package`]: the binary package model, provenance meta info and the
//!   collision-free dispatch hash
//! - [`description`]: description file parsers and the signal tree
//! - [`explorer`]: the URL registry and its exploration queries
//! - [`extractor`]: resolve-once/bind-per-sample typed extraction
//! - [`casting`]: wire-type to native-type conversion rules
//! - [`publisher`] / [`subscriber`]: the pub/sub surface over a
//!   pluggable [`transport`]
//!
//! The crate never talks to a concrete network bus. Everything runs
//! against the [`transport::Transport`] trait; [`transport::IntraProcessTransport`]
//! ships for same-process wiring and tests.

pub mod casting;
pub mod config;
pub mod description;
pub mod explorer;
pub mod extractor;
pub mod package;
pub mod publisher;
pub mod subscriber;
pub mod transport;
pub mod types;

pub use casting::{cast_value, cast_value_lenient, CastError, FromWire};
pub use config::UdexConfig;
pub use description::DescriptionError;
pub use explorer::{DataSourceInfo, SignalExplorer};
pub use extractor::{ExtractError, StructExtractor};
pub use package::{package_hash, Package, PackageBuffer, PackageMetaInfo};
pub use publisher::DataPublisher;
pub use subscriber::{DataSubscriber, SubscriptionId};
pub use types::{DescriptionFormat, SignalInfo, SignalType, SignalValue};

/// Crate version, for diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate-level error type.
#[derive(Debug)]
pub enum Error {
    /// Description parsing or format validation failed.
    Description(DescriptionError),
    /// Filesystem access failed.
    Io(std::io::Error),
    /// No registered description resolves the URL.
    UrlNotFound(String),
    /// Operation not legal in the current state.
    InvalidState(String),
    /// The transport send queue stayed full past the timeout.
    PublishTimeout,
    /// The transport has shut down.
    TransportClosed,
    /// Typed extraction failed.
    Extract(ExtractError),
    /// Wire-to-native cast failed.
    Cast(CastError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Description(e) => write!(f, "description error: {e}"),
            Error::Io(e) => write!(f, "io error: {e}"),
            Error::UrlNotFound(url) => write!(f, "url not found: {url}"),
            Error::InvalidState(msg) => write!(f, "invalid state: {msg}"),
            Error::PublishTimeout => write!(f, "publish timed out"),
            Error::TransportClosed => write!(f, "transport is closed"),
            Error::Extract(e) => write!(f, "extraction error: {e}"),
            Error::Cast(e) => write!(f, "cast error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Description(e) => Some(e),
            Error::Io(e) => Some(e),
            Error::Extract(e) => Some(e),
            Error::Cast(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DescriptionError> for Error {
    fn from(e: DescriptionError) -> Self {
        Error::Description(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<ExtractError> for Error {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::UrlNotFound(url) => Error::UrlNotFound(url),
            other => Error::Extract(other),
        }
    }
}

impl From<CastError> for Error {
    fn from(e: CastError) -> Self {
        Error::Cast(e)
    }
}

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, Error>;

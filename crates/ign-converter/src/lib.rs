//! Translates Ignition configs between spec versions.
//!
//! Pairwise translators live in [`translate`]. The [`Registry`] chains them so
//! a [`Document`] of any supported version can be brought to any reachable
//! version:
//!
//! ```
//! use ign_converter::{Context, Document, Registry};
//! use ign_version::SpecVersion;
//!
//! let (document, _report) = Document::parse(br#"{"ignition": {"version": "3.0.0"}}"#)
//!     .expect("config is valid");
//! let translated = Registry::default()
//!     .translate(document, SpecVersion::V3_2, &Context::default())
//!     .expect("3.0 upgrades to 3.2");
//! assert_eq!(translated.version(), SpecVersion::V3_2);
//! ```
//!
//! Upgrading from 2.x to 3.x needs to know where every 2.x filesystem is
//! mounted, see [`FsMap`].
pub mod dedup;
pub mod document;
pub mod fsmap;
pub mod gate;
pub mod inode;
pub mod registry;
pub mod translate;

pub use crate::{
    document::Document,
    fsmap::FsMap,
    registry::Registry,
    translate::Context,
};

//! # mapping-finder
//!
//! Resolves, caches and searches symbol mappings between the obfuscated names of a game
//! version and a readable namespace, and drives background generation of a readable
//! source tree per (version, namespace).
//!
//! ## Architecture
//!
//! - **symbol**: Symbol identities, pairs and task keys
//! - **signature**: Source type syntax to descriptor conversion and descriptor renaming
//! - **format**: Two-stage mapping file parsing shared by every format
//! - **line_mapping**: Line-oriented `target -> origin:` mappings (official)
//! - **tiny_mapping**: Tab-separated Tiny v1 mappings (yarn)
//! - **index**: Bidirectional mapping index with ranked search
//! - **namespace**: Namespace services and the name-to-service registry
//! - **lock**: Non-blocking named lock
//! - **cache**: Per (version, namespace) memoized mapping indexes
//! - **registry**: Available / pending source generation state
//! - **store**: Durable key/value state on LMDB
//! - **source**: Remap + decompile pipeline
//! - **pool**: Bounded background worker pool
//! - **fetch**: Raw byte fetching and atomic file writes
//! - **meta**: Version metadata, release index and raw file downloads
//! - **tool**: External tool invocation
//! - **catalog**: Remapped jar inspection
//! - **scan**: Generated source tree inspection
//! - **config**: Settings and on-disk layout

pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod format;
pub mod index;
pub mod line_mapping;
pub mod lock;
pub mod meta;
pub mod namespace;
pub mod pool;
pub mod registry;
pub mod scan;
pub mod signature;
pub mod source;
pub mod store;
pub mod symbol;
pub mod tiny_mapping;
pub mod tool;

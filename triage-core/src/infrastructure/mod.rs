//! Core infrastructure: fingerprinting and result bundle persistence

pub mod bundle_store;
pub mod fingerprint;

pub use bundle_store::{
    BundleStoreError, COMPLETION_MARKER, load_bundle, read_completion_marker, write_bundle,
    write_completion_marker,
};
pub use fingerprint::fingerprint_file;

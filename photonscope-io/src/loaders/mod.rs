//! Format adapters.
//!
//! Every adapter has the signature `fn(&Path, &LoadOptions) -> Result<Dataset>`
//! so it can be bound to a suffix in the [`LoaderRegistry`](crate::LoaderRegistry).
//! Adapters attach metadata and provenance but apply no timing correction of
//! their own beyond what the byte-level decoder does.

#[cfg(feature = "hdf5")]
pub mod hdf5;
pub mod ni_binary;
pub mod spc;

#[cfg(feature = "hdf5")]
pub use self::hdf5::{load_photon_hdf5, pick_photon_group};
pub use ni_binary::{load_ni_binary, DEFAULT_TIMING_RESOLUTION};
pub use spc::{load_spc, load_spc_with, BhSpcDecoder, LegacyDecoder, LegacyRecords};

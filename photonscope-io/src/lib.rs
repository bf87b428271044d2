//! photonscope-io: File loading for photonscope.
//!
//! This crate maps files into memory, runs the byte-level decoders from
//! `photonscope-formats` and wraps the results into [`Dataset`]s. Loaders
//! are dispatched by suffix through a [`LoaderRegistry`]. Screening
//! decisions are kept in a CSV [`AnnotationStore`].
//!
//! Photon-HDF5 support requires the `hdf5` feature.
//!
//! [`Dataset`]: photonscope_core::Dataset

pub mod annotations;
mod error;
pub mod loaders;
mod options;
mod reader;
pub mod registry;

pub use annotations::{Annotation, AnnotationStore};
pub use error::{Error, Result};
#[cfg(feature = "hdf5")]
pub use loaders::load_photon_hdf5;
pub use loaders::{
    load_ni_binary, load_spc, load_spc_with, BhSpcDecoder, LegacyDecoder, LegacyRecords,
};
pub use options::LoadOptions;
pub use reader::MappedFileReader;
pub use registry::{builtin_loader, loader_fn, Loader, LoaderRegistry};

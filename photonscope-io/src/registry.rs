//! Suffix-based loader dispatch.
//!
//! A [`LoaderRegistry`] maps normalized file suffixes (`".h5"`, `".spc"`) to
//! loader functions. Registration needs `&mut self`; dispatch only needs
//! `&self`, so a registry can be shared read-only across threads while
//! [`LoaderRegistry::load_many`] fans out with rayon.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use photonscope_core::Dataset;
use rayon::prelude::*;

use crate::loaders;
use crate::{Error, LoadOptions, Result};

/// Shared loader function.
pub type Loader = Arc<dyn Fn(&Path, &LoadOptions) -> Result<Dataset> + Send + Sync>;

/// Wraps a plain loader function.
#[must_use]
pub fn loader_fn<F>(f: F) -> Loader
where
    F: Fn(&Path, &LoadOptions) -> Result<Dataset> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Built-in loader by name: `ni-binary`, `spc` or `hdf5`.
///
/// Underscores are accepted in place of dashes. Returns `None` for an
/// unknown name or `hdf5` when the feature is disabled.
#[must_use]
pub fn builtin_loader(name: &str) -> Option<Loader> {
    match name.trim().to_lowercase().replace('_', "-").as_str() {
        "ni-binary" | "bin" => Some(loader_fn(loaders::load_ni_binary)),
        "spc" => Some(loader_fn(loaders::load_spc)),
        #[cfg(feature = "hdf5")]
        "hdf5" | "h5" | "photon-hdf5" => Some(loader_fn(loaders::load_photon_hdf5)),
        _ => None,
    }
}

/// Normalizes a suffix to its canonical `".ext"` form.
///
/// # Errors
/// Returns [`Error::InvalidSuffix`] if the suffix is empty after trimming.
pub fn normalize_suffix(suffix: &str) -> Result<String> {
    let s = suffix.trim().to_lowercase();
    if s.is_empty() {
        return Err(Error::InvalidSuffix);
    }
    if s.starts_with('.') {
        Ok(s)
    } else {
        Ok(format!(".{s}"))
    }
}

/// Lowercased suffix of a path including the dot, or `""` if it has none.
#[must_use]
pub fn path_suffix(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Mapping from file suffix to loader.
#[derive(Clone, Default)]
pub struct LoaderRegistry {
    loaders: BTreeMap<String, Loader>,
}

impl fmt::Debug for LoaderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderRegistry")
            .field("suffixes", &self.suffixes())
            .finish()
    }
}

impl LoaderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in adapters bound:
    /// `.bin` (NI binary), `.spc` and, with the `hdf5` feature, `.h5`/`.hdf5`.
    #[must_use]
    pub fn with_builtin_loaders() -> Self {
        let mut map = BTreeMap::new();
        map.insert(".bin".to_string(), loader_fn(loaders::load_ni_binary));
        map.insert(".spc".to_string(), loader_fn(loaders::load_spc));
        #[cfg(feature = "hdf5")]
        {
            let hdf5 = loader_fn(loaders::load_photon_hdf5);
            map.insert(".h5".to_string(), Arc::clone(&hdf5));
            map.insert(".hdf5".to_string(), hdf5);
        }
        Self { loaders: map }
    }

    /// Binds `loader` to each suffix.
    ///
    /// Suffixes are normalized first. All suffixes are validated before any
    /// is bound, so a failed call leaves the registry unchanged.
    ///
    /// # Errors
    /// Returns [`Error::InvalidSuffix`] for an empty suffix and
    /// [`Error::LoaderExists`] if a suffix is taken and `overwrite` is false.
    pub fn register<S: AsRef<str>>(
        &mut self,
        suffixes: &[S],
        loader: Loader,
        overwrite: bool,
    ) -> Result<()> {
        let normalized = suffixes
            .iter()
            .map(|s| normalize_suffix(s.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        if !overwrite {
            if let Some(taken) = normalized.iter().find(|s| self.loaders.contains_key(*s)) {
                return Err(Error::LoaderExists(taken.clone()));
            }
        }

        for suffix in normalized {
            log::debug!("registering loader for {suffix}");
            self.loaders.insert(suffix, Arc::clone(&loader));
        }
        Ok(())
    }

    /// Snapshot of the current bindings.
    #[must_use]
    pub fn available(&self) -> BTreeMap<String, Loader> {
        self.loaders.clone()
    }

    /// Registered suffixes in sorted order.
    #[must_use]
    pub fn suffixes(&self) -> Vec<&str> {
        self.loaders.keys().map(String::as_str).collect()
    }

    /// Loader bound to the suffix of `path`, if any.
    #[must_use]
    pub fn loader_for(&self, path: &Path) -> Option<&Loader> {
        self.loaders.get(&path_suffix(path))
    }

    /// Loads `path` with the loader bound to its suffix.
    ///
    /// # Errors
    /// Returns [`Error::UnknownSuffix`] if nothing is bound to the suffix, or
    /// whatever the loader returns.
    pub fn load(&self, path: &Path, options: &LoadOptions) -> Result<Dataset> {
        let suffix = path_suffix(path);
        match self.loaders.get(&suffix) {
            Some(loader) => loader(path, options),
            None => {
                let known = if self.loaders.is_empty() {
                    "(none)".to_string()
                } else {
                    self.suffixes().join(", ")
                };
                Err(Error::UnknownSuffix { suffix, known })
            }
        }
    }

    /// Loads `path` with an explicit loader, bypassing suffix dispatch.
    ///
    /// # Errors
    /// Returns whatever the loader returns.
    pub fn load_with(path: &Path, loader: &Loader, options: &LoadOptions) -> Result<Dataset> {
        loader(path, options)
    }

    /// Loads every path in parallel, preserving input order.
    ///
    /// # Errors
    /// Returns the first error in input order if any load fails.
    pub fn load_many<P: AsRef<Path> + Sync>(
        &self,
        paths: &[P],
        options: &LoadOptions,
    ) -> Result<Vec<Dataset>> {
        paths
            .par_iter()
            .map(|p| self.load(p.as_ref(), options))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photonscope_core::{EventStream, Metadata, Provenance};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn constant_loader(marker: &'static str) -> Loader {
        loader_fn(move |path, _options| {
            let mut meta = Metadata::new();
            meta.insert("format", marker);
            Ok(Dataset::new(
                EventStream::new(vec![1, 2, 3]),
                meta,
                Provenance::from_path(path),
            ))
        })
    }

    #[test]
    fn test_normalize_suffix() {
        assert_eq!(normalize_suffix("H5").unwrap(), ".h5");
        assert_eq!(normalize_suffix(" .HDF5 ").unwrap(), ".hdf5");
        assert!(matches!(normalize_suffix("  "), Err(Error::InvalidSuffix)));
        assert_eq!(path_suffix(Path::new("/data/Run.SPC")), ".spc");
        assert_eq!(path_suffix(Path::new("/data/run")), "");
    }

    #[test]
    fn test_register_and_dispatch() {
        let mut registry = LoaderRegistry::new();
        registry
            .register(&["h5", ".HDF5"], constant_loader("fake"), false)
            .unwrap();
        assert_eq!(registry.suffixes(), vec![".h5", ".hdf5"]);

        let ds = registry
            .load(Path::new("x.HDF5"), &LoadOptions::default())
            .unwrap();
        assert_eq!(ds.format(), Some("fake"));
        assert_eq!(ds.source(), Some(Path::new("x.HDF5")));
    }

    #[test]
    fn test_unknown_suffix_lists_known() {
        let mut registry = LoaderRegistry::new();
        let err = registry
            .load(Path::new("x.xyz"), &LoadOptions::default())
            .unwrap_err();
        match err {
            Error::UnknownSuffix { suffix, known } => {
                assert_eq!(suffix, ".xyz");
                assert_eq!(known, "(none)");
            }
            other => panic!("unexpected error: {other}"),
        }

        registry
            .register(&[".spc", ".bin"], constant_loader("fake"), false)
            .unwrap();
        let err = registry
            .load(Path::new("x.xyz"), &LoadOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("Known suffixes: .bin, .spc"));
    }

    #[test]
    fn test_register_conflict() {
        let mut registry = LoaderRegistry::new();
        registry
            .register(&[".h5"], constant_loader("first"), false)
            .unwrap();

        let err = registry
            .register(&["csv", "h5"], constant_loader("second"), false)
            .unwrap_err();
        assert!(matches!(err, Error::LoaderExists(ref s) if s == ".h5"));
        // Nothing from the rejected call was bound.
        assert_eq!(registry.suffixes(), vec![".h5"]);

        registry
            .register(&[".h5"], constant_loader("second"), true)
            .unwrap();
        let ds = registry
            .load(Path::new("a.h5"), &LoadOptions::default())
            .unwrap();
        assert_eq!(ds.format(), Some("second"));
    }

    #[test]
    fn test_available_is_a_copy() {
        let mut registry = LoaderRegistry::new();
        registry
            .register(&["bin"], constant_loader("fake"), false)
            .unwrap();
        let mut snapshot = registry.available();
        snapshot.clear();
        assert_eq!(registry.suffixes(), vec![".bin"]);
    }

    #[test]
    fn test_load_with_bypasses_registry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let loader = loader_fn(move |path, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Dataset::new(
                EventStream::default(),
                Metadata::new(),
                Provenance::from_path(path),
            ))
        });
        LoaderRegistry::load_with(Path::new("no_suffix"), &loader, &LoadOptions::default())
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_load_many_preserves_order() {
        let mut registry = LoaderRegistry::new();
        registry
            .register(&["a"], constant_loader("a"), false)
            .unwrap();
        registry
            .register(&["b"], constant_loader("b"), false)
            .unwrap();

        let paths = ["1.a", "2.b", "3.a", "4.b"];
        let datasets = registry
            .load_many(&paths, &LoadOptions::default())
            .unwrap();
        let formats: Vec<_> = datasets.iter().map(|d| d.format().unwrap()).collect();
        assert_eq!(formats, vec!["a", "b", "a", "b"]);

        let err = registry
            .load_many(&["1.a", "2.c"], &LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownSuffix { .. }));
    }

    #[test]
    fn test_builtin_loaders() {
        let registry = LoaderRegistry::with_builtin_loaders();
        let suffixes = registry.suffixes();
        assert!(suffixes.contains(&".bin"));
        assert!(suffixes.contains(&".spc"));
        #[cfg(feature = "hdf5")]
        assert!(suffixes.contains(&".h5") && suffixes.contains(&".hdf5"));

        assert!(builtin_loader("ni_binary").is_some());
        assert!(builtin_loader("SPC").is_some());
        assert!(builtin_loader("tiff").is_none());
    }
}

//! End-to-end loading through the suffix registry.

use std::io::Write;
use std::path::{Path, PathBuf};

use approx::assert_relative_eq;
use photonscope_core::{build_traces, ErrorCategory, TraceOptions};
use photonscope_io::{builtin_loader, Error, LoadOptions, LoaderRegistry};
use tempfile::{tempdir, TempDir};

fn write_ni_rows(dir: &Path, name: &str, rows: &[[u32; 3]]) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    for row in rows {
        for word in row {
            file.write_all(&word.to_le_bytes()).unwrap();
        }
    }
    file.flush().unwrap();
    path
}

fn sample_dir() -> (TempDir, Vec<PathBuf>) {
    let dir = tempdir().unwrap();
    let first = write_ni_rows(
        dir.path(),
        "run_01.bin",
        &[[0, 0, 0], [0, 0, 0], [5, 7, 0], [10, 12, 0], [15, 0, 0]],
    );
    let second = write_ni_rows(
        dir.path(),
        "run_02.BIN",
        &[[0, 0, 100], [0, 0, 50], [0, 0, 1000], [1170, 0, 1150]],
    );
    (dir, vec![first, second])
}

#[test]
fn test_unknown_suffix_is_lookup_error() {
    let registry = LoaderRegistry::with_builtin_loaders();
    let err = registry
        .load(Path::new("/data/measurement.ptu"), &LoadOptions::default())
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Lookup);
    let Error::UnknownSuffix { suffix, known } = err else {
        panic!("expected UnknownSuffix");
    };
    assert_eq!(suffix, ".ptu");
    assert!(known.contains(".bin"));
    assert!(known.contains(".spc"));
}

#[test]
fn test_builtin_dispatch_is_case_insensitive() {
    let (_dir, paths) = sample_dir();
    let registry = LoaderRegistry::with_builtin_loaders();
    let options = LoadOptions::default().with_timing_resolution(1e-8);

    let datasets = registry.load_many(&paths, &options).unwrap();
    assert_eq!(datasets.len(), 2);
    assert_eq!(datasets[0].events().timestamps(), &[0, 2, 5, 7, 10]);
    assert_eq!(datasets[1].events().phases().unwrap(), &[20]);
    for ds in &datasets {
        assert_eq!(ds.format(), Some("ni-binary"));
        assert_relative_eq!(ds.events().timing_resolution().unwrap(), 1e-8);
    }
}

#[test]
fn test_suffixless_file_with_explicit_loader() {
    let dir = tempdir().unwrap();
    let path = write_ni_rows(dir.path(), "run_03", &[[0, 0, 0], [0, 0, 0], [40, 0, 0]]);

    let registry = LoaderRegistry::with_builtin_loaders();
    assert!(registry.load(&path, &LoadOptions::default()).is_err());

    let loader = builtin_loader("ni_binary").unwrap();
    let ds = LoaderRegistry::load_with(&path, &loader, &LoadOptions::default()).unwrap();
    assert_eq!(ds.events().len(), 1);
}

#[test]
fn test_loaded_dataset_feeds_trace_preview() {
    let (_dir, paths) = sample_dir();
    let registry = LoaderRegistry::with_builtin_loaders();
    let ds = registry.load(&paths[0], &LoadOptions::default()).unwrap();

    // 10 ns ticks, 20 ns bins -> ticks [0,2,5,7,10] fall into bins of two ticks.
    let options = TraceOptions::default().with_bin_width_ms(2e-5);
    let traces = build_traces(ds.events(), &options).unwrap();
    assert_eq!(traces.len(), 2);
    assert_eq!(traces[0].total() + traces[1].total(), 5);
}

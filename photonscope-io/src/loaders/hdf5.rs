//! Adapter for Photon-HDF5 containers.
//!
//! Photon data lives in groups named `photon_data*`. Each holds a required
//! `timestamps` array plus optional `detectors` and `nanotimes` arrays of
//! the same length; `timestamps_specs/timestamps_unit` records seconds per
//! tick.

use std::path::Path;

use hdf5::types::{H5Type, VarLenAscii, VarLenUnicode};
use hdf5::{File, Group};
use photonscope_core::{Dataset, EventStream, Metadata, Provenance, Retained};

use crate::{Error, LoadOptions, Result};

const GROUP_PREFIX: &str = "photon_data";

/// Loads one photon group from a Photon-HDF5 file.
///
/// The file is closed before returning unless `options.keep_file_open` is
/// set, in which case the [`hdf5::File`] is moved into the provenance and
/// can be recovered with `provenance.handle::<hdf5::File>()`.
///
/// # Errors
/// Returns [`Error::GroupNotFound`] if the requested group is absent,
/// [`Error::InvalidFormat`] if there are no photon groups or `timestamps` is
/// missing, and [`Error::Hdf5`] for library failures.
pub fn load_photon_hdf5(path: &Path, options: &LoadOptions) -> Result<Dataset> {
    let file = File::open(path)?;
    let members = file.member_names()?;
    let group_name = pick_photon_group(&members, options.group.as_deref(), options.group_index)?;
    let group = file.group(&group_name)?;

    if !group.link_exists("timestamps") {
        return Err(Error::InvalidFormat(format!(
            "dataset '{group_name}/timestamps' not found"
        )));
    }
    let timestamps = read_dataset_vec::<i64>(&group, "timestamps")?;
    let detectors = read_dataset_vec_opt::<i64>(&group, "detectors")?
        .map(|raw| narrow_detectors(&raw))
        .transpose()?;
    let nanotimes = read_dataset_vec_opt::<i64>(&group, "nanotimes")?;
    let file_resolution = read_timestamps_unit(&group)?;

    let mut events = EventStream::new(timestamps);
    if let Some(detectors) = detectors {
        events = events.with_detectors(detectors)?;
    }
    if let Some(nanotimes) = nanotimes {
        events = events.with_phases(nanotimes)?;
    }
    let resolution_source = match (options.timing_resolution, file_resolution) {
        (Some(value), _) => {
            events = events.with_timing_resolution(value)?;
            Some("override")
        }
        (None, Some(value)) => {
            events = events.with_timing_resolution(value)?;
            Some("file")
        }
        (None, None) => None,
    };
    if options.sort_or(false) && events.len() > 1 {
        events = events.sorted_by_time();
    }

    let mut meta = Metadata::new();
    meta.insert("format", "photon-hdf5");
    meta.insert("photon_group", group_name.as_str());
    meta.insert("groups", members);
    meta.insert("timing_resolution_source", resolution_source);
    if options.include_comment && file.link_exists("comment") {
        if let Some(comment) = read_comment(&file) {
            meta.insert("comment", comment);
        }
    }

    log::debug!(
        "loaded {} photons from {}:{group_name}",
        events.len(),
        path.display()
    );

    let mut provenance = Provenance::from_path(path);
    if options.keep_file_open {
        provenance = provenance.with_retained(Retained::Handle(Box::new(file)));
    }

    Ok(Dataset::new(events, meta, provenance))
}

/// Chooses the photon group: the explicit name if given, otherwise the
/// `index`-th `photon_data*` member in sorted order.
///
/// # Errors
/// Returns [`Error::GroupNotFound`] for a missing name or an out-of-range
/// index, and [`Error::InvalidFormat`] if no photon group exists.
pub fn pick_photon_group(members: &[String], group: Option<&str>, index: usize) -> Result<String> {
    if let Some(name) = group {
        return if members.iter().any(|m| m == name) {
            Ok(name.to_string())
        } else {
            Err(Error::GroupNotFound(format!(
                "requested group '{name}' not found in file"
            )))
        };
    }

    let mut candidates: Vec<&String> = members
        .iter()
        .filter(|m| m.starts_with(GROUP_PREFIX))
        .collect();
    if candidates.is_empty() {
        return Err(Error::InvalidFormat(format!(
            "no group starting with '{GROUP_PREFIX}' found"
        )));
    }
    candidates.sort();

    candidates.get(index).map(|name| (*name).clone()).ok_or_else(|| {
        Error::GroupNotFound(format!(
            "group_index={index} out of range. Available: {candidates:?}"
        ))
    })
}

fn narrow_detectors(raw: &[i64]) -> Result<Vec<u8>> {
    raw.iter()
        .map(|&d| {
            u8::try_from(d).map_err(|_| {
                Error::InvalidFormat(format!("detector id {d} outside 0..=255"))
            })
        })
        .collect()
}

fn read_timestamps_unit(group: &Group) -> Result<Option<f64>> {
    if !group.link_exists("timestamps_specs") {
        return Ok(None);
    }
    let specs = group.group("timestamps_specs")?;
    if !specs.link_exists("timestamps_unit") {
        return Ok(None);
    }
    Ok(Some(specs.dataset("timestamps_unit")?.read_scalar::<f64>()?))
}

fn read_comment(file: &File) -> Option<String> {
    let dataset = file.dataset("comment").ok()?;
    if let Ok(value) = dataset.read_scalar::<VarLenUnicode>() {
        return Some(value.to_string());
    }
    match dataset.read_scalar::<VarLenAscii>() {
        Ok(value) => Some(value.to_string()),
        Err(e) => {
            log::warn!("ignoring unreadable /comment: {e}");
            None
        }
    }
}

fn read_dataset_vec<T: H5Type>(group: &Group, name: &str) -> Result<Vec<T>> {
    let dataset = group.dataset(name)?;
    Ok(dataset.read_raw::<T>()?)
}

fn read_dataset_vec_opt<T: H5Type>(group: &Group, name: &str) -> Result<Option<Vec<T>>> {
    if !group.link_exists(name) {
        return Ok(None);
    }
    read_dataset_vec(group, name).map(Some)
}

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use wire::Sample;

/// The hierarchical container `measure_paths` writes into: groups with
/// string-keyed attributes, and fixed-shape datasets addressed by path and
/// row. No on-disk format is implemented here; this is the boundary an
/// operator wires a real HDF5/NetCDF-equivalent crate into.
pub trait SampleStore: Send {
    fn create_group(&mut self, path: &str);
    fn set_attrs(&mut self, path: &str, attrs: &[(String, String)]);
    fn write_dataset_f32(&mut self, path: &str, row: usize, data: &[f32]);
    fn write_dataset_samples(&mut self, path: &str, row: usize, data: &[Sample]);
}

/// In-memory `SampleStore` used by the test suite (and available to an
/// operator who wants to run without a real backing store).
#[derive(Default)]
pub struct MemoryStore {
    groups: HashMap<String, Vec<(String, String)>>,
    f32_datasets: HashMap<String, Vec<Vec<f32>>>,
    sample_datasets: HashMap<String, Vec<Vec<Sample>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group_attrs(&self, path: &str) -> Option<&[(String, String)]> {
        self.groups.get(path).map(|v| v.as_slice())
    }

    pub fn f32_dataset(&self, path: &str) -> Option<&[Vec<f32>]> {
        self.f32_datasets.get(path).map(|v| v.as_slice())
    }

    pub fn sample_dataset(&self, path: &str) -> Option<&[Vec<Sample>]> {
        self.sample_datasets.get(path).map(|v| v.as_slice())
    }
}

impl SampleStore for MemoryStore {
    fn create_group(&mut self, path: &str) {
        self.groups.entry(path.to_string()).or_default();
    }

    fn set_attrs(&mut self, path: &str, attrs: &[(String, String)]) {
        self.groups.entry(path.to_string()).or_default().extend(attrs.iter().cloned());
    }

    fn write_dataset_f32(&mut self, path: &str, row: usize, data: &[f32]) {
        let rows = self.f32_datasets.entry(path.to_string()).or_default();
        if rows.len() <= row {
            rows.resize(row + 1, Vec::new());
        }
        rows[row] = data.to_vec();
    }

    fn write_dataset_samples(&mut self, path: &str, row: usize, data: &[Sample]) {
        let rows = self.sample_datasets.entry(path.to_string()).or_default();
        if rows.len() <= row {
            rows.resize(row + 1, Vec::new());
        }
        rows[row] = data.to_vec();
    }
}

/// A cloneable handle around a `MemoryStore`, so a caller can hand one end
/// to a `Driver` and keep the other to inspect what got written. The
/// `Box<dyn SampleStore>` the driver holds can't otherwise be downcast.
#[derive(Clone, Default)]
pub struct SharedMemoryStore(Arc<Mutex<MemoryStore>>);

impl SharedMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn f32_dataset(&self, path: &str) -> Option<Vec<Vec<f32>>> {
        self.0.lock().unwrap().f32_dataset(path).map(|rows| rows.to_vec())
    }
}

impl SampleStore for SharedMemoryStore {
    fn create_group(&mut self, path: &str) {
        self.0.lock().unwrap().create_group(path);
    }

    fn set_attrs(&mut self, path: &str, attrs: &[(String, String)]) {
        self.0.lock().unwrap().set_attrs(path, attrs);
    }

    fn write_dataset_f32(&mut self, path: &str, row: usize, data: &[f32]) {
        self.0.lock().unwrap().write_dataset_f32(path, row, data);
    }

    fn write_dataset_samples(&mut self, path: &str, row: usize, data: &[Sample]) {
        self.0.lock().unwrap().write_dataset_samples(path, row, data);
    }
}

use roofline_engine::GpuSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::error::CliError;

/// (name, peak TFLOP/s, GB/s, GB)
///
/// Peak compute is the datasheet headline figure: dense FP16 tensor throughput
/// for the discrete GPUs, INT8 sparse TOPS for the Jetson modules.
const BUILTIN_GPUS: [(&str, f64, f64, f64); 9] = [
    ("T4", 65.0, 300.0, 16.0),
    ("A10G", 125.0, 600.0, 24.0),
    ("L4", 121.0, 300.0, 24.0),
    ("A100-40GB", 312.0, 1555.0, 40.0),
    ("A100-80GB", 312.0, 2039.0, 80.0),
    ("H100-SXM", 989.0, 3350.0, 80.0),
    ("RTX-4090", 165.0, 1008.0, 24.0),
    ("Jetson-AGX-Orin-64GB", 275.0, 204.8, 64.0),
    ("Jetson-Orin-Nano-8GB", 40.0, 68.0, 8.0),
];

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GpuFile {
    pub gpus: BTreeMap<String, GpuEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuEntry {
    pub compute_tflops: f64,
    pub memory_bandwidth_gbs: f64,
    pub memory_size_gb: f64,
}

impl GpuEntry {
    pub fn to_spec(&self, name: &str) -> GpuSpec {
        GpuSpec::new(name, self.compute_tflops, self.memory_bandwidth_gbs, self.memory_size_gb)
    }
}

pub fn builtin_gpus() -> Vec<GpuSpec> {
    BUILTIN_GPUS
        .iter()
        .map(|&(name, compute, bandwidth, memory)| GpuSpec::new(name, compute, bandwidth, memory))
        .collect()
}

/// A missing file is an empty catalog; an unreadable one is an error.
pub fn load_gpu_file(file_path: &Path) -> Result<GpuFile, CliError> {
    if !file_path.exists() {
        log::debug!("GPU file '{}' does not exist, using built-in GPUs only", file_path.display());
        return Ok(GpuFile::default());
    }

    let file = File::open(file_path).map_err(|source| CliError::GpuFileIo {
        path: file_path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|source| CliError::GpuFileFormat {
        path: file_path.to_path_buf(),
        source,
    })
}

pub fn save_gpu_file(gpus: &GpuFile, file_path: &Path) -> Result<(), CliError> {
    let io_error = |source| CliError::GpuFileIo {
        path: file_path.to_path_buf(),
        source,
    };

    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(file_path)
        .map_err(io_error)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, gpus).map_err(|source| CliError::GpuFileFormat {
        path: file_path.to_path_buf(),
        source,
    })
}

/// Built-in GPUs followed by user entries; a user entry replaces a built-in
/// GPU of the same name.
pub fn catalog(user: &GpuFile) -> Vec<GpuSpec> {
    let mut gpus: Vec<GpuSpec> = builtin_gpus()
        .into_iter()
        .filter(|gpu| !user.gpus.keys().any(|name| name.eq_ignore_ascii_case(&gpu.name)))
        .collect();
    gpus.extend(user.gpus.iter().map(|(name, entry)| entry.to_spec(name)));
    gpus
}

pub fn find_gpu(user: &GpuFile, name: &str) -> Result<GpuSpec, CliError> {
    catalog(user)
        .into_iter()
        .find(|gpu| gpu.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| CliError::UnknownGpu(name.to_string()))
}

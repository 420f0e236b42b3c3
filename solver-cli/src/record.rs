//! On-disk sample layout.
//!
//! `input.bin` / `target.bin`: raw little-endian f32, sample i at byte
//! offset i·N²·4. `meta.jsonl`: one [`MetaRow`] per sample, same order.

use anyhow::{Context, Result, ensure};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

pub const INPUT_FILE: &str = "input.bin";
pub const TARGET_FILE: &str = "target.bin";
pub const META_FILE: &str = "meta.jsonl";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Val,
    Test,
    /// Configurations outside the training range.
    Ood,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaRow {
    pub global_sample_idx: u64,
    pub split: Split,

    pub traj_idx: usize,
    pub step_idx: usize,

    pub base_seed: u64,
    pub traj_seed: u64,

    pub n: usize,
    pub dx: f64,

    pub alpha: f64,
    pub mu: f64,
    pub tau: f64,

    pub s_ref: f64,
    pub k_used_ref: u32,
    pub compute_ms: f64,

    pub ic_type: String,
}

/// Appends (input, target, meta) triples to three sinks.
pub struct DatasetWriter<W: Write> {
    input: W,
    target: W,
    meta: W,
    cells: usize,
    samples: u64,
}

impl DatasetWriter<BufWriter<File>> {
    /// Creates (truncating) the three files under `dir`.
    pub fn create(dir: &Path, n: usize) -> Result<Self> {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        let open = |name: &str| -> Result<BufWriter<File>> {
            let path = dir.join(name);
            let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
            Ok(BufWriter::new(file))
        };
        Ok(DatasetWriter::new(open(INPUT_FILE)?, open(TARGET_FILE)?, open(META_FILE)?, n))
    }
}

impl<W: Write> DatasetWriter<W> {
    pub fn new(input: W, target: W, meta: W, n: usize) -> Self {
        DatasetWriter {
            input,
            target,
            meta,
            cells: n * n,
            samples: 0,
        }
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn write_sample(&mut self, input: &[f32], target: &[f32], row: &MetaRow) -> Result<()> {
        ensure!(
            input.len() == self.cells && target.len() == self.cells,
            "sample has {}/{} values, expected {}",
            input.len(),
            target.len(),
            self.cells
        );
        ensure!(
            row.global_sample_idx == self.samples,
            "meta row index {} out of order (next is {})",
            row.global_sample_idx,
            self.samples
        );

        write_f32_le(&mut self.input, input).context("writing input sample")?;
        write_f32_le(&mut self.target, target).context("writing target sample")?;
        serde_json::to_writer(&mut self.meta, row).context("writing meta row")?;
        self.meta.write_all(b"\n")?;

        self.samples += 1;
        Ok(())
    }

    /// Flushes all sinks and returns the sample count.
    pub fn finish(mut self) -> Result<u64> {
        self.input.flush()?;
        self.target.flush()?;
        self.meta.flush()?;
        Ok(self.samples)
    }
}

fn write_f32_le<W: Write>(w: &mut W, values: &[f32]) -> std::io::Result<()> {
    for &v in values {
        w.write_all(&v.to_le_bytes())?;
    }
    Ok(())
}

/// Random access to samples of one binary file.
pub struct SampleReader<R> {
    inner: R,
    cells: usize,
}

impl<R: Read + Seek> SampleReader<R> {
    pub fn new(inner: R, n: usize) -> Self {
        SampleReader { inner, cells: n * n }
    }

    pub fn sample_bytes(&self) -> u64 {
        (self.cells * 4) as u64
    }

    pub fn sample_count(&mut self) -> Result<u64> {
        let end = self.inner.seek(SeekFrom::End(0))?;
        ensure!(
            end % self.sample_bytes() == 0,
            "file length {end} is not a multiple of {} bytes",
            self.sample_bytes()
        );
        Ok(end / self.sample_bytes())
    }

    pub fn read(&mut self, index: u64) -> Result<Vec<f32>> {
        self.inner
            .seek(SeekFrom::Start(index * self.sample_bytes()))?;
        let mut bytes = vec![0u8; self.cells * 4];
        self.inner
            .read_exact(&mut bytes)
            .with_context(|| format!("reading sample {index}"))?;
        Ok(bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect())
    }
}

/// Parses "2,5,10,20": blanks skipped, values > 0, sorted, deduplicated.
pub fn parse_mu_set(s: &str) -> Result<Vec<f64>> {
    let mut out = Vec::new();
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let v: f64 = part
            .parse()
            .with_context(|| format!("mu value {part:?} is not a number"))?;
        ensure!(v.is_finite() && v > 0.0, "mu values must be > 0, got {v}");
        out.push(v);
    }
    ensure!(!out.is_empty(), "mu set {s:?} is empty");
    out.sort_by(f64::total_cmp);
    out.dedup();
    Ok(out)
}

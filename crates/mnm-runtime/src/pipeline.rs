use std::path::Path;

use arrow::record_batch::RecordBatch;
use mnm_config::ProjectConfig;
use mnm_core::frame::concat;
use mnm_core::{CoreResult, FilterDataBasedOnTime, ResampleData};
use orion_error::prelude::*;
use orion_error::ErrorOwe;

use crate::error::{RuntimeReason, RuntimeResult};
use crate::ipc::{read_ipc_file, write_ipc_file};

// ---------------------------------------------------------------------------
// Pipeline — filter → resample built from `mnm.toml`
// ---------------------------------------------------------------------------

/// The configured time filter and resampler.
///
/// When both are present the filter runs inside the resampler, after window
/// completeness has been measured on the unfiltered rows.
#[derive(Debug, Clone)]
pub struct Pipeline {
    filter: Option<FilterDataBasedOnTime>,
    resample: Option<ResampleData>,
}

impl Pipeline {
    pub fn from_config(config: &ProjectConfig) -> RuntimeResult<Self> {
        if config.filter.is_none() && config.resample.is_none() {
            return StructError::from(RuntimeReason::Bootstrap)
                .with_detail("configuration needs a [filter] or [resample] section")
                .err();
        }
        let filter = config
            .filter
            .as_ref()
            .map(FilterDataBasedOnTime::from_config)
            .transpose()
            .err_conv()?;
        let resample = config
            .resample
            .as_ref()
            .map(ResampleData::from_config)
            .transpose()
            .err_conv()?;

        mnm_info!(
            conf,
            patterns = filter.as_ref().map_or(0, |f| f.patterns().len()),
            every = config.resample.as_ref().map_or("-", |r| r.every.as_str()),
            "pipeline built"
        );
        Ok(Self { filter, resample })
    }

    /// Load `path` as `mnm.toml` and build the pipeline it describes.
    pub fn load(path: &Path) -> RuntimeResult<Self> {
        let config = ProjectConfig::load(path)
            .owe_conf()
            .position(path.display().to_string())?;
        mnm_debug!(conf, path = %path.display(), "configuration loaded");
        Self::from_config(&config)
    }

    pub fn filter(&self) -> Option<&FilterDataBasedOnTime> {
        self.filter.as_ref()
    }

    pub fn resample(&self) -> Option<&ResampleData> {
        self.resample.as_ref()
    }

    pub fn run(&self, batch: &RecordBatch) -> RuntimeResult<RecordBatch> {
        let result: CoreResult<RecordBatch> = match (&self.filter, &self.resample) {
            (Some(f), Some(r)) => r.transform_filtered(batch, f),
            (None, Some(r)) => r.transform(batch),
            (Some(f), None) => f.transform(batch),
            (None, None) => Ok(batch.clone()),
        };
        let out = result
            .inspect_err(|e| mnm_warn!(pipe, error = %e, "pipeline run failed"))
            .err_conv()?;
        mnm_info!(
            pipe,
            rows_in = batch.num_rows(),
            rows_out = out.num_rows(),
            "pipeline run finished"
        );
        Ok(out)
    }

    /// Concatenate `batches` and run them as one.
    pub fn run_batches(&self, batches: &[RecordBatch]) -> RuntimeResult<RecordBatch> {
        let batch = concat(batches).err_conv()?;
        self.run(&batch)
    }

    /// Run an Arrow IPC file through the pipeline and write the result to
    /// `output` as an Arrow IPC file.
    pub fn run_file(&self, input: &Path, output: &Path) -> RuntimeResult<RecordBatch> {
        let batches = read_ipc_file(input)
            .owe_data()
            .position(input.display().to_string())?;
        mnm_debug!(pipe, input = %input.display(), batches = batches.len(), "input read");
        let out = self.run_batches(&batches)?;
        write_ipc_file(output, &out)
            .owe_sys()
            .position(output.display().to_string())?;
        mnm_debug!(pipe, output = %output.display(), rows = out.num_rows(), "output written");
        Ok(out)
    }
}

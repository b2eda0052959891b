use std::fs::File;
use std::path::Path;

use arrow::ipc::reader::FileReader;
use arrow::ipc::writer::FileWriter;
use arrow::record_batch::RecordBatch;

/// Read every batch of an Arrow IPC file.
pub fn read_ipc_file(path: &Path) -> anyhow::Result<Vec<RecordBatch>> {
    let file = File::open(path)
        .map_err(|e| anyhow::anyhow!("failed to open {}: {e}", path.display()))?;
    let reader = FileReader::try_new(file, None)?;
    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    if batches.is_empty() {
        anyhow::bail!("{} contains no record batches", path.display());
    }
    Ok(batches)
}

/// Write `batch` as a single-batch Arrow IPC file, creating parent
/// directories as needed.
pub fn write_ipc_file(path: &Path, batch: &RecordBatch) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)
        .map_err(|e| anyhow::anyhow!("failed to create {}: {e}", path.display()))?;
    let mut writer = FileWriter::try_new(file, batch.schema().as_ref())?;
    writer.write(batch)?;
    writer.finish()?;
    Ok(())
}

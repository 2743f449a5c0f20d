use std::io::Write;

use crate::error::ProcError;
use crate::model::ProcessDescriptor;

/// Write the snapshot as a pretty-printed JSON array.
pub fn write_json(
    rows: &[&ProcessDescriptor],
    writer: &mut impl Write,
) -> Result<(), ProcError> {
    serde_json::to_writer_pretty(&mut *writer, rows)
        .map_err(|e| ProcError::Serialization(std::io::Error::other(e.to_string())))?;
    writeln!(writer).map_err(ProcError::Serialization)
}

use std::io::Write;

use crate::error::ProcError;
use crate::model::ProcessDescriptor;
use crate::output::joined_arguments;

/// Write the snapshot as TSV.
///
/// Output: header row + one data row per process.
/// Columns are tab-separated: pid, executable, arguments, env_vars.
/// Unavailable fields are printed as `-`; env_vars is a count.
pub fn write_tsv(
    rows: &[&ProcessDescriptor],
    writer: &mut impl Write,
) -> Result<(), ProcError> {
    writeln!(writer, "pid\texecutable\targuments\tenv_vars").map_err(ProcError::Serialization)?;

    for p in rows {
        let executable = p
            .executable_path()
            .into_option()
            .map(|path| escape_tsv(&path.to_string_lossy()))
            .unwrap_or_else(|| "-".to_string());
        let arguments = joined_arguments(p)
            .map(|a| escape_tsv(&a))
            .unwrap_or_else(|| "-".to_string());
        let env_vars = p
            .environment_variables()
            .as_option()
            .map(|env| env.len().to_string())
            .unwrap_or_else(|| "-".to_string());

        writeln!(writer, "{}\t{}\t{}\t{}", p.id(), executable, arguments, env_vars)
            .map_err(ProcError::Serialization)?;
    }

    Ok(())
}

/// Escape tabs and newlines in a string for TSV output.
fn escape_tsv(s: &str) -> String {
    s.replace(['\t', '\n', '\r'], " ")
}

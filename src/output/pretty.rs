use std::io::Write;

use crate::error::ProcError;
use crate::model::ProcessDescriptor;
use crate::output::joined_arguments;

const PATH_WIDTH: usize = 40;
const ARGS_WIDTH: usize = 40;

/// Write the snapshot in a human-readable table format.
///
/// Unavailable fields are shown as `?`. The footer counts processes and how
/// many of them had at least one unreadable field.
pub fn write_pretty(
    rows: &[&ProcessDescriptor],
    writer: &mut impl Write,
) -> Result<(), ProcError> {
    write_pretty_inner(rows, writer).map_err(ProcError::Serialization)
}

fn write_pretty_inner(
    rows: &[&ProcessDescriptor],
    w: &mut impl Write,
) -> Result<(), std::io::Error> {
    writeln!(w, "Running Processes")?;
    writeln!(w, "{}", "=".repeat(92))?;
    writeln!(
        w,
        "{:<8} {:<PATH_WIDTH$} {:<ARGS_WIDTH$}",
        "PID", "EXECUTABLE", "ARGS"
    )?;
    writeln!(w, "{}", "-".repeat(92))?;

    for p in rows {
        let path = p
            .executable_path()
            .into_option()
            .map(|path| path.to_string_lossy().into_owned())
            .unwrap_or_else(|| "?".to_string());
        let args = joined_arguments(p).unwrap_or_else(|| "?".to_string());
        writeln!(
            w,
            "{:<8} {:<PATH_WIDTH$} {}",
            p.id(),
            truncate(&path, PATH_WIDTH),
            truncate(&args, ARGS_WIDTH),
        )?;
    }

    if rows.is_empty() {
        writeln!(w, "(no processes visible)")?;
    }

    let degraded = rows.iter().filter(|p| p.is_degraded()).count();
    writeln!(w, "{}", "-".repeat(92))?;
    writeln!(
        w,
        "{} processes, {} with unavailable detail",
        rows.len(),
        degraded
    )?;

    Ok(())
}

/// Truncate to at most `max` characters, marking the cut with "...".
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

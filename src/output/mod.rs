pub mod json;
pub mod pretty;
pub mod tsv;

use std::io::Write;

use crate::cli::{OutputFormat, SortColumn};
use crate::error::ProcError;
use crate::model::{Detail, ProcessDescriptor};

/// Write a process snapshot in the specified format and row order.
pub fn write_snapshot(
    processes: &[ProcessDescriptor],
    format: OutputFormat,
    sort: SortColumn,
    writer: &mut impl Write,
) -> Result<(), ProcError> {
    let rows = sorted(processes, sort);
    match format {
        OutputFormat::Tsv => tsv::write_tsv(&rows, writer),
        OutputFormat::Json => json::write_json(&rows, writer),
        OutputFormat::Pretty => pretty::write_pretty(&rows, writer),
    }
}

/// Order rows for display. Unavailable paths sort after every known path.
fn sorted(processes: &[ProcessDescriptor], sort: SortColumn) -> Vec<&ProcessDescriptor> {
    let mut rows: Vec<_> = processes.iter().collect();
    match sort {
        SortColumn::Pid => rows.sort_by_key(|p| p.id()),
        SortColumn::Path => rows.sort_by(|a, b| {
            let key = |p: &ProcessDescriptor| match p.executable_path() {
                Detail::Available(path) => (0, Some(path.to_path_buf())),
                Detail::Unavailable => (1, None),
            };
            key(*a).cmp(&key(*b)).then(a.id().cmp(&b.id()))
        }),
    }
    rows
}

/// Join arguments for single-line display, or None when unavailable.
pub(crate) fn joined_arguments(p: &ProcessDescriptor) -> Option<String> {
    p.arguments().as_option().map(|args| args.join(" "))
}


#[cfg(test)]
mod tests {
    use super::*;

    fn ids(rows: &[&ProcessDescriptor]) -> Vec<u32> {
        rows.iter().map(|p| p.id()).collect()
    }

    #[test]
    fn sort_by_pid() {
        let procs = fixtures::sample();
        assert_eq!(ids(&sorted(&procs, SortColumn::Pid)), vec![1, 7, 42]);
    }

    #[test]
    fn sort_by_path_puts_unavailable_last() {
        let procs = fixtures::sample();
        assert_eq!(ids(&sorted(&procs, SortColumn::Path)), vec![1, 42, 7]);
    }

    #[test]
    fn joined_arguments_unavailable() {
        let procs = fixtures::sample();
        assert_eq!(joined_arguments(&procs[0]).as_deref(), Some("-l"));
        assert_eq!(joined_arguments(&procs[1]), None);
    }
}

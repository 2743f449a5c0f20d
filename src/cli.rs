use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "procview",
    version,
    about = "Print a snapshot of running processes: pid, executable, arguments, environment"
)]
pub struct Cli {
    /// Output format [default: tsv]
    #[arg(long, default_value = "tsv")]
    pub format: OutputFormat,

    /// Order of printed rows [default: pid]
    #[arg(long, default_value = "pid")]
    pub sort: SortColumn,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Tsv,
    Json,
    Pretty,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Pid,
    Path,
}

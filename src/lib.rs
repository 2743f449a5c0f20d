//! Read-only snapshots of the running process table.
//!
//! ```no_run
//! for p in procview::list_processes()? {
//!     println!("{} {:?}", p.id(), p.executable_path());
//! }
//! # Ok::<(), procview::error::ProcError>(())
//! ```

pub mod cli;
pub mod error;
pub mod model;
pub mod output;
pub mod process;

pub use error::ProcError;
pub use model::{Detail, Environment, ProcessDescriptor};
pub use process::list_processes;

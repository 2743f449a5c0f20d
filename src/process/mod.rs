// Platform-abstracted process table enumeration.
//
// The enumerator is written once against `ProcessTableSource`, the single
// OS-facing "read process table" capability. Each platform supplies one:
//   - Linux/Android: procfs (reads /proc/<pid>/{exe,cmdline,environ})
//   - macOS: libproc + sysctl(KERN_PROCARGS2)
//   - Windows: Toolhelp snapshot + QueryFullProcessImageNameW
//
// All platforms export:
//   - list_processes() -> Result<Vec<ProcessDescriptor>, ProcError>

pub mod parse;
pub mod procfs;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "windows")]
pub mod windows;

use std::collections::HashSet;
use std::io;
use std::path::PathBuf;

use crate::error::ProcError;
use crate::model::{Detail, Environment, ProcessDescriptor};

pub use procfs::ProcFs;

#[cfg(any(target_os = "linux", target_os = "android"))]
pub type NativeSource = procfs::ProcFs;
#[cfg(target_os = "macos")]
pub type NativeSource = macos::LibProc;
#[cfg(target_os = "windows")]
pub type NativeSource = windows::Toolhelp;
#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "windows"
)))]
pub type NativeSource = Unsupported;

/// Raw per-process reads, one result per detail field.
#[derive(Debug)]
pub struct RawProcess {
    pub pid: u32,
    pub executable_path: io::Result<PathBuf>,
    /// Full argv, including the program name.
    pub argv: io::Result<Vec<String>>,
    pub environment: io::Result<Environment>,
}

impl RawProcess {
    /// A raw record where every field failed with the same error kind.
    pub fn failed(pid: u32, kind: io::ErrorKind) -> Self {
        Self {
            pid,
            executable_path: Err(io::Error::from(kind)),
            argv: Err(io::Error::from(kind)),
            environment: Err(io::Error::from(kind)),
        }
    }

    /// Whether any read reported the process as missing.
    fn saw_not_found(&self) -> bool {
        let not_found = |e: &io::Error| e.kind() == io::ErrorKind::NotFound;
        self.executable_path.as_ref().err().is_some_and(not_found)
            || self.argv.as_ref().err().is_some_and(not_found)
            || self.environment.as_ref().err().is_some_and(not_found)
    }

    fn into_descriptor(self) -> ProcessDescriptor {
        let pid = self.pid;
        if let Err(e) = &self.executable_path {
            log::debug!("pid {pid}: executable path unavailable: {e}");
        }
        if let Err(e) = &self.argv {
            log::debug!("pid {pid}: arguments unavailable: {e}");
        }
        if let Err(e) = &self.environment {
            log::debug!("pid {pid}: environment unavailable: {e}");
        }

        let arguments = self.argv.map(|argv| argv.into_iter().skip(1).collect());
        ProcessDescriptor::new(
            pid,
            self.executable_path.into(),
            arguments.into(),
            self.environment.into(),
        )
    }
}

/// The "read process table" capability.
pub trait ProcessTableSource {
    /// List the pids of every process visible to the caller.
    fn pids(&self) -> Result<Vec<u32>, ProcError>;

    /// Read the detail fields of one process. Failures are per field.
    fn read_process(&self, pid: u32) -> RawProcess;

    /// Whether the pid still names a live process.
    fn is_alive(&self, _pid: u32) -> bool {
        true
    }
}

/// Take a snapshot of every process visible to the caller.
pub fn list_processes() -> Result<Vec<ProcessDescriptor>, ProcError> {
    enumerate(&NativeSource::default())
}

/// Take a snapshot through an arbitrary source.
///
/// Processes whose detail cannot be read are kept with `Detail::Unavailable`
/// fields. Processes that exit between listing and reading are dropped.
pub fn enumerate<S>(source: &S) -> Result<Vec<ProcessDescriptor>, ProcError>
where
    S: ProcessTableSource + ?Sized,
{
    let pids = source.pids()?;
    let mut seen = HashSet::with_capacity(pids.len());
    let mut processes = Vec::with_capacity(pids.len());

    for pid in pids {
        if !seen.insert(pid) {
            log::warn!("pid {pid} listed twice, keeping the first entry");
            continue;
        }

        let raw = source.read_process(pid);
        if raw.saw_not_found() && !source.is_alive(pid) {
            log::debug!("pid {pid}: exited during enumeration, skipping");
            continue;
        }
        processes.push(raw.into_descriptor());
    }

    log::debug!("enumerated {} processes", processes.len());
    Ok(processes)
}

/// Source for targets without a process table backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unsupported;

impl ProcessTableSource for Unsupported {
    fn pids(&self) -> Result<Vec<u32>, ProcError> {
        Err(ProcError::Unavailable(
            "process enumeration is not supported on this platform".to_string(),
        ))
    }

    fn read_process(&self, pid: u32) -> RawProcess {
        RawProcess::failed(pid, io::ErrorKind::Unsupported)
    }
}

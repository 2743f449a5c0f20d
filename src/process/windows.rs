// Windows process table — Toolhelp snapshot for pids, image name per process.
//
// Arguments and environment live in the target's PEB. sysinfo reads them
// (PROCESS_QUERY_INFORMATION | PROCESS_VM_READ) and hands back empty lists
// when access is refused; an empty command line or environment is therefore
// reported as a permission failure.

use std::ffi::OsString;
use std::io;
use std::os::windows::ffi::OsStringExt;
use std::path::PathBuf;

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};
use windows_sys::Win32::Foundation::{
    CloseHandle, ERROR_INVALID_PARAMETER, HANDLE, INVALID_HANDLE_VALUE,
};
use windows_sys::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, PROCESSENTRY32W, Process32FirstW, Process32NextW,
    TH32CS_SNAPPROCESS,
};
use windows_sys::Win32::System::Threading::{
    OpenProcess, PROCESS_NAME_WIN32, PROCESS_QUERY_LIMITED_INFORMATION,
    QueryFullProcessImageNameW,
};

use crate::error::ProcError;
use crate::model::Environment;
use crate::process::parse;
use crate::process::{ProcessTableSource, RawProcess};

// MAX_PATH is too short for long-path-aware images.
const IMAGE_NAME_CAPACITY: usize = 32_768;

/// Process table backed by CreateToolhelp32Snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct Toolhelp;

impl ProcessTableSource for Toolhelp {
    fn pids(&self) -> Result<Vec<u32>, ProcError> {
        let snapshot = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) };
        if snapshot == INVALID_HANDLE_VALUE {
            let err = io::Error::last_os_error();
            return Err(ProcError::from_list_error("CreateToolhelp32Snapshot", err));
        }
        let snapshot = Handle(snapshot);

        let mut entry: PROCESSENTRY32W = unsafe { std::mem::zeroed() };
        entry.dwSize = std::mem::size_of::<PROCESSENTRY32W>() as u32;

        let mut pids = Vec::new();
        if unsafe { Process32FirstW(snapshot.0, &mut entry) } != 0 {
            loop {
                pids.push(entry.th32ProcessID);

                if unsafe { Process32NextW(snapshot.0, &mut entry) } == 0 {
                    break;
                }
            }
        }

        Ok(pids)
    }

    fn read_process(&self, pid: u32) -> RawProcess {
        let (argv, environment) = command_and_environment(pid);
        RawProcess {
            pid,
            executable_path: image_path(pid),
            argv,
            environment,
        }
    }

    /// OpenProcess rejects pid 0 (System Idle) with the same error it uses for
    /// exited pids, so liveness comes from a fresh Toolhelp snapshot instead.
    fn is_alive(&self, pid: u32) -> bool {
        match self.pids() {
            Ok(pids) => pids.contains(&pid),
            Err(_) => true,
        }
    }
}

/// Closes the wrapped handle on drop.
struct Handle(HANDLE);

impl Drop for Handle {
    fn drop(&mut self) {
        unsafe { CloseHandle(self.0) };
    }
}

fn open_limited(pid: u32) -> io::Result<Handle> {
    let handle = unsafe { OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, 0, pid) };
    if handle.is_null() {
        let err = io::Error::last_os_error();
        // OpenProcess reports a pid that no longer exists as an invalid parameter.
        if err.raw_os_error() == Some(ERROR_INVALID_PARAMETER as i32) {
            return Err(io::Error::new(io::ErrorKind::NotFound, err));
        }
        return Err(err);
    }
    Ok(Handle(handle))
}

fn image_path(pid: u32) -> io::Result<PathBuf> {
    let process = open_limited(pid)?;
    let mut buf = vec![0u16; IMAGE_NAME_CAPACITY];
    let mut len = buf.len() as u32;

    let ok = unsafe {
        QueryFullProcessImageNameW(process.0, PROCESS_NAME_WIN32, buf.as_mut_ptr(), &mut len)
    };
    if ok == 0 {
        return Err(io::Error::last_os_error());
    }

    buf.truncate(len as usize);
    Ok(wide_to_path(&buf))
}

fn command_and_environment(pid: u32) -> (io::Result<Vec<String>>, io::Result<Environment>) {
    let target = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[target]),
        true,
        ProcessRefreshKind::nothing()
            .with_cmd(UpdateKind::Always)
            .with_environ(UpdateKind::Always),
    );

    let Some(process) = system.process(target) else {
        return (
            Err(io::Error::from(io::ErrorKind::NotFound)),
            Err(io::Error::from(io::ErrorKind::NotFound)),
        );
    };

    let argv = lossy_strings(process.cmd());
    let environ = lossy_strings(process.environ());
    (
        non_empty(argv, "command line"),
        non_empty(environ, "environment").map(parse::collect_environment),
    )
}

fn lossy_strings(items: &[OsString]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.to_string_lossy().into_owned())
        .collect()
}

/// Every user-mode process has at least argv[0] and some environment; an
/// empty read means the PEB could not be opened.
fn non_empty(items: Vec<String>, what: &str) -> io::Result<Vec<String>> {
    if items.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            format!("process {what} not readable"),
        ));
    }
    Ok(items)
}

fn wide_to_path(wide: &[u16]) -> PathBuf {
    let os = OsString::from_wide(wide);
    PathBuf::from(os.to_string_lossy().into_owned())
}

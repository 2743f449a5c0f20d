// macOS process table — libproc for pids and paths, sysctl for argv/env.
//
// KERN_PROCARGS2 returns argc, the exec path, argv and the environment in one
// buffer. The kernel only serves it for processes owned by the caller (or to
// root); other processes fail with EINVAL/EPERM and keep Unavailable fields.

use std::ffi::CStr;
use std::io;
use std::mem;
use std::path::PathBuf;

use crate::error::ProcError;
use crate::process::parse::{self, ProcArgs};
use crate::process::{ProcessTableSource, RawProcess};

// libproc constants
const PROC_ALL_PIDS: u32 = 1;
const PROC_PIDPATHINFO_MAXSIZE: usize = 4096;

unsafe extern "C" {
    fn proc_listpids(
        type_: u32,
        typeinfo: u32,
        buffer: *mut libc::c_void,
        buffersize: libc::c_int,
    ) -> libc::c_int;

    fn proc_pidpath(pid: libc::c_int, buffer: *mut libc::c_void, buffersize: u32) -> libc::c_int;
}

/// Process table backed by libproc and sysctl.
#[derive(Debug, Default, Clone, Copy)]
pub struct LibProc;

impl ProcessTableSource for LibProc {
    fn pids(&self) -> Result<Vec<u32>, ProcError> {
        list_pids()
    }

    fn read_process(&self, pid: u32) -> RawProcess {
        let (exec_path, argv, environment) = match procargs(pid) {
            Ok(args) => (Some(args.exec_path), Ok(args.argv), Ok(args.environment)),
            Err(e) => {
                let kind = e.kind();
                (None, Err(e), Err(io::Error::from(kind)))
            }
        };
        let executable_path = pid_path(pid).or_else(|e| exec_path_fallback(exec_path, e));
        RawProcess {
            pid,
            executable_path,
            argv,
            environment,
        }
    }

    fn is_alive(&self, pid: u32) -> bool {
        let Ok(pid) = libc::pid_t::try_from(pid) else {
            return false;
        };
        if unsafe { libc::kill(pid, 0) } == 0 {
            return true;
        }
        io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
    }
}

fn list_pids() -> Result<Vec<u32>, ProcError> {
    let mut buf_size = 4096 * mem::size_of::<i32>();
    let mut buffer: Vec<i32> = vec![0; buf_size / mem::size_of::<i32>()];

    loop {
        let ret = unsafe {
            proc_listpids(
                PROC_ALL_PIDS,
                0,
                buffer.as_mut_ptr() as *mut libc::c_void,
                buf_size as libc::c_int,
            )
        };

        if ret <= 0 {
            let err = io::Error::last_os_error();
            return Err(ProcError::from_list_error("proc_listpids", err));
        }

        let count = ret as usize / mem::size_of::<i32>();

        if count >= buffer.len() {
            // Buffer might be too small, double it
            buf_size *= 2;
            buffer.resize(buf_size / mem::size_of::<i32>(), 0);
            continue;
        }

        buffer.truncate(count);
        return Ok(buffer
            .into_iter()
            .filter_map(|pid| u32::try_from(pid).ok())
            .collect());
    }
}

fn pid_path(pid: u32) -> io::Result<PathBuf> {
    let mut buf = [0u8; PROC_PIDPATHINFO_MAXSIZE];
    let ret = unsafe {
        proc_pidpath(
            pid as libc::c_int,
            buf.as_mut_ptr() as *mut libc::c_void,
            buf.len() as u32,
        )
    };
    if ret <= 0 {
        return Err(classify_errno(io::Error::last_os_error()));
    }
    let cstr = unsafe { CStr::from_ptr(buf.as_ptr() as *const libc::c_char) };
    Ok(PathBuf::from(cstr.to_string_lossy().into_owned()))
}

/// Use the exec path recorded in the argument area when libproc cannot
/// resolve the image. Only absolute paths qualify.
fn exec_path_fallback(exec_path: Option<String>, err: io::Error) -> io::Result<PathBuf> {
    match exec_path {
        Some(path) if path.starts_with('/') => Ok(PathBuf::from(path)),
        _ => Err(err),
    }
}

fn procargs(pid: u32) -> io::Result<ProcArgs> {
    let size = arg_max()?;
    let mut buf = vec![0u8; size];
    let mut len = size;
    let mut mib = [libc::CTL_KERN, libc::KERN_PROCARGS2, pid as libc::c_int];

    let ret = unsafe {
        libc::sysctl(
            mib.as_mut_ptr(),
            mib.len() as libc::c_uint,
            buf.as_mut_ptr() as *mut libc::c_void,
            &mut len,
            std::ptr::null_mut(),
            0,
        )
    };
    if ret != 0 {
        return Err(classify_errno(io::Error::last_os_error()));
    }

    buf.truncate(len);
    parse::parse_procargs2(&buf)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "malformed KERN_PROCARGS2"))
}

fn arg_max() -> io::Result<usize> {
    let mut mib = [libc::CTL_KERN, libc::KERN_ARGMAX];
    let mut value: libc::c_int = 0;
    let mut len = mem::size_of::<libc::c_int>();

    let ret = unsafe {
        libc::sysctl(
            mib.as_mut_ptr(),
            mib.len() as libc::c_uint,
            &mut value as *mut _ as *mut libc::c_void,
            &mut len,
            std::ptr::null_mut(),
            0,
        )
    };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    usize::try_from(value)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "negative KERN_ARGMAX"))
}

/// Map libproc/sysctl errno values onto io error kinds the enumerator acts on.
///
/// ESRCH means the process is gone. KERN_PROCARGS2 reports EINVAL for
/// processes owned by other users.
fn classify_errno(err: io::Error) -> io::Error {
    match err.raw_os_error() {
        Some(libc::ESRCH) => io::Error::new(io::ErrorKind::NotFound, err),
        Some(libc::EPERM) | Some(libc::EINVAL) => {
            io::Error::new(io::ErrorKind::PermissionDenied, err)
        }
        _ => err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_own_pid() {
        let pids = list_pids().unwrap();
        assert!(pids.contains(&std::process::id()));
    }

    #[test]
    fn reads_own_path_and_args() {
        let raw = LibProc.read_process(std::process::id());
        assert_eq!(
            raw.executable_path.unwrap().canonicalize().unwrap(),
            std::env::current_exe().unwrap().canonicalize().unwrap()
        );
        assert!(!raw.argv.unwrap().is_empty());
        assert!(raw.environment.is_ok());
    }

    #[test]
    fn esrch_maps_to_not_found() {
        let err = classify_errno(io::Error::from_raw_os_error(libc::ESRCH));
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn einval_maps_to_permission_denied() {
        let err = classify_errno(io::Error::from_raw_os_error(libc::EINVAL));
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn fallback_uses_absolute_exec_path() {
        let err = io::Error::from(io::ErrorKind::PermissionDenied);
        let path = exec_path_fallback(Some("/usr/bin/login".to_string()), err).unwrap();
        assert_eq!(path, PathBuf::from("/usr/bin/login"));
    }

    #[test]
    fn fallback_keeps_error_without_usable_path() {
        let err = io::Error::from(io::ErrorKind::PermissionDenied);
        let result = exec_path_fallback(Some("login".to_string()), err);
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::PermissionDenied);

        let err = io::Error::from(io::ErrorKind::NotFound);
        let result = exec_path_fallback(None, err);
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn own_process_is_alive() {
        assert!(LibProc.is_alive(std::process::id()));
    }
}

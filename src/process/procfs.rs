// procfs process table — reads a /proc-style directory tree.
//
// 1. List numeric directories under the root → pids
// 2. readlink <pid>/exe → executable path
// 3. <pid>/cmdline → NUL-separated argv
// 4. <pid>/environ → NUL-separated NAME=value (owner or root only)
//
// Compiled on every platform so it can be exercised against fixture trees.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::ProcError;
use crate::model::Environment;
use crate::process::parse;
use crate::process::{ProcessTableSource, RawProcess};

pub const DEFAULT_ROOT: &str = "/proc";

/// Process table backed by a procfs mount.
#[derive(Debug, Clone)]
pub struct ProcFs {
    root: PathBuf,
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT)
    }
}

impl ProcFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn pid_dir(&self, pid: u32) -> PathBuf {
        self.root.join(pid.to_string())
    }

    fn read_exe(&self, pid: u32) -> io::Result<PathBuf> {
        let link = fs::read_link(self.pid_dir(pid).join("exe"))?;
        Ok(PathBuf::from(link.to_string_lossy().into_owned()))
    }

    fn read_argv(&self, pid: u32) -> io::Result<Vec<String>> {
        let bytes = fs::read(self.pid_dir(pid).join("cmdline"))?;
        Ok(parse::split_nul(&bytes))
    }

    fn read_environ(&self, pid: u32) -> io::Result<Environment> {
        let bytes = fs::read(self.pid_dir(pid).join("environ"))?;
        Ok(parse::parse_environ(&bytes))
    }
}

impl ProcessTableSource for ProcFs {
    fn pids(&self) -> Result<Vec<u32>, ProcError> {
        let dir = fs::read_dir(&self.root)
            .map_err(|e| ProcError::from_list_error(&self.root.display().to_string(), e))?;

        let names = dir.map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()));
        Ok(collect_pids(&self.root, names))
    }

    fn read_process(&self, pid: u32) -> RawProcess {
        RawProcess {
            pid,
            executable_path: self.read_exe(pid),
            argv: self.read_argv(pid),
            environment: self.read_environ(pid),
        }
    }

    fn is_alive(&self, pid: u32) -> bool {
        self.pid_dir(pid).is_dir()
    }
}

/// Keep the numeric entry names (PIDs), sorted. Unreadable entries are
/// logged and skipped.
fn collect_pids<I>(root: &Path, names: I) -> Vec<u32>
where
    I: IntoIterator<Item = io::Result<String>>,
{
    let mut pids = Vec::new();
    for name in names {
        let name = match name {
            Ok(n) => n,
            Err(e) => {
                log::debug!("{}: skipping unreadable entry: {e}", root.display());
                continue;
            }
        };
        if let Some(pid) = parse_pid(&name) {
            pids.push(pid);
        }
    }
    pids.sort_unstable();
    pids
}

/// Parse a /proc entry name as a pid. Rejects names like "self" or "1a".
pub(crate) fn parse_pid(name: &str) -> Option<u32> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pid_numeric() {
        assert_eq!(parse_pid("1"), Some(1));
        assert_eq!(parse_pid("4194304"), Some(4194304));
    }

    #[test]
    fn parse_pid_rejects_non_pids() {
        assert_eq!(parse_pid("self"), None);
        assert_eq!(parse_pid("thread-self"), None);
        assert_eq!(parse_pid("+12"), None);
        assert_eq!(parse_pid("12a"), None);
        assert_eq!(parse_pid(""), None);
        assert_eq!(parse_pid("99999999999"), None);
    }

    #[test]
    fn unreadable_entries_are_skipped() {
        let names = vec![
            Ok("42".to_string()),
            Err(io::Error::from(io::ErrorKind::PermissionDenied)),
            Ok("self".to_string()),
            Ok("7".to_string()),
        ];
        assert_eq!(collect_pids(Path::new("/proc"), names), vec![7, 42]);
    }

    #[test]
    fn missing_root_is_unavailable() {
        let fs = ProcFs::new(std::env::temp_dir().join("procview-no-such-root"));
        assert!(matches!(fs.pids(), Err(ProcError::Unavailable(_))));
    }

    #[test]
    fn default_root_is_proc() {
        assert_eq!(ProcFs::default().root(), Path::new("/proc"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn reads_own_process() {
        let fs = ProcFs::default();
        let pid = std::process::id();
        assert!(fs.pids().unwrap().contains(&pid));
        assert!(fs.is_alive(pid));

        let raw = fs.read_process(pid);
        assert_eq!(raw.executable_path.unwrap(), std::env::current_exe().unwrap());
        assert!(!raw.argv.unwrap().is_empty());
        assert!(raw.environment.is_ok());
    }
}

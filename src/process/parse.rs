// Byte-level decoders for kernel-provided argument and environment blocks.
//
// These operate on plain byte slices so they compile and are tested on every
// platform, whichever backend feeds them at runtime.

use crate::model::Environment;

/// Split a NUL-separated block (Linux `/proc/<pid>/cmdline`) into strings.
///
/// A single trailing NUL terminates the last element and does not produce an
/// empty trailing string. Interior empty elements are kept.
pub fn split_nul(bytes: &[u8]) -> Vec<String> {
    let body = bytes.strip_suffix(&[0]).unwrap_or(bytes);
    if body.is_empty() {
        return Vec::new();
    }
    body.split(|&b| b == 0)
        .map(|s| String::from_utf8_lossy(s).into_owned())
        .collect()
}

/// Parse a NUL-separated `NAME=value` block (Linux `/proc/<pid>/environ`).
pub fn parse_environ(bytes: &[u8]) -> Environment {
    collect_environment(split_nul(bytes))
}

/// Build an environment map from `NAME=value` strings.
///
/// Entries without `=` or with an empty name are dropped. The first
/// occurrence of a name wins, as with `getenv`.
pub fn collect_environment<I, S>(entries: I) -> Environment
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut env = Environment::new();
    for entry in entries {
        let Some((name, value)) = entry.as_ref().split_once('=') else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        env.entry(name.to_string())
            .or_insert_with(|| value.to_string());
    }
    env
}

/// Decoded `KERN_PROCARGS2` buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcArgs {
    pub exec_path: String,
    pub argv: Vec<String>,
    pub environment: Environment,
}

/// Pointer width of the process whose argument area is being decoded.
const SLOT_ALIGN: usize = 8;

/// Decode a macOS `sysctl(KERN_PROCARGS2)` buffer.
///
/// Layout:
///   argc (i32, native endian) | exec_path \0 | \0 padding |
///   argv[0] \0 ... argv[argc-1] \0 | env[0] \0 ... env[n] \0 | \0 | apple strings
///
/// The exec path sits in a pointer-aligned slot followed by one pointer-sized
/// NULL, so the padding never exceeds that slot. NUL bytes beyond it are
/// empty leading arguments, not padding.
///
/// Returns None if the header is truncated or argc is negative. A buffer that
/// ends early yields whatever strings were complete.
pub fn parse_procargs2(buf: &[u8]) -> Option<ProcArgs> {
    let header: [u8; 4] = buf.get(..4)?.try_into().ok()?;
    let argc = usize::try_from(i32::from_ne_bytes(header)).ok()?;
    let mut rest = &buf[4..];

    let path_len = rest.iter().position(|&b| b == 0).unwrap_or(rest.len()) + 1;
    let exec_path = take_cstr(&mut rest).unwrap_or_default();

    let max_pad = path_len.next_multiple_of(SLOT_ALIGN) + SLOT_ALIGN - path_len;
    let pad = rest.iter().take_while(|&&b| b == 0).count().min(max_pad);
    rest = &rest[pad..];

    let mut argv = Vec::with_capacity(argc);
    while argv.len() < argc {
        match take_cstr(&mut rest) {
            Some(arg) => argv.push(arg),
            None => break,
        }
    }

    let mut env_entries = Vec::new();
    while let Some(entry) = take_cstr(&mut rest) {
        if entry.is_empty() {
            break;
        }
        env_entries.push(entry);
    }

    Some(ProcArgs {
        exec_path,
        argv,
        environment: collect_environment(env_entries),
    })
}

/// Take one NUL-terminated string off the front of `rest`.
///
/// An unterminated tail is returned as the final string. Returns None once
/// `rest` is exhausted.
fn take_cstr(rest: &mut &[u8]) -> Option<String> {
    if rest.is_empty() {
        return None;
    }
    let end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
    let s = String::from_utf8_lossy(&rest[..end]).into_owned();
    *rest = rest.get(end + 1..).unwrap_or(&[]);
    Some(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn procargs(argc: i32, tail: &[u8]) -> Vec<u8> {
        let mut buf = argc.to_ne_bytes().to_vec();
        buf.extend_from_slice(tail);
        buf
    }

    #[test]
    fn cmdline_with_trailing_nul() {
        assert_eq!(
            split_nul(b"/usr/bin/shell\0-l\0"),
            vec!["/usr/bin/shell", "-l"]
        );
    }

    #[test]
    fn cmdline_empty_for_kernel_thread() {
        assert!(split_nul(b"").is_empty());
        assert!(split_nul(b"\0").is_empty());
    }

    #[test]
    fn cmdline_keeps_interior_empty_argument() {
        assert_eq!(split_nul(b"echo\0\0x\0"), vec!["echo", "", "x"]);
    }

    #[test]
    fn cmdline_without_trailing_nul() {
        // setproctitle-style rewrites may drop the terminator.
        assert_eq!(split_nul(b"nginx: worker process"), vec!["nginx: worker process"]);
    }

    #[test]
    fn cmdline_non_utf8_is_lossy() {
        let args = split_nul(b"cat\0caf\xe9\0");
        assert_eq!(args[1], "caf\u{FFFD}");
    }

    #[test]
    fn environ_basic() {
        let env = parse_environ(b"HOME=/root\0PATH=/usr/bin:/bin\0");
        assert_eq!(env.len(), 2);
        assert_eq!(env["HOME"], "/root");
        assert_eq!(env["PATH"], "/usr/bin:/bin");
    }

    #[test]
    fn environ_value_may_contain_equals() {
        let env = parse_environ(b"OPTS=a=b=c\0");
        assert_eq!(env["OPTS"], "a=b=c");
    }

    #[test]
    fn environ_skips_malformed_and_keeps_first() {
        let env = parse_environ(b"garbage\0=nameless\0X=1\0X=2\0EMPTY=\0");
        assert_eq!(env.len(), 2);
        assert_eq!(env["X"], "1");
        assert_eq!(env["EMPTY"], "");
    }

    #[test]
    fn procargs2_full_layout() {
        let buf = procargs(
            2,
            b"/usr/bin/shell\0\0\0\0shell\0-l\0HOME=/root\0TERM=xterm\0\0ptr_munge=\0",
        );
        let parsed = parse_procargs2(&buf).unwrap();
        assert_eq!(parsed.exec_path, "/usr/bin/shell");
        assert_eq!(parsed.argv, vec!["shell", "-l"]);
        assert_eq!(parsed.environment.len(), 2);
        assert_eq!(parsed.environment["HOME"], "/root");
        assert!(!parsed.environment.contains_key("ptr_munge"));
    }

    #[test]
    fn procargs2_empty_first_argument() {
        // "/bin/sh\0" fills one 8-byte slot, then one 8-byte NULL, then argv.
        let mut tail = b"/bin/sh\0".to_vec();
        tail.extend_from_slice(&[0; 8]);
        tail.extend_from_slice(b"\0-l\0HOME=/root\0\0");
        let parsed = parse_procargs2(&procargs(2, &tail)).unwrap();
        assert_eq!(parsed.exec_path, "/bin/sh");
        assert_eq!(parsed.argv, vec!["", "-l"]);
        assert_eq!(parsed.environment.len(), 1);
        assert_eq!(parsed.environment["HOME"], "/root");
    }

    #[test]
    fn procargs2_full_slot_padding() {
        // 13-byte path + NUL rounds to 16, plus the 8-byte NULL: 10 padding bytes.
        let mut tail = b"/usr/bin/file\0".to_vec();
        tail.extend_from_slice(&[0; 10]);
        tail.extend_from_slice(b"file\0-b\0LANG=C\0\0");
        let parsed = parse_procargs2(&procargs(2, &tail)).unwrap();
        assert_eq!(parsed.argv, vec!["file", "-b"]);
        assert_eq!(parsed.environment["LANG"], "C");
    }

    #[test]
    fn procargs2_no_environment() {
        let buf = procargs(1, b"/sbin/launchd\0\0\0launchd\0\0");
        let parsed = parse_procargs2(&buf).unwrap();
        assert_eq!(parsed.argv, vec!["launchd"]);
        assert!(parsed.environment.is_empty());
    }

    #[test]
    fn procargs2_truncated_argv() {
        let buf = procargs(3, b"/bin/ls\0\0ls\0-la");
        let parsed = parse_procargs2(&buf).unwrap();
        assert_eq!(parsed.argv, vec!["ls", "-la"]);
    }

    #[test]
    fn procargs2_rejects_short_header() {
        assert!(parse_procargs2(&[1, 0]).is_none());
    }

    #[test]
    fn procargs2_rejects_negative_argc() {
        assert!(parse_procargs2(&procargs(-1, b"/bin/ls\0")).is_none());
    }
}

//! Thin wrappers over the few syscalls std does not expose.

use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

fn c_path(path: &Path) -> io::Result<CString> {
    CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains NUL"))
}

/// Current process umask.
///
/// POSIX only offers a set-and-return call, so the mask is written back
/// immediately. Callers are single threaded.
pub(crate) fn current_umask() -> u32 {
    // SAFETY: umask has no failure mode and touches no memory.
    unsafe {
        let mask = libc::umask(0);
        libc::umask(mask);
        mask as u32
    }
}

/// Create a device node, FIFO or socket with the given mode and device.
pub(crate) fn make_node(path: &Path, mode: u32, rdev: u64) -> io::Result<()> {
    let cpath = c_path(path)?;
    // SAFETY: cpath is a valid NUL-terminated string for the duration of the call.
    let rc = unsafe { libc::mknod(cpath.as_ptr(), mode as libc::mode_t, rdev as libc::dev_t) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

/// Set access and modification time of `path` without following a symlink.
pub(crate) fn set_times(path: &Path, atime: (i64, i64), mtime: (i64, i64)) -> io::Result<()> {
    let cpath = c_path(path)?;
    let times = [
        libc::timespec {
            tv_sec: atime.0 as libc::time_t,
            tv_nsec: atime.1 as _,
        },
        libc::timespec {
            tv_sec: mtime.0 as libc::time_t,
            tv_nsec: mtime.1 as _,
        },
    ];
    // SAFETY: cpath and times outlive the call; AT_FDCWD resolves relative paths.
    let rc = unsafe {
        libc::utimensat(
            libc::AT_FDCWD,
            cpath.as_ptr(),
            times.as_ptr(),
            libc::AT_SYMLINK_NOFOLLOW,
        )
    };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

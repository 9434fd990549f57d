//! Interrupt re-arming
//!
//! Embedded interpreters tend to take over SIGINT when they start. Once the
//! foreign runtime is up, this installs a process-wide SIGINT forwarder that
//! re-raises the interrupt as SIGTERM on the same process, so the host's own
//! shutdown path still runs on Ctrl-C.

use std::io;

/// Unblock SIGINT on the calling thread and install the forwarder.
///
/// Returns `true` if this call installed the forwarder, `false` if it was
/// already in place (or the platform has no signals).
pub fn rearm_interrupt() -> io::Result<bool> {
    imp::rearm_interrupt()
}

#[cfg(unix)]
mod imp {
    use once_cell::sync::OnceCell;
    use signal_hook::iterator::Signals;
    use std::io;

    static FORWARDER: OnceCell<()> = OnceCell::new();

    pub(super) fn rearm_interrupt() -> io::Result<bool> {
        unblock_sigint()?;

        let mut installed = false;
        FORWARDER.get_or_try_init(|| {
            tracing::debug!("Register the SIGINT handler");
            let mut signals = Signals::new([libc::SIGINT])?;
            std::thread::Builder::new()
                .name("livecall-sigint".to_string())
                .spawn(move || {
                    for _ in signals.forever() {
                        tracing::debug!("SIGINT received, sending SIGTERM to this process");
                        // SAFETY: kill/getpid have no memory-safety preconditions.
                        unsafe {
                            libc::kill(libc::getpid(), libc::SIGTERM);
                        }
                    }
                })?;
            installed = true;
            Ok::<(), io::Error>(())
        })?;

        Ok(installed)
    }

    fn unblock_sigint() -> io::Result<()> {
        // SAFETY: the set is initialised by sigemptyset before use and only
        // this thread's mask is changed.
        let rc = unsafe {
            let mut set: libc::sigset_t = std::mem::zeroed();
            libc::sigemptyset(&mut set);
            libc::sigaddset(&mut set, libc::SIGINT);
            libc::pthread_sigmask(libc::SIG_UNBLOCK, &set, std::ptr::null_mut())
        };
        if rc == 0 {
            Ok(())
        } else {
            Err(io::Error::from_raw_os_error(rc))
        }
    }
}

#[cfg(not(unix))]
mod imp {
    use std::io;

    pub(super) fn rearm_interrupt() -> io::Result<bool> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwarder_installs_once() {
        // Whatever the first call reports, later calls never install again.
        rearm_interrupt().unwrap();
        assert!(!rearm_interrupt().unwrap());
        assert!(!rearm_interrupt().unwrap());
    }
}

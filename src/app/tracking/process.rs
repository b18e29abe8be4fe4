use std::io::{self, Read, Write};
use std::process::{Child, Command as ProcessCommand, ExitStatus};

#[cfg(unix)]
use std::os::unix::process::CommandExt;

const STDERR_TAIL_MAX: usize = 16 * 1024;

/// Result of an interactive child run.
#[derive(Debug)]
pub(crate) struct Finished {
    pub(crate) status: ExitStatus,
    /// Last bytes written to stderr, when stderr was piped.
    pub(crate) stderr_tail: Option<String>,
}

#[cfg(unix)]
struct ScopedSigaction {
    signum: libc::c_int,
    old_action: libc::sigaction,
}

#[cfg(unix)]
impl ScopedSigaction {
    fn ignore(signum: libc::c_int) -> io::Result<Self> {
        unsafe {
            let mut new_action: libc::sigaction = std::mem::zeroed();
            new_action.sa_sigaction = libc::SIG_IGN;
            libc::sigemptyset(&mut new_action.sa_mask);
            new_action.sa_flags = 0;

            let mut old_action: libc::sigaction = std::mem::zeroed();
            if libc::sigaction(signum, &new_action, &mut old_action) != 0 {
                return Err(io::Error::last_os_error());
            }

            Ok(Self { signum, old_action })
        }
    }
}

#[cfg(unix)]
impl Drop for ScopedSigaction {
    fn drop(&mut self) {
        unsafe {
            let _ = libc::sigaction(self.signum, &self.old_action, std::ptr::null_mut());
        }
    }
}

#[cfg(unix)]
struct TerminalForegroundGuard {
    stdin_fd: libc::c_int,
    parent_pgrp: libc::pid_t,
    child_foreground: bool,
}

#[cfg(unix)]
impl TerminalForegroundGuard {
    fn new(stdin_fd: libc::c_int, parent_pgrp: libc::pid_t) -> Self {
        Self {
            stdin_fd,
            parent_pgrp,
            child_foreground: false,
        }
    }

    fn handoff_to_child(&mut self, child_pgrp: libc::pid_t) {
        self.child_foreground = unsafe { libc::tcsetpgrp(self.stdin_fd, child_pgrp) == 0 };
    }
}

#[cfg(unix)]
impl Drop for TerminalForegroundGuard {
    fn drop(&mut self) {
        if !self.child_foreground {
            return;
        }
        unsafe {
            let _ = libc::tcsetpgrp(self.stdin_fd, self.parent_pgrp);
        }
    }
}

/// Ctrl-C while the player runs belongs to the player, not to us.
#[cfg(unix)]
pub(crate) fn with_sigint_ignored<F, R>(f: F) -> io::Result<R>
where
    F: FnOnce() -> io::Result<R>,
{
    let _sigint_guard = ScopedSigaction::ignore(libc::SIGINT)?;
    f()
}

#[cfg(not(unix))]
pub(crate) fn with_sigint_ignored<F, R>(f: F) -> io::Result<R>
where
    F: FnOnce() -> io::Result<R>,
{
    f()
}

/// Run `cmd` in the foreground of the controlling terminal and block until
/// it exits.
#[cfg(unix)]
pub(crate) fn run_interactive_cmd(mut cmd: ProcessCommand) -> io::Result<Finished> {
    let stdin_fd = libc::STDIN_FILENO;
    let parent_pgrp = unsafe { libc::tcgetpgrp(stdin_fd) };
    if parent_pgrp == -1 {
        return wait_collecting(cmd.spawn()?);
    }

    let _sigttou_guard = ScopedSigaction::ignore(libc::SIGTTOU)?;
    let mut terminal_guard = TerminalForegroundGuard::new(stdin_fd, parent_pgrp);

    unsafe {
        cmd.pre_exec(|| {
            libc::signal(libc::SIGINT, libc::SIG_DFL);
            libc::signal(libc::SIGQUIT, libc::SIG_DFL);
            libc::signal(libc::SIGTSTP, libc::SIG_DFL);
            if libc::setpgid(0, 0) != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }

    let child = cmd.spawn()?;
    let child_pgid = child.id() as libc::pid_t;
    terminal_guard.handoff_to_child(child_pgid);
    wait_collecting(child)
}

#[cfg(not(unix))]
pub(crate) fn run_interactive_cmd(mut cmd: ProcessCommand) -> io::Result<Finished> {
    wait_collecting(cmd.spawn()?)
}

fn wait_collecting(mut child: Child) -> io::Result<Finished> {
    let stderr_tail = match child.stderr.take() {
        Some(pipe) => Some(tee_tail(pipe, io::stderr())?),
        None => None,
    };
    let status = child.wait()?;
    Ok(Finished {
        status,
        stderr_tail,
    })
}

/// Copy `reader` to `echo`, keeping only the last bytes seen.
pub(crate) fn tee_tail<R: Read, W: Write>(mut reader: R, mut echo: W) -> io::Result<String> {
    let mut tail = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let read = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        let _ = echo.write_all(&buf[..read]);
        tail.extend_from_slice(&buf[..read]);
        if tail.len() > STDERR_TAIL_MAX {
            tail.drain(..tail.len() - STDERR_TAIL_MAX);
        }
    }
    let _ = echo.flush();
    Ok(String::from_utf8_lossy(&tail).into_owned())
}

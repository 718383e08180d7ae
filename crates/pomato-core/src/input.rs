//! Raw input source.
//!
//! [`TerminalMode`] puts the controlling terminal into cbreak mode so bytes
//! arrive one at a time without echo, and [`spawn_reader`] moves them onto a
//! channel from a dedicated thread that owns the blocking `read`.
//!
//! ```text
//!  reader thread (std)          async side
//!  read(1) ──▶ tx.blocking_send ──▶ rx.recv().await   (see `keys`)
//!  EOF / error ──▶ drop(tx)     ──▶ rx.recv() == None
//! ```

use std::io::{self, Read};
use std::os::unix::io::{AsRawFd, RawFd};
use std::thread::JoinHandle;

use tokio::sync::mpsc;

/// Channel depth between the reader thread and the multiplexer.
const BYTE_BUFFER: usize = 32;

/// Terminal attributes switched to cbreak; restored on drop.
pub struct TerminalMode {
    fd: RawFd,
    original: libc::termios,
    restored: bool,
}

impl TerminalMode {
    /// Switch stdin to cbreak without echo.
    ///
    /// Returns `Ok(None)` when stdin is not a terminal.
    pub fn cbreak() -> io::Result<Option<Self>> {
        Self::cbreak_fd(io::stdin().as_raw_fd())
    }

    fn cbreak_fd(fd: RawFd) -> io::Result<Option<Self>> {
        if !is_tty(fd) {
            return Ok(None);
        }

        // SAFETY: `termios` is plain data filled in by tcgetattr before use.
        let original = unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }
            termios
        };

        let mut raw = original;
        raw.c_lflag &= !(libc::ICANON | libc::ECHO);
        raw.c_cc[libc::VMIN] = 1;
        raw.c_cc[libc::VTIME] = 0;

        // SAFETY: fd is a valid terminal and `raw` is an initialized termios.
        if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &raw) } != 0 {
            return Err(io::Error::last_os_error());
        }

        tracing::debug!(fd, "terminal switched to cbreak");
        Ok(Some(Self {
            fd,
            original,
            restored: false,
        }))
    }

    /// Discard bytes typed but not yet read.
    pub fn drain(&self) {
        flush_input(self.fd);
    }

    /// Put the original attributes back.
    pub fn restore(&mut self) -> io::Result<()> {
        if self.restored {
            return Ok(());
        }
        // SAFETY: `original` was produced by tcgetattr on the same fd.
        if unsafe { libc::tcsetattr(self.fd, libc::TCSANOW, &self.original) } != 0 {
            return Err(io::Error::last_os_error());
        }
        self.restored = true;
        tracing::debug!(fd = self.fd, "terminal mode restored");
        Ok(())
    }
}

impl Drop for TerminalMode {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            tracing::warn!("failed to restore terminal mode: {e}");
        }
    }
}

pub fn stdin_is_tty() -> bool {
    is_tty(io::stdin().as_raw_fd())
}

/// Discard pending input on stdin if it is a terminal.
pub fn drain_stdin() {
    let fd = io::stdin().as_raw_fd();
    if is_tty(fd) {
        flush_input(fd);
    }
}

fn is_tty(fd: RawFd) -> bool {
    // SAFETY: isatty only inspects the descriptor.
    unsafe { libc::isatty(fd) == 1 }
}

fn flush_input(fd: RawFd) {
    // SAFETY: tcflush on a terminal fd has no memory effects.
    if unsafe { libc::tcflush(fd, libc::TCIFLUSH) } != 0 {
        tracing::debug!("tcflush failed: {}", io::Error::last_os_error());
    }
}

/// Start the reader thread over `source`.
///
/// Each byte is forwarded as soon as `read` returns it. The thread ends on
/// end of file, on a read error, or once the receiver is gone; the channel
/// closing is the end-of-stream signal.
///
/// # Errors
///
/// Returns an error if the thread cannot be spawned.
pub fn spawn_reader<R>(source: R) -> io::Result<(mpsc::Receiver<u8>, JoinHandle<()>)>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel(BYTE_BUFFER);
    let handle = std::thread::Builder::new()
        .name("pomato-stdin".into())
        .spawn(move || read_loop(source, tx))?;
    Ok((rx, handle))
}

fn read_loop<R: Read>(mut source: R, tx: mpsc::Sender<u8>) {
    let mut buf = [0u8; 1];
    loop {
        match source.read(&mut buf) {
            Ok(0) => {
                tracing::debug!("stdin reached end of file");
                return;
            }
            Ok(_) => {
                if tx.blocking_send(buf[0]).is_err() {
                    return;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::error!("read from stdin failed: {e}");
                return;
            }
        }
    }
}

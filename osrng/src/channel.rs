//! Raw access to the OS entropy device.
//!
//! A channel hands out whatever the device returns for a single read, which
//! may be fewer bytes than asked for. Accumulating a full buffer and judging
//! short reads is the job of [`crate::rng::OsRng`].

use crate::config::RngConfig;
use crate::error::{OpenFailure, RngError, RngResult};
use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Outcome of one raw read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawRead {
    /// `n > 0` bytes were written to the front of the buffer.
    Data(usize),
    /// The device returned zero bytes.
    EndOfStream,
    /// Non-blocking device with nothing available right now.
    WouldBlock,
}

/// A byte source the validated reader can sit on top of.
pub trait EntropyChannel {
    /// Identifier of the underlying device.
    fn path(&self) -> &Path;

    /// Read up to `buf.len()` bytes. Signal interruptions are retried
    /// internally; every other I/O error is returned as-is.
    fn read_raw(&mut self, buf: &mut [u8]) -> io::Result<RawRead>;

    /// Release the handle. Callers guarantee this runs at most once.
    fn close(&mut self);

    fn is_open(&self) -> bool;
}

/// Read-only handle on a character-special entropy device.
#[derive(Debug)]
pub struct DeviceChannel {
    path: PathBuf,
    file: Option<File>,
}

impl DeviceChannel {
    /// Open `path` for reading and verify it is a character device.
    ///
    /// The type check runs against the open descriptor rather than the path,
    /// so a symlink or a file swapped in after the check cannot be read.
    pub fn open(path: impl AsRef<Path>) -> RngResult<Self> {
        Self::open_with(path.as_ref(), false)
    }

    /// Open the device described by `config`.
    pub fn from_config(config: &RngConfig) -> RngResult<Self> {
        Self::open_with(&config.device, config.nonblocking)
    }

    fn open_with(path: &Path, nonblocking: bool) -> RngResult<Self> {
        let mut options = OpenOptions::new();
        options.read(true);
        // Always open non-blocking so a FIFO or similar node cannot stall
        // `open` before the type check rejects it.
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.custom_flags(libc::O_NONBLOCK);
        }

        let file = options
            .open(path)
            .map_err(|e| RngError::open(path, e))?;
        let metadata = file.metadata().map_err(|e| RngError::open(path, e))?;

        if !is_char_device(&metadata) {
            tracing::warn!(
                device = %path.display(),
                "refusing entropy device that is not a character special file"
            );
            return Err(RngError::open(path, open_rejection()));
        }

        #[cfg(unix)]
        {
            if !nonblocking {
                set_nonblocking(&file, false).map_err(|e| RngError::open(path, e))?;
            }
        }

        tracing::debug!(device = %path.display(), nonblocking, "opened entropy device");
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
        })
    }
}

#[cfg(unix)]
fn is_char_device(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::FileTypeExt;
    metadata.file_type().is_char_device()
}

#[cfg(unix)]
fn set_nonblocking(file: &File, enabled: bool) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    let fd = file.as_raw_fd();
    // SAFETY: `fd` is owned by `file` and stays open for both calls.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }
    let flags = if enabled {
        flags | libc::O_NONBLOCK
    } else {
        flags & !libc::O_NONBLOCK
    };
    // SAFETY: as above; F_SETFL only updates the status flags.
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(unix))]
fn is_char_device(_metadata: &std::fs::Metadata) -> bool {
    false
}

fn open_rejection() -> OpenFailure {
    if cfg!(unix) {
        OpenFailure::NotCharacterDevice
    } else {
        OpenFailure::Unsupported
    }
}

impl EntropyChannel for DeviceChannel {
    fn path(&self) -> &Path {
        &self.path
    }

    fn read_raw(&mut self, buf: &mut [u8]) -> io::Result<RawRead> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "entropy device closed"))?;

        loop {
            match file.read(buf) {
                Ok(0) => return Ok(RawRead::EndOfStream),
                Ok(n) => return Ok(RawRead::Data(n)),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                    tracing::trace!(device = %self.path.display(), "read interrupted, retrying");
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(RawRead::WouldBlock),
                Err(e) => return Err(e),
            }
        }
    }

    fn close(&mut self) {
        if self.file.take().is_some() {
            tracing::debug!(device = %self.path.display(), "closed entropy device");
        }
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }
}


#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;

    #[test]
    fn opens_kernel_random_device() {
        let mut channel = DeviceChannel::open("/dev/urandom").unwrap();
        assert!(channel.is_open());

        let mut buf = [0u8; 64];
        match channel.read_raw(&mut buf).unwrap() {
            RawRead::Data(n) => assert!(n > 0 && n <= 64),
            other => panic!("unexpected read outcome {other:?}"),
        }

        channel.close();
        assert!(!channel.is_open());
    }

    #[test]
    fn rejects_regular_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), [0x42u8; 64]).unwrap();

        let err = DeviceChannel::open(file.path()).unwrap_err();
        assert!(matches!(
            err,
            RngError::Open {
                reason: OpenFailure::NotCharacterDevice,
                ..
            }
        ));
    }

    #[test]
    fn rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = DeviceChannel::open(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            RngError::Open {
                reason: OpenFailure::NotCharacterDevice,
                ..
            }
        ));
    }

    #[test]
    fn rejects_symlink_to_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("predictable");
        std::fs::write(&target, [0u8; 32]).unwrap();
        let link = dir.path().join("urandom");
        symlink(&target, &link).unwrap();

        let err = DeviceChannel::open(&link).unwrap_err();
        assert_eq!(err.error_code(), osrng_types::ErrorCode::NotCharacterDevice);
    }

    #[test]
    fn rejects_fifo_without_waiting_for_a_writer() {
        use std::ffi::CString;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let fifo = dir.path().join("urandom");
        let c_path = CString::new(fifo.as_os_str().as_bytes()).unwrap();
        assert_eq!(unsafe { libc::mkfifo(c_path.as_ptr(), 0o600) }, 0);

        let err = DeviceChannel::open(&fifo).unwrap_err();
        assert_eq!(err.error_code(), osrng_types::ErrorCode::NotCharacterDevice);
    }

    #[test]
    fn blocking_open_clears_nonblocking_flag() {
        use std::os::unix::io::AsRawFd;

        let channel = DeviceChannel::open("/dev/urandom").unwrap();
        let fd = channel.file.as_ref().unwrap().as_raw_fd();
        let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
        assert_eq!(flags & libc::O_NONBLOCK, 0);

        let config = RngConfig {
            nonblocking: true,
            ..RngConfig::default()
        };
        let channel = DeviceChannel::from_config(&config).unwrap();
        let fd = channel.file.as_ref().unwrap().as_raw_fd();
        let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
        assert_ne!(flags & libc::O_NONBLOCK, 0);
    }

    #[test]
    fn missing_device_reports_not_found() {
        let err = DeviceChannel::open("/dev/definitely-not-an-rng").unwrap_err();
        assert_eq!(err.error_code(), osrng_types::ErrorCode::DeviceNotFound);
    }

    #[test]
    fn null_device_reads_as_end_of_stream() {
        let mut channel = DeviceChannel::open("/dev/null").unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(channel.read_raw(&mut buf).unwrap(), RawRead::EndOfStream);
    }

    #[test]
    fn read_after_close_is_an_error() {
        let mut channel = DeviceChannel::open("/dev/urandom").unwrap();
        channel.close();
        let mut buf = [0u8; 4];
        assert!(channel.read_raw(&mut buf).is_err());
    }
}

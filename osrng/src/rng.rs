//! Validated reader over an OS entropy channel.
//!
//! [`OsRng`] is what cryptographic callers hold. It self-tests the device
//! before handing out a single byte, returns exactly the number of bytes
//! asked for or an error, and releases the device exactly once.

use crate::channel::{DeviceChannel, EntropyChannel, RawRead};
use crate::config::RngConfig;
use crate::error::{RngError, RngResult, Stall};
use osrng_types::RngState;
use std::io;
use std::path::Path;
use zeroize::{Zeroize, Zeroizing};

/// Size of each of the two startup samples compared by the self-test.
pub const SELF_TEST_SAMPLE_LEN: usize = 16;

/// Open the default device, or `path` when given, and run the self-test.
pub fn open(path: Option<&Path>) -> RngResult<OsRng> {
    match path {
        Some(path) => OsRng::with_device(path),
        None => OsRng::new(),
    }
}

/// Self-tested, exact-length reader over a single entropy device.
///
/// Dropping the reader closes the device if [`OsRng::close`] has not
/// already done so. Every method takes `&mut self`; sharing one reader
/// between threads requires external locking.
#[derive(Debug)]
pub struct OsRng<C: EntropyChannel = DeviceChannel> {
    channel: C,
    state: RngState,
}

impl OsRng<DeviceChannel> {
    /// Reader over `/dev/urandom`.
    pub fn new() -> RngResult<Self> {
        Self::from_config(&RngConfig::default())
    }

    /// Reader over an alternate device node.
    pub fn with_device(path: impl AsRef<Path>) -> RngResult<Self> {
        Self::from_config(&RngConfig::with_device(path))
    }

    pub fn from_config(config: &RngConfig) -> RngResult<Self> {
        config.validate()?;
        let channel = DeviceChannel::from_config(config)?;
        Self::from_channel(channel)
    }
}

impl<C: EntropyChannel> OsRng<C> {
    /// Wrap an already-open channel and run the startup self-test.
    ///
    /// On failure the channel is closed before the error is returned.
    pub fn from_channel(channel: C) -> RngResult<Self> {
        let mut rng = Self {
            channel,
            state: RngState::Uninitialized,
        };
        rng.self_test()?;
        rng.transition(RngState::Ready);
        Ok(rng)
    }

    /// Two independent 16-byte draws must both be complete and must differ.
    ///
    /// Identical samples mean a stuck or substituted source. This is a
    /// liveness gate only; it says nothing about statistical quality.
    fn self_test(&mut self) -> RngResult<()> {
        let mut first = Zeroizing::new([0u8; SELF_TEST_SAMPLE_LEN]);
        let mut second = Zeroizing::new([0u8; SELF_TEST_SAMPLE_LEN]);

        self.accumulate(first.as_mut_slice()).map_err(self_test_failure)?;
        self.accumulate(second.as_mut_slice()).map_err(self_test_failure)?;

        if *first == *second {
            tracing::warn!(
                device = %self.channel.path().display(),
                "entropy device returned duplicate self-test samples"
            );
            return Err(RngError::SelfTest(
                "OS RNG returned duplicate data".into(),
            ));
        }

        tracing::debug!(
            device = %self.channel.path().display(),
            sample_bytes = SELF_TEST_SAMPLE_LEN,
            "entropy self-test passed"
        );
        Ok(())
    }

    /// Return exactly `n` bytes from the device.
    ///
    /// A negative `n` is rejected in every state: the device has no end,
    /// so "read everything" is meaningless. `n == 0` returns an empty buffer
    /// without touching the device.
    pub fn read(&mut self, n: isize) -> RngResult<Vec<u8>> {
        let len = usize::try_from(n).map_err(|_| {
            RngError::InvalidArgument("cannot read to an unbounded stream".into())
        })?;
        self.ensure_open()?;
        if len == 0 {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        out.try_reserve_exact(len).map_err(|_| {
            RngError::InvalidArgument(format!("cannot allocate a {len}-byte buffer"))
        })?;
        out.resize(len, 0);
        self.accumulate(&mut out)?;
        Ok(out)
    }

    /// Fill `dest` completely, or fail and leave it zeroed.
    pub fn fill(&mut self, dest: &mut [u8]) -> RngResult<()> {
        self.ensure_open()?;
        if dest.is_empty() {
            return Ok(());
        }
        self.accumulate(dest)
    }

    /// Release the device. Closing an already-closed reader does nothing.
    pub fn close(&mut self) {
        if self.state == RngState::Closed {
            return;
        }
        self.channel.close();
        self.transition(RngState::Closed);
    }

    /// No-op, for callers that treat the reader as a generic stream.
    pub fn flush(&mut self) {}

    pub fn state(&self) -> RngState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == RngState::Closed
    }

    /// Path of the underlying device.
    pub fn device(&self) -> &Path {
        self.channel.path()
    }

    fn ensure_open(&self) -> RngResult<()> {
        if !self.state.is_readable() {
            return Err(RngError::Closed);
        }
        Ok(())
    }

    fn transition(&mut self, next: RngState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal state transition {} -> {next}",
            self.state
        );
        self.state = next;
    }

    fn accumulate(&mut self, buf: &mut [u8]) -> RngResult<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.channel.read_raw(&mut buf[filled..]) {
                Ok(RawRead::Data(n)) if n > 0 => filled += n.min(buf.len() - filled),
                Ok(RawRead::Data(_)) | Ok(RawRead::EndOfStream) => {
                    return Err(self.truncated(buf, filled, Stall::EndOfStream));
                }
                Ok(RawRead::WouldBlock) => {
                    return Err(self.truncated(buf, filled, Stall::WouldBlock));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                    tracing::trace!(
                        device = %self.channel.path().display(),
                        filled,
                        "entropy read interrupted, retrying"
                    );
                }
                Err(e) => {
                    buf.zeroize();
                    return Err(RngError::Io(e));
                }
            }
        }
        Ok(())
    }

    fn truncated(&self, buf: &mut [u8], got: usize, stall: Stall) -> RngError {
        buf.zeroize();
        tracing::warn!(
            device = %self.channel.path().display(),
            requested = buf.len(),
            got,
            %stall,
            "entropy device starved before request was satisfied"
        );
        RngError::TruncatedRead {
            requested: buf.len(),
            got,
            stall,
        }
    }
}

fn self_test_failure(err: RngError) -> RngError {
    match err {
        RngError::TruncatedRead { requested, got, .. } => RngError::SelfTest(format!(
            "read truncated (requested {requested}, got {got})"
        )),
        other => other,
    }
}

impl<C: EntropyChannel> Drop for OsRng<C> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Every successful `read` fills the whole buffer; a starved device is
/// reported as `UnexpectedEof` rather than as a short count.
impl<C: EntropyChannel> io::Read for OsRng<C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.fill(buf)?;
        Ok(buf.len())
    }
}

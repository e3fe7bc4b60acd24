//! Close shield for borrowed output streams
//!
//! The host archive writer keeps writing entries after ours, so the encoder
//! must not be able to end the stream. Closing the shield flushes the
//! destination and detaches from it; the destination itself stays open.

use std::io::{self, Write};
use tracing::warn;

/// Writer that forwards to a destination it does not own
pub struct CloseShield<'a, W: Write + ?Sized> {
    inner: Option<&'a mut W>,
}

impl<'a, W: Write + ?Sized> CloseShield<'a, W> {
    pub fn new(destination: &'a mut W) -> Self {
        Self {
            inner: Some(destination),
        }
    }

    /// Flush the destination and stop forwarding to it
    pub fn close(&mut self) -> io::Result<()> {
        match self.inner.take() {
            Some(inner) => inner.flush(),
            None => Ok(()),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }
}

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "write to closed shield")
}

impl<W: Write + ?Sized> Write for CloseShield<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.inner.as_mut() {
            Some(inner) => inner.write(buf),
            None => Err(closed()),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self.inner.as_mut() {
            Some(inner) => inner.write_all(buf),
            None => Err(closed()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.inner.as_mut() {
            Some(inner) => inner.flush(),
            None => Ok(()),
        }
    }
}

impl<W: Write + ?Sized> Drop for CloseShield<'_, W> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to flush destination on drop: {}", e);
        }
    }
}

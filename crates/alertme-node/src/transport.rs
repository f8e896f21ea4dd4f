//! Byte transport boundary.
//!
//! A node never talks to a serial port directly. It is handed a [`Transport`]
//! when started and only ever asks it for the next byte or writes a complete
//! frame. "No byte available right now" is an ordinary answer, not an error.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

/// Errors reported by a transport.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The underlying stream failed.
    #[error("transport I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The transport has been closed.
    #[error("transport closed")]
    Closed,
}

/// A byte-oriented link to a radio module.
pub trait Transport: Send {
    /// Read one byte. `Ok(None)` means no byte is available yet.
    fn read_byte(&mut self) -> Result<Option<u8>, TransportError>;

    /// Write a complete encoded frame.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn read_byte(&mut self) -> Result<Option<u8>, TransportError> {
        (**self).read_byte()
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write_bytes(bytes)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    inbound: VecDeque<u8>,
    written: Vec<u8>,
}

/// In-memory transport standing in for a serial port.
///
/// Clones share the same buffers, so a test can keep one handle to feed
/// bytes and inspect writes while the node owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryTransport {
    /// Create an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the node to read.
    pub fn feed(&self, bytes: &[u8]) {
        self.state.lock().inbound.extend(bytes.iter().copied());
    }

    /// Number of queued bytes not yet read.
    pub fn pending(&self) -> usize {
        self.state.lock().inbound.len()
    }

    /// Everything written so far.
    pub fn written(&self) -> Vec<u8> {
        self.state.lock().written.clone()
    }

    /// Everything written so far, clearing the capture.
    pub fn take_written(&self) -> Vec<u8> {
        std::mem::take(&mut self.state.lock().written)
    }
}

impl Transport for MemoryTransport {
    fn read_byte(&mut self) -> Result<Option<u8>, TransportError> {
        Ok(self.state.lock().inbound.pop_front())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.state.lock().written.extend_from_slice(bytes);
        Ok(())
    }
}

/// Transport over any `Read + Write` stream, such as a serial device or a
/// TCP socket with a read timeout configured.
#[derive(Debug)]
pub struct StreamTransport<S> {
    stream: S,
}

impl<S: Read + Write + Send> StreamTransport<S> {
    /// Wrap a stream.
    pub fn new(stream: S) -> Self {
        StreamTransport { stream }
    }
}

impl<S: Read + Write + Send> Transport for StreamTransport<S> {
    fn read_byte(&mut self) -> Result<Option<u8>, TransportError> {
        let mut byte = [0u8; 1];
        match self.stream.read(&mut byte) {
            Ok(0) => Err(TransportError::Closed),
            Ok(_) => Ok(Some(byte[0])),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Ok(None)
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.stream.write_all(bytes)?;
        self.stream.flush()?;
        Ok(())
    }
}

/// The transport slot of a running node.
///
/// Only the I/O loop reads from it; replies are written from the same loop
/// while a frame is being handled. Detaching drops the transport.
#[derive(Clone, Default)]
pub(crate) struct Link {
    inner: Arc<Mutex<Option<Box<dyn Transport>>>>,
}

impl Link {
    pub(crate) fn attach(&self, transport: Box<dyn Transport>) {
        *self.inner.lock() = Some(transport);
    }

    pub(crate) fn detach(&self) -> Option<Box<dyn Transport>> {
        self.inner.lock().take()
    }

    #[cfg(test)]
    pub(crate) fn is_attached(&self) -> bool {
        self.inner.lock().is_some()
    }

    pub(crate) fn read_byte(&self) -> Result<Option<u8>, TransportError> {
        match self.inner.lock().as_mut() {
            Some(transport) => transport.read_byte(),
            None => Err(TransportError::Closed),
        }
    }

    /// Write if attached. Returns whether anything was written.
    pub(crate) fn write(&self, bytes: &[u8]) -> Result<bool, TransportError> {
        match self.inner.lock().as_mut() {
            Some(transport) => {
                transport.write_bytes(bytes)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_memory_transport_shared() {
        let transport = MemoryTransport::new();
        let mut handle = transport.clone();

        transport.feed(&[0x7E, 0x00]);
        assert_eq!(transport.pending(), 2);
        assert_eq!(handle.read_byte().unwrap(), Some(0x7E));
        assert_eq!(handle.read_byte().unwrap(), Some(0x00));
        assert_eq!(handle.read_byte().unwrap(), None);

        handle.write_bytes(b"abc").unwrap();
        assert_eq!(transport.written(), b"abc");
        assert_eq!(transport.take_written(), b"abc");
        assert!(transport.written().is_empty());
    }

    #[test]
    fn test_stream_transport_eof_is_closed() {
        let mut transport = StreamTransport::new(Cursor::new(vec![0x42]));
        assert_eq!(transport.read_byte().unwrap(), Some(0x42));
        assert!(matches!(transport.read_byte(), Err(TransportError::Closed)));
    }

    #[test]
    fn test_link_write_when_detached() {
        let link = Link::default();
        assert!(!link.write(b"x").unwrap());
        assert!(matches!(link.read_byte(), Err(TransportError::Closed)));

        let transport = MemoryTransport::new();
        link.attach(Box::new(transport.clone()));
        assert!(link.is_attached());
        assert!(link.write(b"x").unwrap());
        assert_eq!(transport.written(), b"x");

        assert!(link.detach().is_some());
        assert!(!link.is_attached());
    }
}

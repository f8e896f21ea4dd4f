//! Background reader thread.
//!
//! One thread per running node owns the read side of the transport. It pulls
//! bytes into a [`FrameCodec`], hands each complete frame to the node and
//! only then looks at the next one, so frames are handled strictly in
//! arrival order. A halt request is honoured between frames, never while a
//! frame is being handled. Bytes after the last handled frame stay in the
//! transport, apart from a partly received frame which is dropped.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use tracing::{debug, trace, warn};
use zigbee_frame::{Frame, FrameCodec};

use crate::transport::{Link, TransportError};

/// Bytes read before the loop yields to check for more work.
const READ_BURST: usize = 4096;

/// Running reader thread of a node.
pub(crate) struct IoLoop {
    halt_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl IoLoop {
    /// Spawn the reader thread.
    ///
    /// `handler` is called on the reader thread for every frame that passes
    /// the checksum.
    pub(crate) fn spawn<F>(
        name: &str,
        link: Link,
        poll_interval: Duration,
        handler: F,
    ) -> std::io::Result<Self>
    where
        F: FnMut(Frame) + Send + 'static,
    {
        let (halt_tx, halt_rx) = bounded(1);
        let thread_name = format!("io-{}", name);
        let handle = thread::Builder::new()
            .name(thread_name)
            .spawn(move || run(link, poll_interval, halt_rx, handler))?;

        Ok(IoLoop {
            halt_tx,
            handle: Some(handle),
        })
    }

    /// Ask the thread to stop after the current frame and wait for it.
    pub(crate) fn halt(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.halt_tx.try_send(());
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() == thread::current().id() {
                // Halted from inside a frame handler; the loop exits on its own.
                return;
            }
            if handle.join().is_err() {
                warn!("I/O thread panicked");
            }
        }
    }
}

impl Drop for IoLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

fn halt_requested(halt_rx: &Receiver<()>) -> bool {
    !matches!(halt_rx.try_recv(), Err(TryRecvError::Empty))
}

fn run<F>(link: Link, poll_interval: Duration, halt_rx: Receiver<()>, mut handler: F)
where
    F: FnMut(Frame),
{
    debug!("I/O loop started");
    let mut codec = FrameCodec::new();

    'outer: loop {
        let mut received = 0usize;
        while received < READ_BURST {
            if halt_requested(&halt_rx) {
                break 'outer;
            }
            match link.read_byte() {
                Ok(Some(byte)) => {
                    codec.push(&[byte]);
                    received += 1;
                }
                Ok(None) => break,
                Err(TransportError::Closed) => {
                    debug!("transport closed");
                    break 'outer;
                }
                Err(e) => {
                    warn!("transport read failed: {}", e);
                    break;
                }
            }
            // Frames are handled as soon as their last byte arrives, so a halt
            // leaves every later byte unread in the transport.
            dispatch(&mut codec, &mut handler);
        }

        if received == 0 {
            match halt_rx.recv_timeout(poll_interval) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }
        }
    }

    if codec.buffered_len() > 0 {
        trace!("dropping {} buffered bytes", codec.buffered_len());
    }
    debug!("I/O loop stopped");
}

fn dispatch<F>(codec: &mut FrameCodec, handler: &mut F)
where
    F: FnMut(Frame),
{
    loop {
        match codec.decode() {
            Ok(Some(frame)) => {
                trace!(
                    "frame type 0x{:02x}, {} payload bytes",
                    frame.frame_type,
                    frame.payload.len()
                );
                handler(frame);
            }
            Ok(None) => break,
            Err(e) => debug!("discarding frame: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;
    use crossbeam_channel::unbounded;
    use std::time::Instant;

    fn wait_for<F: Fn() -> bool>(condition: F) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn test_frames_delivered_in_order() {
        let transport = MemoryTransport::new();
        let link = Link::default();
        link.attach(Box::new(transport.clone()));

        let (tx, rx) = unbounded();
        let io = IoLoop::spawn("test", link, Duration::from_millis(1), move |frame| {
            let _ = tx.send(frame.payload);
        })
        .unwrap();

        let mut bytes = Vec::new();
        for i in 0u8..5 {
            bytes.extend(FrameCodec::encode(0x91, &[i, 0x7E]).unwrap());
        }
        bytes.extend_from_slice(&[0x00, 0x13]);
        transport.feed(&bytes);

        for i in 0u8..5 {
            let payload = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            assert_eq!(payload, vec![i, 0x7E]);
        }
        assert!(wait_for(|| transport.pending() == 0));
        io.halt();
    }

    #[test]
    fn test_bad_frame_does_not_stop_loop() {
        let transport = MemoryTransport::new();
        let link = Link::default();
        link.attach(Box::new(transport.clone()));

        let (tx, rx) = unbounded();
        let io = IoLoop::spawn("test", link, Duration::from_millis(1), move |frame| {
            let _ = tx.send(frame.payload);
        })
        .unwrap();

        let mut corrupt = FrameCodec::encode(0x91, &[0x01, 0x02]).unwrap();
        let last = corrupt.len() - 1;
        corrupt[last] ^= 0x01;
        transport.feed(&corrupt);
        transport.feed(&FrameCodec::encode(0x91, &[0x03]).unwrap());

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), vec![0x03]);
        io.halt();
    }

    #[test]
    fn test_closed_transport_ends_loop() {
        let link = Link::default();
        let io = IoLoop::spawn("test", link, Duration::from_millis(1), |_| {}).unwrap();
        io.halt();
    }

    #[test]
    fn test_halt_leaves_later_frames_unread() {
        let transport = MemoryTransport::new();
        let link = Link::default();
        link.attach(Box::new(transport.clone()));

        let (seen_tx, seen_rx) = unbounded();
        let (release_tx, release_rx) = unbounded::<()>();
        let io = IoLoop::spawn("test", link, Duration::from_millis(1), move |frame| {
            let _ = seen_tx.send(frame.payload);
            let _ = release_rx.recv_timeout(Duration::from_secs(5));
        })
        .unwrap();

        let mut rest = Vec::new();
        for i in 1u8..4 {
            rest.extend(FrameCodec::encode(0x91, &[i]).unwrap());
        }
        let mut bytes = FrameCodec::encode(0x91, &[0x00]).unwrap();
        bytes.extend_from_slice(&rest);
        transport.feed(&bytes);

        // Ask for a halt while the first frame is still being handled
        assert_eq!(seen_rx.recv_timeout(Duration::from_secs(5)).unwrap(), vec![0x00]);
        io.halt_tx.try_send(()).unwrap();
        release_tx.send(()).unwrap();
        io.halt();

        assert!(seen_rx.try_recv().is_err());
        assert_eq!(transport.pending(), rest.len());
    }
}

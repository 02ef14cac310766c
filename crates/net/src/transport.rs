//! Byte-stream transports behind a non-blocking trait.
//!
//! The dispatch core is single-threaded: the frame loop calls the pump once
//! per frame and nothing may block, so transports report "not ready" as an
//! explicit value instead of suspending. [`TcpTransport`] talks to real
//! servers; tests use the in-memory [`MemoryTransport`] pair.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::rc::Rc;

use anyhow::{Context, Result};
use tracing::{debug, info};

/// Outcome of a non-blocking read attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `n` bytes were copied into the caller's buffer.
    Data(usize),
    /// No bytes ready; try again next pump.
    NotReady,
    /// The peer closed the stream cleanly.
    Closed,
}

/// A non-blocking, connection-oriented byte stream.
pub trait Transport {
    /// Copy any available bytes into `buf` without blocking.
    fn try_read(&mut self, buf: &mut [u8]) -> io::Result<ReadOutcome>;

    /// Write as many of `bytes` as the OS accepts without blocking.
    /// Returns the number of bytes taken; 0 means "try again next pump".
    fn try_write(&mut self, bytes: &[u8]) -> io::Result<usize>;

    /// Close the stream. Idempotent.
    fn shutdown(&mut self);
}

/// TCP transport over a non-blocking `std::net::TcpStream`.
pub struct TcpTransport {
    stream: TcpStream,
    open: bool,
}

impl TcpTransport {
    /// Connect to `addr` and switch the stream to non-blocking mode.
    pub fn connect<A: ToSocketAddrs + std::fmt::Debug>(addr: A) -> Result<Self> {
        info!("connecting to {:?}", addr);
        let stream = TcpStream::connect(&addr)
            .with_context(|| format!("failed to connect to {addr:?}"))?;
        stream
            .set_nonblocking(true)
            .context("failed to switch stream to non-blocking mode")?;
        stream.set_nodelay(true).ok();
        Ok(Self { stream, open: true })
    }

    /// Wrap an already-connected stream (switches it to non-blocking mode).
    pub fn from_stream(stream: TcpStream) -> Result<Self> {
        stream
            .set_nonblocking(true)
            .context("failed to switch stream to non-blocking mode")?;
        Ok(Self { stream, open: true })
    }
}

impl Transport for TcpTransport {
    fn try_read(&mut self, buf: &mut [u8]) -> io::Result<ReadOutcome> {
        if !self.open {
            return Ok(ReadOutcome::Closed);
        }
        match self.stream.read(buf) {
            Ok(0) => Ok(ReadOutcome::Closed),
            Ok(n) => Ok(ReadOutcome::Data(n)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(ReadOutcome::NotReady),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(ReadOutcome::NotReady),
            Err(e) => Err(e),
        }
    }

    fn try_write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        if !self.open {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "shut down"));
        }
        match self.stream.write(bytes) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn shutdown(&mut self) {
        if self.open {
            debug!("shutting down tcp transport");
            self.stream.shutdown(Shutdown::Both).ok();
            self.open = false;
        }
    }
}

#[derive(Default)]
struct Pipe {
    data: VecDeque<u8>,
    closed: bool,
}

/// In-memory loopback transport. [`MemoryTransport::pair`] returns two ends
/// wired to each other; writes on one side become reads on the other.
///
/// Also useful for scripted tests: `peer` handles let a test inject inbound
/// bytes a few at a time to exercise partial-frame handling.
pub struct MemoryTransport {
    incoming: Rc<RefCell<Pipe>>,
    outgoing: Rc<RefCell<Pipe>>,
    /// Cap on bytes accepted per `try_write`; tests use this to force
    /// partial sends. `usize::MAX` means unlimited.
    pub write_limit: usize,
}

impl MemoryTransport {
    /// Create two connected ends.
    pub fn pair() -> (Self, Self) {
        let a = Rc::new(RefCell::new(Pipe::default()));
        let b = Rc::new(RefCell::new(Pipe::default()));
        (
            Self {
                incoming: Rc::clone(&a),
                outgoing: Rc::clone(&b),
                write_limit: usize::MAX,
            },
            Self {
                incoming: b,
                outgoing: a,
                write_limit: usize::MAX,
            },
        )
    }
}

impl Transport for MemoryTransport {
    fn try_read(&mut self, buf: &mut [u8]) -> io::Result<ReadOutcome> {
        let mut pipe = self.incoming.borrow_mut();
        if pipe.data.is_empty() {
            return Ok(if pipe.closed {
                ReadOutcome::Closed
            } else {
                ReadOutcome::NotReady
            });
        }
        let mut copied = 0;
        while copied < buf.len() {
            match pipe.data.pop_front() {
                Some(byte) => {
                    buf[copied] = byte;
                    copied += 1;
                }
                None => break,
            }
        }
        Ok(ReadOutcome::Data(copied))
    }

    fn try_write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        let mut pipe = self.outgoing.borrow_mut();
        if pipe.closed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer closed"));
        }
        let accept = bytes.len().min(self.write_limit);
        pipe.data.extend(&bytes[..accept]);
        Ok(accept)
    }

    fn shutdown(&mut self) {
        self.incoming.borrow_mut().closed = true;
        self.outgoing.borrow_mut().closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_pair_moves_bytes_both_ways() {
        let (mut a, mut b) = MemoryTransport::pair();
        assert_eq!(a.try_write(b"ping").unwrap(), 4);

        let mut buf = [0u8; 16];
        match b.try_read(&mut buf).unwrap() {
            ReadOutcome::Data(4) => assert_eq!(&buf[..4], b"ping"),
            other => panic!("expected 4 bytes, got {other:?}"),
        }

        assert_eq!(b.try_write(b"pong").unwrap(), 4);
        match a.try_read(&mut buf).unwrap() {
            ReadOutcome::Data(4) => assert_eq!(&buf[..4], b"pong"),
            other => panic!("expected 4 bytes, got {other:?}"),
        }
    }

    #[test]
    fn empty_pipe_reports_not_ready_then_closed() {
        let (mut a, mut b) = MemoryTransport::pair();
        let mut buf = [0u8; 4];
        assert_eq!(a.try_read(&mut buf).unwrap(), ReadOutcome::NotReady);

        b.shutdown();
        assert_eq!(a.try_read(&mut buf).unwrap(), ReadOutcome::Closed);
        // Shutdown is idempotent.
        b.shutdown();
    }

    #[test]
    fn write_limit_forces_partial_sends() {
        let (mut a, mut b) = MemoryTransport::pair();
        a.write_limit = 3;
        assert_eq!(a.try_write(b"abcdef").unwrap(), 3);

        let mut buf = [0u8; 8];
        match b.try_read(&mut buf).unwrap() {
            ReadOutcome::Data(3) => assert_eq!(&buf[..3], b"abc"),
            other => panic!("expected 3 bytes, got {other:?}"),
        }
    }
}

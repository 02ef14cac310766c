//! One established server link: transport, buffers, and the pump loops.
//!
//! The client drives `pump_receive`/`pump_send` once per frame. Neither ever
//! blocks; "no data yet" and "OS took a partial write" are ordinary return
//! paths handled on the next pump.

use tracing::{debug, error, info, warn};

use crate::buffer::{ByteOrder, WireBuffer};
use crate::context::GameContext;
use crate::dispatch::DispatchTable;
use crate::envelope::{MessageIn, MessageOut};
use crate::error::NetError;
use crate::family::{FrameDecision, FrameInfo, ProtocolFamily};
use crate::transport::{ReadOutcome, Transport};

/// Traffic counters for diagnostics overlays.
#[derive(Debug, Default, Clone, Copy)]
pub struct PacketCounters {
    /// Messages dispatched (including skipped unknowns).
    pub in_packets: u64,
    /// Bytes consumed from the inbound stream.
    pub in_bytes: u64,
    /// Messages queued for send.
    pub out_packets: u64,
    /// Bytes flushed to the transport.
    pub out_bytes: u64,
}

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Connected,
    Disconnected,
}

/// A live (or recently dead) server link.
pub struct Connection {
    transport: Box<dyn Transport>,
    inbound: WireBuffer,
    outbound: Vec<u8>,
    state: State,
    version: u32,
    /// Bytes still to be discarded from the inbound stream: the unreceived
    /// tail of a frame that was skipped before it fully arrived.
    pending_skip: usize,
    counters: PacketCounters,
}

impl Connection {
    /// Wrap an established transport. `order` must match the active
    /// family's byte order.
    pub fn new(transport: Box<dyn Transport>, order: ByteOrder) -> Self {
        Self {
            transport,
            inbound: WireBuffer::new(order),
            outbound: Vec::new(),
            state: State::Connected,
            version: 0,
            pending_skip: 0,
            counters: PacketCounters::default(),
        }
    }

    /// Negotiated protocol version; layout branches compare `>=` against
    /// epoch constants.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Record the version negotiated during session setup.
    pub fn set_version(&mut self, version: u32) {
        debug!(version, "protocol version negotiated");
        self.version = version;
    }

    /// Whether the transport is still usable.
    pub fn is_connected(&self) -> bool {
        self.state == State::Connected
    }

    /// Traffic counters since connect.
    pub fn counters(&self) -> PacketCounters {
        self.counters
    }

    /// Bytes queued but not yet flushed.
    pub fn queued_send_bytes(&self) -> usize {
        self.outbound.len()
    }

    /// Close the link and abandon all buffered bytes, both directions.
    /// Idempotent: a second call is a no-op.
    pub fn disconnect(&mut self) {
        if self.state == State::Disconnected {
            return;
        }
        info!("disconnecting");
        self.transport.shutdown();
        self.inbound.clear();
        self.outbound.clear();
        self.pending_skip = 0;
        self.state = State::Disconnected;
    }

    /// Append one encoded message to the outbound buffer. The frame goes in
    /// whole; partial messages are never interleaved.
    pub fn send(&mut self, msg: MessageOut) {
        if self.state == State::Disconnected {
            warn!(id = format_args!("{:#06x}", msg.id()), "send after disconnect dropped");
            return;
        }
        let bytes = msg.finish();
        self.counters.out_packets += 1;
        self.outbound.extend_from_slice(&bytes);
    }

    /// Flush as much of the outbound buffer as the OS accepts. Bytes the OS
    /// refuses stay queued, already serialized, for the next pump.
    pub fn pump_send(&mut self) -> Result<(), NetError> {
        if self.state == State::Disconnected || self.outbound.is_empty() {
            return Ok(());
        }
        let written = match self.transport.try_write(&self.outbound) {
            Ok(n) => n,
            Err(e) => {
                self.fail(format!("send failed: {e}"));
                return Err(NetError::ConnectionLost(format!("send failed: {e}")));
            }
        };
        if written > 0 {
            self.counters.out_bytes += written as u64;
            self.outbound.drain(..written);
        }
        Ok(())
    }

    /// Pull newly arrived bytes off the transport, then decode and dispatch
    /// complete messages, at most `budget` per call. Excess messages stay
    /// buffered for the next pump; nothing is dropped.
    ///
    /// Returns the number of messages dispatched.
    pub fn pump_receive(
        &mut self,
        family: &dyn ProtocolFamily,
        table: &mut DispatchTable,
        ctx: &mut GameContext<'_>,
        budget: usize,
    ) -> Result<usize, NetError> {
        if self.state == State::Disconnected {
            return Ok(0);
        }
        self.fill_inbound()?;
        self.drain_pending_skip();

        let mut dispatched = 0;
        while dispatched < budget {
            let decision = match family.next_frame(self.inbound.unread(), self.version) {
                Ok(decision) => decision,
                Err(err) => {
                    // No length rule means no way back into alignment.
                    error!(%err, "unrecoverable framing error");
                    self.fail(err.to_string());
                    return Err(NetError::ConnectionLost(err.to_string()));
                }
            };
            let info = match decision {
                FrameDecision::Incomplete => break,
                FrameDecision::Malformed(info) => {
                    error!(
                        id = format_args!("{:#06x}", info.id),
                        len = info.total_len,
                        "malformed message skipped by declared length"
                    );
                    self.skip_frame(info.total_len);
                    dispatched += 1;
                    continue;
                }
                FrameDecision::Frame(info) => info,
            };
            if self.inbound.remaining() < info.total_len {
                break;
            }
            self.dispatch_one(info, family, table, ctx);
            dispatched += 1;
        }

        self.inbound.compact();
        Ok(dispatched)
    }

    fn dispatch_one(
        &mut self,
        info: FrameInfo,
        family: &dyn ProtocolFamily,
        table: &mut DispatchTable,
        ctx: &mut GameContext<'_>,
    ) {
        let start = self.inbound.tell();
        {
            let frame = &self.inbound.as_slice()[start..start + info.total_len];
            let mut msg = MessageIn::new(
                info.id,
                frame,
                info.header_len,
                self.version,
                family.byte_order(),
            );
            // Handler outcome never moves the stream cursor: alignment
            // comes from the declared length alone.
            table.dispatch(&mut msg, ctx);
        }
        self.counters.in_packets += 1;
        self.counters.in_bytes += info.total_len as u64;
        self.inbound.seek(start + info.total_len);
    }

    /// Discard a frame by its declared length, even if its tail has not
    /// arrived yet; the remainder is discarded as it comes in.
    fn skip_frame(&mut self, total_len: usize) {
        let buffered = self.inbound.remaining();
        let now = total_len.min(buffered);
        self.inbound.seek(self.inbound.tell() + now);
        self.counters.in_packets += 1;
        self.counters.in_bytes += now as u64;
        self.pending_skip = total_len - now;
    }

    fn drain_pending_skip(&mut self) {
        if self.pending_skip == 0 {
            return;
        }
        let buffered = self.inbound.remaining();
        let now = self.pending_skip.min(buffered);
        self.inbound.seek(self.inbound.tell() + now);
        self.counters.in_bytes += now as u64;
        self.pending_skip -= now;
    }

    fn fill_inbound(&mut self) -> Result<(), NetError> {
        let mut chunk = [0u8; 4096];
        loop {
            match self.transport.try_read(&mut chunk) {
                Ok(ReadOutcome::Data(n)) => {
                    self.inbound.write_bytes(&chunk[..n]);
                    if n < chunk.len() {
                        return Ok(());
                    }
                }
                Ok(ReadOutcome::NotReady) => return Ok(()),
                Ok(ReadOutcome::Closed) => {
                    self.fail("closed by server".to_string());
                    return Err(NetError::ConnectionLost("closed by server".into()));
                }
                Err(e) => {
                    self.fail(format!("receive failed: {e}"));
                    return Err(NetError::ConnectionLost(format!("receive failed: {e}")));
                }
            }
        }
    }

    fn fail(&mut self, reason: String) {
        warn!(%reason, "connection lost");
        self.transport.shutdown();
        self.inbound.clear();
        self.outbound.clear();
        self.pending_skip = 0;
        self.state = State::Disconnected;
    }
}

#![warn(missing_docs)]
//! Wire protocol layer of the Riftmere client.
//!
//! Everything between the socket and the game simulation lives here: the
//! byte-level codec ([`buffer`], [`envelope`]), the non-blocking pump over a
//! [`transport`], the id-to-handler [`dispatch`] table, the three protocol
//! [`family`] implementations, and the [`manager`] that owns a session.
//!
//! The layer is single-threaded: the client drives
//! [`NetworkManager::flush_network`] once per frame, and handlers apply
//! message effects synchronously through the collaborator traits in
//! `riftmere-core`.

pub mod buffer;
pub mod config;
pub mod connection;
mod context;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod family;
pub mod limiter;
pub mod manager;
pub mod solmara;
pub mod transport;
pub mod vael;
pub mod vaelheim;
pub mod vaelora;

pub use buffer::{ByteOrder, WireBuffer};
pub use config::NetConfig;
pub use connection::{Connection, PacketCounters};
pub use context::GameContext;
pub use dispatch::{DispatchOutcome, DispatchTable, PacketHandler};
pub use envelope::{FramePrefix, MessageIn, MessageOut};
pub use error::NetError;
pub use family::{FamilyModule, FrameDecision, ProtocolFamily, ServerFamily, ServerFeatures};
pub use manager::NetworkManager;
pub use transport::{MemoryTransport, ReadOutcome, TcpTransport, Transport};

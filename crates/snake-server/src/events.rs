//! Status-TUI event feed, mirroring the teacher's `ServerEvent`/`drain_events`
//! pattern (`crates/server/src/server.rs` in the teacher repo) but carrying
//! the snake-arena facts instead of dual's entity/RTT ones.

use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub enum ServerEvent {
    ClientConnected {
        addr: SocketAddr,
        login: String,
        player_id: u64,
    },
    ClientDisconnected {
        addr: SocketAddr,
        login: Option<String>,
        reason: DisconnectReason,
    },
    ConnectionDenied {
        addr: SocketAddr,
        reason: String,
    },
    GameStarted {
        field: u32,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Copy)]
pub enum DisconnectReason {
    Graceful,
    Protocol,
}

impl DisconnectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisconnectReason::Graceful => "disconnected",
            DisconnectReason::Protocol => "dropped (protocol/io error)",
        }
    }
}

//! Server acceptor (spec §4.H): owns the field-id → game mapping and the
//! user directory, and spawns a connection handler per accepted socket.
//! Grounded on the teacher's `GameServer` (`crates/server/src/server.rs`)
//! for the owns-the-world / spawns-per-connection shape, adapted from a
//! single-socket UDP endpoint to a `TcpListener` accept loop — the
//! `accept()`-then-`tokio::spawn()` pattern is enriched from
//! `andrewgazelka-hyperion`'s `hyperion-proxy` crate (`src/lib.rs`'s
//! `run_proxy`/`connect_to_server_and_run_proxy`), which is the pack's only
//! repo with a real tokio TCP accept loop to imitate.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use snake::{Game, UserDirectory};

use crate::connection;
use crate::events::ServerEvent;

#[derive(Debug, thiserror::Error)]
pub enum AddGameError {
    #[error("field id {0} is already registered")]
    Duplicate(u32),
}

/// Owns every [`Game`] this process is serving, keyed by field id, plus the
/// shared [`UserDirectory`] every connection authenticates against.
pub struct Acceptor {
    games: HashMap<u32, Arc<Game>>,
    users: Arc<UserDirectory>,
}

impl Acceptor {
    pub fn new(users: Arc<UserDirectory>) -> Self {
        Self {
            games: HashMap::new(),
            users,
        }
    }

    /// Registers a game under its own id. Rejects a duplicate field id
    /// (spec §4.H: "add_game rejects duplicate field ids").
    pub fn add_game(&mut self, game: Arc<Game>) -> Result<(), AddGameError> {
        if self.games.contains_key(&game.id) {
            return Err(AddGameError::Duplicate(game.id));
        }
        self.games.insert(game.id, game);
        Ok(())
    }

    pub fn game(&self, field: u32) -> Option<Arc<Game>> {
        self.games.get(&field).cloned()
    }

    pub fn games(&self) -> impl Iterator<Item = &Arc<Game>> {
        self.games.values()
    }

    pub fn users(&self) -> &Arc<UserDirectory> {
        &self.users
    }

    /// Accepts connections until the listener errors, spawning one
    /// [`connection::handle`] task per socket. Errors on an individual
    /// `accept()` call are logged and do not stop the loop (spec §7 treats
    /// per-connection I/O failures as connection-scoped, never fatal).
    pub async fn serve(self: Arc<Self>, listener: TcpListener, events: mpsc::UnboundedSender<ServerEvent>) {
        loop {
            let (socket, addr) = match listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("accept() failed: {e}");
                    continue;
                }
            };
            if let Err(e) = socket.set_nodelay(true) {
                log::debug!("failed to set TCP_NODELAY for {addr}: {e}");
            }
            log::debug!("accepted connection from {addr}");
            let acceptor = self.clone();
            let events = events.clone();
            tokio::spawn(async move {
                connection::handle(socket, addr, acceptor, events).await;
            });
        }
    }
}

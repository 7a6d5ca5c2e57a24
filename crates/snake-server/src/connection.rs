//! Per-connection state machine (spec §4.G): HEADER_READ → BODY_READ →
//! DISPATCH → (HEADER_READ | CLOSED), here collapsed into one `tokio::select!`
//! loop since [`snake::read_frame`] already performs the header/body framing.
//!
//! Send pacing and backpressure (spec §5 / §9's "Idle/Sending" redesign
//! flag) are modeled with an `AtomicBool` gate: the pacing timer only
//! starts a new batch of `Field` sends when the gate is `false` (Idle); the
//! spawned send task flips it back to `false` when the write completes.
//! Net effect matches spec §5 exactly — "a connection with outstanding
//! writes does not re-arm its send timer until the last write completes" —
//! without needing a literal cancel/re-arm timer object, since a busy gate
//! makes every intervening tick a no-op.
//!
//! Grounded on the teacher's per-connection lifecycle (`GameServer`'s
//! client-connect/disconnect bookkeeping in `crates/server/src/server.rs`),
//! adapted from UDP session tracking to one task per TCP socket — the
//! split-reader/writer-half and spawned-send-task shape is enriched from
//! `andrewgazelka-hyperion`'s `hyperion-proxy` connection handling
//! (`crates/hyperion-proxy/src/player.rs`).

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};

use snake::{read_frame, write_frame, Direction, FrameError, FrameIoError, Game, Message};

use crate::acceptor::Acceptor;
use crate::events::{DisconnectReason, ServerEvent};
use crate::visibility;

/// Delay before a freshly-authenticated connection's first `Field` send,
/// and the steady-state pacing period thereafter (spec §4.G / scenario A).
const FIELD_SEND_PERIOD: Duration = Duration::from_millis(100);

type SharedWriter = Arc<Mutex<OwnedWriteHalf>>;

enum ConnState {
    Unauthenticated,
    Authenticated {
        login: String,
        player_id: u64,
        game: Arc<Game>,
    },
}

pub async fn handle(
    socket: TcpStream,
    addr: SocketAddr,
    acceptor: Arc<Acceptor>,
    events: mpsc::UnboundedSender<ServerEvent>,
) {
    let (mut reader, writer) = socket.into_split();
    let writer: SharedWriter = Arc::new(Mutex::new(writer));
    let sending = Arc::new(AtomicBool::new(false));
    let mut pacer: Option<tokio::time::Interval> = None;
    let mut state = ConnState::Unauthenticated;
    let mut disconnect_reason = DisconnectReason::Graceful;

    loop {
        tokio::select! {
            frame = read_frame(&mut reader) => {
                match frame {
                    Ok(Some(body)) => {
                        match Message::decode(&body) {
                            Ok(msg) => {
                                let keep_reading = dispatch(
                                    msg,
                                    &mut state,
                                    &acceptor,
                                    &writer,
                                    &sending,
                                    &mut pacer,
                                    addr,
                                    &events,
                                )
                                .await;
                                if !keep_reading {
                                    break;
                                }
                            }
                            Err(FrameError::Malformed(reason)) => {
                                send_now(&writer, &Message::error(format!("malformed message: {reason}"))).await;
                            }
                            Err(FrameError::Oversized { size, limit }) => {
                                send_now(
                                    &writer,
                                    &Message::error(format!("frame of {size} bytes exceeds the {limit}-byte maximum")),
                                )
                                .await;
                            }
                        }
                    }
                    Ok(None) => break,
                    Err(FrameIoError::Oversized { size, limit }) => {
                        send_now(
                            &writer,
                            &Message::error(format!("frame of {size} bytes exceeds the {limit}-byte maximum")),
                        )
                        .await;
                    }
                    Err(e) => {
                        log::debug!("{addr}: read error, dropping connection: {e}");
                        disconnect_reason = DisconnectReason::Protocol;
                        break;
                    }
                }
            }
            _ = pace_tick(&mut pacer) => {
                if let ConnState::Authenticated { player_id, game, .. } = &state {
                    try_send_field(game, *player_id, &writer, &sending);
                }
            }
        }
    }

    if let ConnState::Authenticated { login, game, .. } = &state {
        game.disconnect_player(login);
        let _ = events.send(ServerEvent::ClientDisconnected {
            addr,
            login: Some(login.clone()),
            reason: disconnect_reason,
        });
    }
}

/// Applies one decoded message to the connection's state. Returns `false`
/// when the caller should stop reading (an `Exit` message, spec §4.F).
async fn dispatch(
    msg: Message,
    state: &mut ConnState,
    acceptor: &Arc<Acceptor>,
    writer: &SharedWriter,
    sending: &Arc<AtomicBool>,
    pacer: &mut Option<tokio::time::Interval>,
    addr: SocketAddr,
    events: &mpsc::UnboundedSender<ServerEvent>,
) -> bool {
    match msg {
        Message::Login {
            login,
            password,
            field,
            level,
        } => {
            if matches!(state, ConnState::Authenticated { .. }) {
                send_now(writer, &Message::error("already logged in")).await;
                return true;
            }
            let Some(game) = acceptor.game(field) else {
                send_now(writer, &Message::error(format!("unknown field {field}"))).await;
                let _ = events.send(ServerEvent::ConnectionDenied {
                    addr,
                    reason: format!("unknown field {field}"),
                });
                return true;
            };
            if !acceptor.users().authenticate(&login, &password, level) {
                send_now(writer, &Message::error("invalid login, password, or level")).await;
                let _ = events.send(ServerEvent::ConnectionDenied {
                    addr,
                    reason: format!("bad credentials for {login:?}"),
                });
                return true;
            }
            // Pass the *stored* level to get_player, not the client's
            // requested one (spec §4.D get_player / §9 lobby semantics).
            let stored_level = acceptor.users().level_of(&login).unwrap_or(level);
            let player_id = game.get_player(&login, stored_level);
            if game.take_started_event() {
                let _ = events.send(ServerEvent::GameStarted { field });
            }

            match game.connect_player(&login) {
                Ok(_) => {
                    send_now(
                        writer,
                        &Message::Welcome {
                            player_id,
                            k10: game.cfg().k_10,
                        },
                    )
                    .await;
                    log::info!("game {}: {login} logged in as player {player_id}", field);
                    let _ = events.send(ServerEvent::ClientConnected {
                        addr,
                        login: login.clone(),
                        player_id,
                    });
                    *pacer = Some(tokio::time::interval_at(
                        tokio::time::Instant::now() + FIELD_SEND_PERIOD,
                        FIELD_SEND_PERIOD,
                    ));
                    *state = ConnState::Authenticated {
                        login,
                        player_id,
                        game,
                    };
                }
                Err(count) => {
                    send_now(writer, &Message::error("too many connections for this player")).await;
                    let _ = events.send(ServerEvent::ConnectionDenied {
                        addr,
                        reason: format!("{login} already has {count} connections"),
                    });
                }
            }
            true
        }
        Message::Direction {
            snake_id,
            direction,
            boost,
            split,
        } => {
            match state {
                ConnState::Authenticated { login, game, .. } => {
                    game.set_direction(
                        login,
                        snake_id,
                        Direction {
                            p: direction.into(),
                            boost,
                            split,
                        },
                    );
                }
                ConnState::Unauthenticated => {
                    send_now(writer, &Message::error("log in before sending a direction")).await;
                }
            }
            true
        }
        Message::Exit => false,
        Message::Welcome { .. } | Message::Error { .. } | Message::Field { .. } => {
            send_now(writer, &Message::error("unexpected message type for this direction")).await;
            true
        }
    }
}

async fn send_now(writer: &SharedWriter, msg: &Message) {
    let Ok(bytes) = msg.encode() else {
        return;
    };
    let mut w = writer.lock().await;
    let _ = write_frame(&mut *w, &bytes).await;
}

/// Awaits the next pacing fire, or never resolves while no timer is armed
/// (pre-authentication). Re-evaluated fresh on every loop iteration, so it
/// picks up `*pacer = Some(..)` as soon as login succeeds.
async fn pace_tick(pacer: &mut Option<tokio::time::Interval>) {
    match pacer {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Idle→Sending transition (spec §9): if a send is already outstanding this
/// tick is simply skipped, which is the "slow clients skip frames" backpressure
/// spec §5 describes.
fn try_send_field(game: &Arc<Game>, player_id: u64, writer: &SharedWriter, sending: &Arc<AtomicBool>) {
    if sending.swap(true, Ordering::AcqRel) {
        return;
    }
    let field = game.get_current_field();
    let messages = visibility::build_field_messages(&field, player_id, game.cfg());
    let writer = writer.clone();
    let sending = sending.clone();
    tokio::spawn(async move {
        for msg in messages {
            if let Ok(bytes) = msg.encode() {
                let mut w = writer.lock().await;
                if write_frame(&mut *w, &bytes).await.is_err() {
                    break;
                }
            }
        }
        sending.store(false, Ordering::Release);
    });
}

//! Tick scheduler (spec §4.I): a fixed-interval timer invoking `game.tick()`
//! on the I/O reactor. Ticks never overlap by construction — each call to
//! `tick()` runs to completion inside this task before the next `interval`
//! await point can resolve, and `Game::tick`'s own internals additionally
//! serialize on its mutexes if anyone else ever called it concurrently.
//!
//! `MissedTickBehavior::Delay` is the concrete choice for spec §4.I's "the
//! next fires immediately after and catches up no more than one tick at a
//! time": `tokio::time::Interval` only ever completes one `tick()` per call
//! regardless of mode, so the behavior that differs between the `Burst` /
//! `Delay` / `Skip` variants is what happens to *future* ticks after a
//! catch-up fire — `Delay` reschedules relative to `now`, so one overdue
//! tick fires immediately and the cadence resumes from there, rather than
//! bursting through every period that elapsed while the previous tick ran.

use std::sync::Arc;
use std::time::Instant;

use snake::Game;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;

use crate::gamelog::GameLog;

pub async fn run(game: Arc<Game>, log: Option<Arc<Mutex<GameLog>>>) {
    let mut interval = tokio::time::interval(game.cfg().tick_duration());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        let started = Instant::now();
        let field = game.tick();
        let elapsed = started.elapsed();

        if elapsed > game.cfg().tick_duration() {
            log::debug!(
                "game {}: tick {} took {:?}, exceeding the {:?} interval",
                game.id,
                field.tick,
                elapsed,
                game.cfg().tick_duration()
            );
        }

        if let Some(log) = &log {
            if field.tick % 16 == 0 {
                if let Err(e) = log.lock().await.record(&game) {
                    log::warn!("game {}: failed to append game log entry: {e}", game.id);
                }
            }
        }
    }
}

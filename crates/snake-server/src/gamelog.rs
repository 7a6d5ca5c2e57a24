//! Optional game log (spec §6): a JSON object per 16-tick interval mapping
//! `player_id` to total `w`, appended to a file as `{...},\n` so the whole
//! file is a valid (if comma-terminated) JSON array once wrapped in `[ ]`.
//! Uses `serde_json`, the teacher's own serialization crate for anything
//! that isn't wire traffic.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use snake::Game;

pub struct GameLog {
    file: File,
}

impl GameLog {
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }

    /// Appends one entry: `player_id` (as a JSON object key, since JSON
    /// object keys are always strings) → that player's total scored mass
    /// (`w_sum`, spec §3/§4.D.8's scoring accumulator).
    pub fn record(&mut self, game: &Game) -> std::io::Result<()> {
        let totals: BTreeMap<String, f32> = game
            .player_stats()
            .into_iter()
            .map(|p| (p.player_id.to_string(), p.w_sum))
            .collect();
        let line = serde_json::to_string(&totals)?;
        writeln!(self.file, "{line},")
    }
}

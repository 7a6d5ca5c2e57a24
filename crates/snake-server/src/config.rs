//! Process-level configuration (SPEC_FULL §13): bind address, port, users
//! file path, and display mode. These have no bearing on tick determinism,
//! unlike [`snake::GameConfig`], so they live in the server binary rather
//! than the simulation crate.

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub users_file: String,
    pub headless: bool,
    pub game_log: Option<String>,
    /// Field (game) ids to create at bootstrap. Spec §4.H's server owns a
    /// mapping from field id to game; a deployment with one arena just
    /// passes a single id (the default, `[0]`).
    pub field_ids: Vec<u32>,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

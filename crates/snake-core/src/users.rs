//! Flat-file user directory (spec §4.E).

use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum UsersFileError {
    #[error("failed to read users file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}:{line}: malformed entry {text:?}, expected `login password level`")]
    Malformed {
        path: String,
        line: usize,
        text: String,
    },
    #[error("{path}:{line}: level {text:?} is not a non-negative integer")]
    BadLevel {
        path: String,
        line: usize,
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct Credentials {
    password: String,
    level: u32,
}

/// login/password/level lookup, loaded once at bootstrap from a
/// whitespace-delimited text file. Lines starting with `#` are comments;
/// blank lines are skipped. Fails loudly (fatal at bootstrap, spec §7) if
/// the file is missing or any non-comment line is malformed.
#[derive(Debug, Default)]
pub struct UserDirectory {
    entries: HashMap<String, Credentials>,
}

impl UserDirectory {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, UsersFileError> {
        let path_ref = path.as_ref();
        let path_str = path_ref.display().to_string();
        let contents = std::fs::read_to_string(path_ref).map_err(|source| UsersFileError::Read {
            path: path_str.clone(),
            source,
        })?;
        Self::parse(&contents, &path_str)
    }

    fn parse(contents: &str, path: &str) -> Result<Self, UsersFileError> {
        let mut entries = HashMap::new();
        for (idx, raw_line) in contents.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split_whitespace();
            let (Some(login), Some(password), Some(level_text), None) = (
                fields.next(),
                fields.next(),
                fields.next(),
                fields.next(),
            ) else {
                return Err(UsersFileError::Malformed {
                    path: path.to_string(),
                    line: idx + 1,
                    text: line.to_string(),
                });
            };
            let level: u32 = level_text.parse().map_err(|_| UsersFileError::BadLevel {
                path: path.to_string(),
                line: idx + 1,
                text: level_text.to_string(),
            })?;
            entries.insert(
                login.to_string(),
                Credentials {
                    password: password.to_string(),
                    level,
                },
            );
        }
        Ok(Self { entries })
    }

    /// Returns `true` iff `login` exists, `password` matches exactly, and
    /// the stored level is at least `requested_level`.
    pub fn authenticate(&self, login: &str, password: &str, requested_level: u32) -> bool {
        match self.entries.get(login) {
            Some(creds) => creds.password == password && creds.level >= requested_level,
            None => false,
        }
    }

    /// The stored level for a login, used by the connection handler to pass
    /// the *actual* level along to `Game::get_player` rather than the
    /// client-requested one.
    pub fn level_of(&self, login: &str) -> Option<u32> {
        self.entries.get(login).map(|c| c.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comments_and_blank_lines() {
        let dir = UserDirectory::parse(
            "# comment\n\nalice pw 1\nbob secret 10\n",
            "test",
        )
        .unwrap();
        assert!(dir.authenticate("alice", "pw", 1));
        assert!(dir.authenticate("bob", "secret", 10));
    }

    #[test]
    fn level_gate_requires_at_least_requested() {
        let dir = UserDirectory::parse("alice pw 1\n", "test").unwrap();
        assert!(dir.authenticate("alice", "pw", 1));
        assert!(!dir.authenticate("alice", "pw", 10));
    }

    #[test]
    fn wrong_password_rejected() {
        let dir = UserDirectory::parse("alice pw 1\n", "test").unwrap();
        assert!(!dir.authenticate("alice", "wrong", 1));
    }

    #[test]
    fn unknown_login_rejected() {
        let dir = UserDirectory::parse("alice pw 1\n", "test").unwrap();
        assert!(!dir.authenticate("mallory", "pw", 1));
    }

    #[test]
    fn malformed_line_is_an_error() {
        let err = UserDirectory::parse("alice pw\n", "test").unwrap_err();
        assert!(matches!(err, UsersFileError::Malformed { .. }));
    }

    #[test]
    fn bad_level_is_an_error() {
        let err = UserDirectory::parse("alice pw ten\n", "test").unwrap_err();
        assert!(matches!(err, UsersFileError::BadLevel { .. }));
    }
}

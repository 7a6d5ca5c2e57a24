//! Wire message schema (spec §4.F): a tagged-union, binary, schema-evolution
//! friendly `Message` enum, hand-encoded as little-endian integers per the
//! spec's exact byte layout. The original `bdolgov/losh-slitherio` server
//! (`examples/original_source/server/network.cpp`, `library/library.hpp`)
//! generated this layout from a FlatBuffers schema; this crate has no
//! FlatBuffers codegen available, so the tag + length-prefixed-field layout
//! is hand-rolled instead, field-for-field matching the original's `Login`/
//! `Direction`/`Exit`/`Welcome`/`Error`/`Field`/`Snake`/`Food` message shapes
//! (see DESIGN.md's wire codec entry for the full accounting). Byte-level
//! read/write helpers are grounded on `oroboros_networking`'s
//! `PacketSerializer`/`PacketDeserializer`
//! (`examples/binacshera-ui-oroboros-engine/crates/oroboros_networking/src/protocol/serialization.rs`),
//! the pack's only repo with a real hand-rolled little-endian packet codec.

use crate::geometry::Point;

/// Maximum serialized message body size. Frames declaring a larger length
/// are a protocol error (spec §4.F / §7): the connection emits an `Error`
/// message and keeps reading rather than closing.
pub const MAX_FRAME_SIZE: usize = 16_384;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WirePoint {
    pub x: f32,
    pub y: f32,
}

impl From<Point> for WirePoint {
    fn from(p: Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<WirePoint> for Point {
    fn from(p: WirePoint) -> Self {
        Point::new(p.x, p.y)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WireSnake {
    pub player_id: u64,
    pub snake_id: u64,
    pub r: f32,
    pub skeleton: Vec<WirePoint>,
    pub head_visible: bool,
    pub boost: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WireFood {
    pub p: WirePoint,
    pub w: f32,
}

/// The full message schema. Every variant named in spec §4.F is present;
/// nothing else is added, since new variants would not round-trip through
/// older clients (the point of a tagged union on the wire).
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Login {
        login: String,
        password: String,
        field: u32,
        level: u32,
    },
    Direction {
        snake_id: u64,
        direction: WirePoint,
        boost: bool,
        split: bool,
    },
    Exit,
    Welcome {
        player_id: u64,
        k10: f32,
    },
    Error {
        description: String,
    },
    Field {
        snake_id: u64,
        w: f32,
        time: f32,
        snakes: Vec<WireSnake>,
        foods: Vec<WireFood>,
        borders: Option<Vec<(WirePoint, WirePoint)>>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame of {size} bytes exceeds the {limit}-byte maximum")]
    Oversized { size: usize, limit: usize },
    #[error("could not parse message body: {0}")]
    Malformed(String),
}

/// Tags for the outer `Message` union. A single byte, since the schema has
/// far fewer than 256 variants; unknown tags are a malformed message (spec
/// §7: "wrong message type in state" / "unparseable message").
const TAG_LOGIN: u8 = 0;
const TAG_DIRECTION: u8 = 1;
const TAG_EXIT: u8 = 2;
const TAG_WELCOME: u8 = 3;
const TAG_ERROR: u8 = 4;
const TAG_FIELD: u8 = 5;

/// Appends little-endian fields to a growable byte buffer. All multi-byte
/// integers and floats are little-endian per spec §4.F; only the outer
/// 4-byte frame length (written by [`crate::net::write_frame`]) is
/// big-endian.
struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn new() -> Self {
        Self { buf: Vec::new() }
    }

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(v as u8);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_string(&mut self, s: &str) {
        self.write_u32(s.len() as u32);
        self.buf.extend_from_slice(s.as_bytes());
    }

    fn write_point(&mut self, p: WirePoint) {
        self.write_f32(p.x);
        self.write_f32(p.y);
    }

    fn write_snake(&mut self, s: &WireSnake) {
        self.write_u64(s.player_id);
        self.write_u64(s.snake_id);
        self.write_f32(s.r);
        self.write_u32(s.skeleton.len() as u32);
        for p in &s.skeleton {
            self.write_point(*p);
        }
        self.write_bool(s.head_visible);
        self.write_bool(s.boost);
    }

    fn write_food(&mut self, f: &WireFood) {
        self.write_point(f.p);
        self.write_f32(f.w);
    }
}

/// Reads little-endian fields out of a message body, erroring on underrun,
/// an out-of-range tag, or invalid UTF-8 — all "could not parse message
/// body" per spec §7, not a panic.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], FrameError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| FrameError::Malformed("unexpected end of message".to_string()))?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, FrameError> {
        Ok(self.take(1)?[0])
    }

    fn read_bool(&mut self) -> Result<bool, FrameError> {
        Ok(self.read_u8()? != 0)
    }

    fn read_u32(&mut self) -> Result<u32, FrameError> {
        let bytes: [u8; 4] = self.take(4)?.try_into().unwrap();
        Ok(u32::from_le_bytes(bytes))
    }

    fn read_u64(&mut self) -> Result<u64, FrameError> {
        let bytes: [u8; 8] = self.take(8)?.try_into().unwrap();
        Ok(u64::from_le_bytes(bytes))
    }

    fn read_f32(&mut self) -> Result<f32, FrameError> {
        let bytes: [u8; 4] = self.take(4)?.try_into().unwrap();
        Ok(f32::from_le_bytes(bytes))
    }

    fn read_string(&mut self) -> Result<String, FrameError> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|e| FrameError::Malformed(e.to_string()))
    }

    fn read_point(&mut self) -> Result<WirePoint, FrameError> {
        Ok(WirePoint {
            x: self.read_f32()?,
            y: self.read_f32()?,
        })
    }

    fn read_snake(&mut self) -> Result<WireSnake, FrameError> {
        let player_id = self.read_u64()?;
        let snake_id = self.read_u64()?;
        let r = self.read_f32()?;
        let n = self.read_u32()? as usize;
        let mut skeleton = Vec::with_capacity(n);
        for _ in 0..n {
            skeleton.push(self.read_point()?);
        }
        let head_visible = self.read_bool()?;
        let boost = self.read_bool()?;
        Ok(WireSnake {
            player_id,
            snake_id,
            r,
            skeleton,
            head_visible,
            boost,
        })
    }

    fn read_food(&mut self) -> Result<WireFood, FrameError> {
        Ok(WireFood {
            p: self.read_point()?,
            w: self.read_f32()?,
        })
    }

    fn finish(self) -> Result<(), FrameError> {
        if self.pos == self.buf.len() {
            Ok(())
        } else {
            Err(FrameError::Malformed(format!(
                "{} trailing byte(s) after a fully-parsed message",
                self.buf.len() - self.pos
            )))
        }
    }
}

impl Message {
    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        let mut w = Writer::new();
        match self {
            Message::Login {
                login,
                password,
                field,
                level,
            } => {
                w.write_u8(TAG_LOGIN);
                w.write_string(login);
                w.write_string(password);
                w.write_u32(*field);
                w.write_u32(*level);
            }
            Message::Direction {
                snake_id,
                direction,
                boost,
                split,
            } => {
                w.write_u8(TAG_DIRECTION);
                w.write_u64(*snake_id);
                w.write_point(*direction);
                w.write_bool(*boost);
                w.write_bool(*split);
            }
            Message::Exit => {
                w.write_u8(TAG_EXIT);
            }
            Message::Welcome { player_id, k10 } => {
                w.write_u8(TAG_WELCOME);
                w.write_u64(*player_id);
                w.write_f32(*k10);
            }
            Message::Error { description } => {
                w.write_u8(TAG_ERROR);
                w.write_string(description);
            }
            Message::Field {
                snake_id,
                w: mass,
                time,
                snakes,
                foods,
                borders,
            } => {
                w.write_u8(TAG_FIELD);
                w.write_u64(*snake_id);
                w.write_f32(*mass);
                w.write_f32(*time);
                w.write_u32(snakes.len() as u32);
                for s in snakes {
                    w.write_snake(s);
                }
                w.write_u32(foods.len() as u32);
                for f in foods {
                    w.write_food(f);
                }
                w.write_bool(borders.is_some());
                if let Some(borders) = borders {
                    w.write_u32(borders.len() as u32);
                    for (a, b) in borders {
                        w.write_point(*a);
                        w.write_point(*b);
                    }
                }
            }
        }
        Ok(w.buf)
    }

    pub fn decode(bytes: &[u8]) -> Result<Message, FrameError> {
        if bytes.len() > MAX_FRAME_SIZE {
            return Err(FrameError::Oversized {
                size: bytes.len(),
                limit: MAX_FRAME_SIZE,
            });
        }
        let mut r = Reader::new(bytes);
        let tag = r.read_u8()?;
        let msg = match tag {
            TAG_LOGIN => Message::Login {
                login: r.read_string()?,
                password: r.read_string()?,
                field: r.read_u32()?,
                level: r.read_u32()?,
            },
            TAG_DIRECTION => Message::Direction {
                snake_id: r.read_u64()?,
                direction: r.read_point()?,
                boost: r.read_bool()?,
                split: r.read_bool()?,
            },
            TAG_EXIT => Message::Exit,
            TAG_WELCOME => Message::Welcome {
                player_id: r.read_u64()?,
                k10: r.read_f32()?,
            },
            TAG_ERROR => Message::Error {
                description: r.read_string()?,
            },
            TAG_FIELD => {
                let snake_id = r.read_u64()?;
                let w = r.read_f32()?;
                let time = r.read_f32()?;
                let n_snakes = r.read_u32()? as usize;
                let mut snakes = Vec::with_capacity(n_snakes);
                for _ in 0..n_snakes {
                    snakes.push(r.read_snake()?);
                }
                let n_foods = r.read_u32()? as usize;
                let mut foods = Vec::with_capacity(n_foods);
                for _ in 0..n_foods {
                    foods.push(r.read_food()?);
                }
                let has_borders = r.read_bool()?;
                let borders = if has_borders {
                    let n = r.read_u32()? as usize;
                    let mut v = Vec::with_capacity(n);
                    for _ in 0..n {
                        v.push((r.read_point()?, r.read_point()?));
                    }
                    Some(v)
                } else {
                    None
                };
                Message::Field {
                    snake_id,
                    w,
                    time,
                    snakes,
                    foods,
                    borders,
                }
            }
            other => return Err(FrameError::Malformed(format!("unknown message tag {other}"))),
        };
        r.finish()?;
        Ok(msg)
    }

    pub fn error(description: impl Into<String>) -> Message {
        Message::Error {
            description: description.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_round_trips() {
        let msg = Message::Login {
            login: "alice".into(),
            password: "pw".into(),
            field: 0,
            level: 1,
        };
        let bytes = msg.encode().unwrap();
        let decoded = Message::decode(&bytes).unwrap();
        match decoded {
            Message::Login {
                login,
                password,
                field,
                level,
            } => {
                assert_eq!(login, "alice");
                assert_eq!(password, "pw");
                assert_eq!(field, 0);
                assert_eq!(level, 1);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn login_uses_the_documented_little_endian_tagged_layout() {
        // tag(1) + len(4) + "alice"(5) + len(4) + "pw"(2) + field(4) + level(4)
        let msg = Message::Login {
            login: "alice".into(),
            password: "pw".into(),
            field: 7,
            level: 3,
        };
        let bytes = msg.encode().unwrap();
        assert_eq!(bytes[0], TAG_LOGIN);
        assert_eq!(&bytes[1..5], &5u32.to_le_bytes());
        assert_eq!(&bytes[5..10], b"alice");
        assert_eq!(&bytes[10..14], &2u32.to_le_bytes());
        assert_eq!(&bytes[14..16], b"pw");
        assert_eq!(&bytes[16..20], &7u32.to_le_bytes());
        assert_eq!(&bytes[20..24], &3u32.to_le_bytes());
        assert_eq!(bytes.len(), 24);
    }

    #[test]
    fn field_message_round_trips_with_nested_vectors() {
        let msg = Message::Field {
            snake_id: 7,
            w: 42.0,
            time: 1.5,
            snakes: vec![WireSnake {
                player_id: 1,
                snake_id: 7,
                r: 2.0,
                skeleton: vec![WirePoint { x: 0.0, y: 0.0 }, WirePoint { x: 1.0, y: 0.0 }],
                head_visible: true,
                boost: false,
            }],
            foods: vec![WireFood {
                p: WirePoint { x: 3.0, y: 4.0 },
                w: 5.0,
            }],
            borders: None,
        };
        let bytes = msg.encode().unwrap();
        let decoded = Message::decode(&bytes).unwrap();
        match decoded {
            Message::Field { snake_id, snakes, foods, borders, .. } => {
                assert_eq!(snake_id, 7);
                assert_eq!(snakes.len(), 1);
                assert_eq!(snakes[0].skeleton.len(), 2);
                assert_eq!(foods.len(), 1);
                assert_eq!(borders, None);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn field_message_round_trips_with_borders() {
        let msg = Message::Field {
            snake_id: 0,
            w: 1.0,
            time: 0.0,
            snakes: Vec::new(),
            foods: Vec::new(),
            borders: Some(vec![(WirePoint { x: 0.0, y: 0.0 }, WirePoint { x: 1.0, y: 1.0 })]),
        };
        let bytes = msg.encode().unwrap();
        match Message::decode(&bytes).unwrap() {
            Message::Field { borders: Some(b), .. } => assert_eq!(b.len(), 1),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let huge = vec![0u8; MAX_FRAME_SIZE + 1];
        let err = Message::decode(&huge).unwrap_err();
        assert!(matches!(err, FrameError::Oversized { .. }));
    }

    #[test]
    fn exit_is_a_single_tag_byte() {
        let bytes = Message::Exit.encode().unwrap();
        assert_eq!(bytes, vec![TAG_EXIT]);
        assert!(matches!(Message::decode(&bytes).unwrap(), Message::Exit));
    }

    #[test]
    fn truncated_body_is_malformed_not_a_panic() {
        let bytes = Message::Welcome { player_id: 1, k10: 1000.0 }.encode().unwrap();
        let err = Message::decode(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, FrameError::Malformed(_)));
    }

    #[test]
    fn unknown_tag_is_malformed() {
        let err = Message::decode(&[0xFF]).unwrap_err();
        assert!(matches!(err, FrameError::Malformed(_)));
    }

    #[test]
    fn trailing_bytes_after_a_full_message_are_malformed() {
        let mut bytes = Message::Exit.encode().unwrap();
        bytes.push(0xAA);
        let err = Message::decode(&bytes).unwrap_err();
        assert!(matches!(err, FrameError::Malformed(_)));
    }
}

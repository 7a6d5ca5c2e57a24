//! Per-viewer visibility filter (spec §4.G): executed once per pacing-timer
//! fire, it builds one `Field` wire message per snake the connection's
//! player owns, keeping only the skeleton points and foods within
//! `cfg.visibility_radius_mult * S.r` of `S`'s head.

use snake::{Field, GameConfig, Message, WireFood, WirePoint, WireSnake};

pub fn build_field_messages(field: &Field, player_id: u64, cfg: &GameConfig) -> Vec<Message> {
    field
        .live_snakes()
        .filter(|s| s.player_ref == player_id)
        .map(|viewer| {
            let vis_r = cfg.visibility_radius_mult * viewer.r;
            let vis_r2 = vis_r * vis_r;
            let head = viewer.head();

            let snakes: Vec<WireSnake> = field
                .live_snakes()
                .filter_map(|s| {
                    let skeleton: Vec<WirePoint> = s
                        .skeleton
                        .iter()
                        .filter(|p| (**p - head).length_squared() <= vis_r2)
                        .map(|p| (*p).into())
                        .collect();
                    if skeleton.is_empty() {
                        return None;
                    }
                    Some(WireSnake {
                        player_id: s.player_ref,
                        snake_id: s.id,
                        r: s.r,
                        skeleton,
                        head_visible: (s.head() - head).length_squared() <= vis_r2,
                        boost: s.boost,
                    })
                })
                .collect();

            let foods: Vec<WireFood> = field
                .foods
                .iter()
                .filter(|f| (f.p - head).length_squared() <= vis_r2)
                .map(|f| WireFood {
                    p: f.p.into(),
                    w: f.w,
                })
                .collect();

            Message::Field {
                snake_id: viewer.id,
                w: viewer.w,
                time: field.time,
                snakes,
                foods,
                borders: None,
            }
        })
        .collect()
}

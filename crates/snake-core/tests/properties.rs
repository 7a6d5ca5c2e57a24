//! Integration tests for the tick transform's cross-cutting invariants
//! (spec §8) plus the three worked scenarios, run against a seeded `Game`
//! so food placement and spawn angles are reproducible.

use snake::{Direction, GameConfig, Message, Point};
use std::f32::consts::PI;

fn config() -> GameConfig {
    GameConfig::default()
}

/// Property 1: monotonicity of tick and time.
#[test]
fn tick_and_time_advance_by_exactly_one_step() {
    let g = snake::Game::with_seed(0, config(), 1);
    g.get_player("alice", 10);
    let mut field = g.tick();
    for _ in 0..20 {
        let old = field;
        field = g.tick();
        assert_eq!(field.tick, old.tick + 1);
        assert!((field.time - (old.time + g.cfg().tick_seconds())).abs() < 1e-6);
    }
}

/// Property 2: skeleton integrity — adjacent points never sit farther apart
/// than the snake's own radius, and the skeleton length matches the formula.
#[test]
fn skeleton_segments_stay_within_radius_and_length_matches_formula() {
    let g = snake::Game::with_seed(0, config(), 2);
    g.get_player("alice", 10);
    for _ in 0..30 {
        let field = g.tick();
        for s in field.live_snakes() {
            let expected_len = g.cfg().skeleton_len_for(s.w, s.r);
            assert_eq!(s.skeleton.len(), expected_len);
            for i in 1..s.skeleton.len() {
                let d = (s.skeleton[i] - s.skeleton[i - 1]).length();
                assert!(d <= s.r + 1e-3, "segment {i} length {d} exceeds radius {}", s.r);
            }
        }
    }
}

/// Property 3: radius law.
#[test]
fn radius_matches_log_formula_for_every_live_snake() {
    let g = snake::Game::with_seed(0, config(), 3);
    g.get_player("alice", 10);
    let field = g.tick();
    for s in field.live_snakes() {
        let expected = g.cfg().radius_for_mass(s.w);
        assert!((s.r - expected).abs() < 1e-4);
    }
}

/// Property 4: turning bound — a snake can never turn more than
/// `max_direction_angle` per tick even when the requested target is
/// directly behind it.
#[test]
fn heading_change_never_exceeds_the_configured_turn_limit() {
    let g = snake::Game::with_seed(0, config(), 4);
    g.get_player("alice", 10);
    let field = g.tick();
    let snake_id = field.live_snakes().next().unwrap().id;
    let before = g.tick();
    let heading_before = before.live_snakes().next().unwrap().heading();

    g.set_direction(
        "alice",
        snake_id,
        Direction {
            p: before.live_snakes().next().unwrap().head() - heading_before,
            boost: false,
            split: false,
        },
    );
    let after = g.tick();
    let heading_after = after.live_snakes().next().unwrap().heading();
    let angle = heading_before.angle_to(heading_after).abs();
    assert!(angle <= g.cfg().max_direction_angle + 1e-3, "turned {angle} rad in one tick");
}

/// Property 5: food conservation under no eating — spawns only add 5-unit
/// foods until the target count is reached, never past it.
#[test]
fn food_count_never_exceeds_target_once_reached() {
    let g = snake::Game::with_seed(0, config(), 5);
    g.get_player("alice", 10);
    for _ in 0..10 {
        let field = g.tick();
        assert!(field.foods.len() <= g.cfg().target_food_count);
    }
}

/// Property 6: split conserves total mass and adds one snake.
#[test]
fn split_conserves_mass_and_adds_a_snake() {
    let cfg = GameConfig {
        default_w: 2500.0,
        ..GameConfig::default()
    };
    let g = snake::Game::with_seed(0, cfg, 6);
    g.get_player("alice", 10);
    let field = g.tick();
    assert_eq!(field.live_snakes().count(), 1);
    let snake_id = field.live_snakes().next().unwrap().id;

    g.set_direction(
        "alice",
        snake_id,
        Direction {
            p: Point::new(1.0, 0.0),
            boost: false,
            split: true,
        },
    );
    let before_total: f32 = field.live_snakes().map(|s| s.w).sum();
    let after = g.tick();
    assert_eq!(after.live_snakes().count(), 2);
    let after_total: f32 = after.live_snakes().map(|s| s.w).sum();
    assert!((after_total - before_total).abs() < 1e-2);
}

/// Property 7 (as implemented; see DESIGN.md's connection-cap entry): the
/// check is `connections > max_connections_per_player` evaluated before the
/// increment, matching the original server and spec §4.G's literal prose.
/// With a cap of 5 that lets a sixth connection through and rejects only
/// the seventh, with the count staying at 6.
#[test]
fn seventh_login_for_the_same_player_is_rejected() {
    let g = snake::Game::with_seed(0, config(), 7);
    g.get_player("alice", 1);
    for i in 1..=(g.cfg().max_connections_per_player + 1) {
        assert_eq!(g.connect_player("alice"), Ok(i));
    }
    assert_eq!(
        g.connect_player("alice"),
        Err(g.cfg().max_connections_per_player + 1)
    );
}

/// Property 9: every wire message type round-trips through encode/decode.
#[test]
fn every_message_variant_round_trips() {
    let messages = vec![
        Message::Login {
            login: "alice".into(),
            password: "pw".into(),
            field: 0,
            level: 1,
        },
        Message::Direction {
            snake_id: 3,
            direction: Point::new(1.0, 0.0).into(),
            boost: true,
            split: false,
        },
        Message::Exit,
        Message::Welcome { player_id: 0, k10: 1000.0 },
        Message::error("bad stuff"),
        Message::Field {
            snake_id: 0,
            w: 20.0,
            time: 1.5,
            snakes: Vec::new(),
            foods: Vec::new(),
            borders: None,
        },
    ];
    for msg in messages {
        let bytes = msg.encode().expect("encode should succeed");
        Message::decode(&bytes).expect("decode should succeed");
    }
}

/// Scenario A — login, spawn, first Field (spec §8).
#[test]
fn scenario_a_login_spawn_and_first_field() {
    let g = snake::Game::with_seed(0, config(), 100);
    let player_id = g.get_player("alice", 1);
    assert_eq!(player_id, 0);
    assert_eq!(g.connect_player("alice"), Ok(1));

    // Level 1 alone does not start the game (spec §9 lobby redesign); bring
    // the field to "started" the way the scenario specifies.
    g.get_player("alice", 1);
    let _ = g.get_player("starter", 10);

    let field = g.tick();
    let snakes: Vec<_> = field.live_snakes().filter(|s| s.player_ref == player_id).collect();
    assert_eq!(snakes.len(), 1);
    let snake = snakes[0];
    assert_eq!(snake.w, g.cfg().default_w);
    let expected_len = ((0.5 * 20.0) / (snake.r * snake.r)).round().max(2.0) as usize;
    assert_eq!(snake.skeleton.len(), expected_len);
}

/// Scenario C — head-on kill: the slower snake dies and its mass reappears
/// as food at its previous skeleton positions.
#[test]
fn scenario_c_head_on_kill_turns_the_loser_into_food() {
    let cfg = GameConfig {
        target_food_count: 0,
        ..GameConfig::default()
    };
    let g = snake::Game::with_seed(0, cfg, 200);
    g.get_player("s", 10);
    g.get_player("t", 10);
    let field = g.tick();

    let s_id = field.live_snakes().find(|s| s.player_ref == 0).unwrap().id;
    let t_id = field.live_snakes().find(|s| s.player_ref == 1).unwrap().id;

    // Point T's direction at S's head so the two overlap next tick, and
    // boost T so it is strictly faster than S.
    let s_head = field.live_snakes().find(|s| s.id == s_id).unwrap().head();
    g.set_direction(
        "t",
        t_id,
        Direction {
            p: s_head,
            boost: true,
            split: false,
        },
    );

    // Run enough ticks to close the distance between independently-spawned
    // snakes, then check S dies once the heads are within collision range.
    let mut s_prev_w = 0.0;
    let mut killed = false;
    for _ in 0..500 {
        let f = g.tick();
        let s = f.snakes.iter().find(|s| s.id == s_id && s.player_ref == 0);
        if let Some(s) = s {
            if !s.is_alive() {
                killed = true;
                assert_eq!(s.w, 0.0);
                let total_food_w: f32 = f.foods.iter().map(|food| food.w).sum();
                assert!(total_food_w > 0.0, "S's mass must reappear as food, total={total_food_w}, prev_w={s_prev_w}");
                break;
            }
            s_prev_w = s.w;
        } else {
            break;
        }
        g.set_direction(
            "t",
            t_id,
            Direction {
                p: f.live_snakes().find(|sn| sn.id == s_id).map(|sn| sn.head()).unwrap_or(s_head),
                boost: true,
                split: false,
            },
        );
    }
    assert!(killed, "expected the slower snake to die within the simulated window");
}

/// A bounded random-walk smoke test: many ticks with varied directions
/// should never panic and should always keep at least the bootstrap
/// invariants (monotonic tick counter, finite positions).
#[test]
fn long_run_with_varied_directions_stays_internally_consistent() {
    let g = snake::Game::with_seed(0, config(), 999);
    g.get_player("alice", 10);
    let mut last_tick = 0;
    for i in 0..200 {
        let field = g.get_current_field();
        for s in field.live_snakes() {
            let angle = (i as f32) * 0.137 % (2.0 * PI);
            g.set_direction(
                "alice",
                s.id,
                Direction {
                    p: s.head() + Point::new(angle.cos(), angle.sin()),
                    boost: i % 5 == 0,
                    split: false,
                },
            );
        }
        let field = g.tick();
        assert_eq!(field.tick, last_tick + 1);
        for s in field.live_snakes() {
            for p in &s.skeleton {
                assert!(p.is_finite());
            }
        }
        last_tick = field.tick;
    }
}

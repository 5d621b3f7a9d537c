use std::time::Duration;

use glam::Vec2;
use lizard_hook_core::{BadgeId, BadgeSpawn, Command, Event, SpriteId};
use lizard_hook_pool::{self as pool, query, BadgePool};

fn spawn(lifetime: f32, fade_in: f32, fade_out: f32) -> BadgeSpawn {
    BadgeSpawn {
        sprite: SpriteId::new(2),
        position: Vec2::new(0.5, 0.5),
        velocity: Vec2::new(0.0, 0.2),
        wobble_phase: 0.0,
        scale: 0.15,
        rotation: 0.05,
        lifetime,
        fade_in,
        fade_out,
    }
}

fn tick(pool: &mut BadgePool, seconds: f32) -> Vec<Event> {
    let mut events = Vec::new();
    pool::apply(
        pool,
        Command::Tick {
            dt: Duration::from_secs_f32(seconds),
        },
        &mut events,
    );
    events
}

#[test]
fn spawn_emits_event_and_starts_transparent() {
    let mut pool = BadgePool::new();
    let mut events = Vec::new();

    pool::apply(
        &mut pool,
        Command::SpawnBadge {
            spawn: spawn(1.0, 0.1, 0.3),
        },
        &mut events,
    );

    assert_eq!(
        events,
        vec![Event::BadgeSpawned {
            badge: BadgeId::new(0),
            sprite: SpriteId::new(2),
        }]
    );
    let snapshot = query::badge(&pool, BadgeId::new(0)).expect("badge is live");
    assert_eq!(snapshot.alpha, 0.0);
    assert_eq!(snapshot.elapsed, 0.0);
    assert_eq!(snapshot.position, Vec2::new(0.5, 0.5));
}

#[test]
fn non_positive_lifetimes_are_ignored() {
    let mut pool = BadgePool::new();
    let mut events = Vec::new();

    pool::apply(
        &mut pool,
        Command::SpawnBadge {
            spawn: spawn(0.0, 0.1, 0.3),
        },
        &mut events,
    );
    pool::apply(
        &mut pool,
        Command::SpawnBadge {
            spawn: spawn(f32::NAN, 0.1, 0.3),
        },
        &mut events,
    );

    assert!(events.is_empty());
    assert_eq!(query::live_count(&pool), 0);
}

#[test]
fn badges_expire_on_the_tick_their_lifetime_elapses() {
    let mut pool = BadgePool::new();
    let mut events = Vec::new();
    pool::apply(
        &mut pool,
        Command::SpawnBadge {
            spawn: spawn(0.5, 0.1, 0.2),
        },
        &mut events,
    );

    let events = tick(&mut pool, 0.25);
    assert_eq!(events.len(), 1);
    assert_eq!(query::live_count(&pool), 1);

    let events = tick(&mut pool, 0.25);
    assert!(events.contains(&Event::BadgeExpired {
        badge: BadgeId::new(0)
    }));
    assert_eq!(query::live_count(&pool), 0);
}

#[test]
fn movement_combines_drift_and_wobble() {
    let mut pool = BadgePool::new();
    let mut events = Vec::new();
    pool::apply(
        &mut pool,
        Command::SpawnBadge {
            spawn: spawn(2.0, 0.1, 0.2),
        },
        &mut events,
    );

    let _ = tick(&mut pool, 0.5);

    let snapshot = query::badge(&pool, BadgeId::new(0)).expect("badge is live");
    // At elapsed 0.5 the wobble angle is pi: offset (0, -0.02).
    let expected = Vec2::new(0.5, 0.5) + Vec2::new(0.0, 0.2 - 0.02) * 0.5;
    assert!(
        (snapshot.position - expected).length() < 1e-5,
        "{:?} != {:?}",
        snapshot.position,
        expected
    );
}

#[test]
fn clear_removes_everything() {
    let mut pool = BadgePool::new();
    let mut events = Vec::new();
    for _ in 0..3 {
        pool::apply(
            &mut pool,
            Command::SpawnBadge {
                spawn: spawn(1.0, 0.1, 0.3),
            },
            &mut events,
        );
    }
    events.clear();

    pool::apply(&mut pool, Command::Clear, &mut events);

    assert_eq!(events, vec![Event::PoolCleared { removed: 3 }]);
    assert!(query::badge_view(&pool).is_empty());
}

#[test]
fn live_badges_respect_lifetime_and_alpha_bounds_every_tick() {
    let mut pool = BadgePool::new();
    let mut events = Vec::new();

    for frame in 0..600_u32 {
        if frame % 3 == 0 {
            let jitter = (frame % 17) as f32 / 17.0;
            pool::apply(
                &mut pool,
                Command::SpawnBadge {
                    spawn: spawn(0.7 + 0.5 * jitter, 0.06 + 0.06 * jitter, 0.2 + 0.4 * jitter),
                },
                &mut events,
            );
        }
        let _ = tick(&mut pool, 1.0 / 60.0);

        for badge in query::badge_view(&pool).iter() {
            assert!(badge.elapsed >= 0.0);
            assert!(badge.elapsed < badge.lifetime, "{badge:?}");
            assert!((0.0..=1.0).contains(&badge.alpha), "{badge:?}");
        }
    }
}

#[test]
fn view_is_ordered_by_spawn() {
    let mut pool = BadgePool::new();
    let mut events = Vec::new();
    for lifetime in [1.0, 0.1, 1.0] {
        pool::apply(
            &mut pool,
            Command::SpawnBadge {
                spawn: spawn(lifetime, 0.0, 0.0),
            },
            &mut events,
        );
    }
    let _ = tick(&mut pool, 0.2);

    let ids: Vec<u64> = query::badge_view(&pool)
        .iter()
        .map(|badge| badge.id.get())
        .collect();
    assert_eq!(ids, vec![0, 2]);
}

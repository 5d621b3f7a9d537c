mod support;

use std::{sync::Arc, thread};

use glam::Vec2;
use lizard_hook_core::{OverlaySettings, SpawnStrategy, SpriteId};
use lizard_hook_engine::EngineOptions;
use lizard_hook_rendering::Viewport;
use support::{options, running, settings, FakePlatform, FRAME, FULL_HD};

#[test]
fn burst_beyond_rate_cap_admits_at_most_the_cap() {
    let capped = OverlaySettings {
        badges_per_second_max: 12,
        ..settings()
    };
    let (mut overlay, _recorder, start) = running(&capped, FakePlatform::default(), options(20));
    let handle = overlay.handle();

    for frame in 0..30_u32 {
        for _ in 0..3 {
            handle.enqueue_spawn(None, 0.5, 0.5);
        }
        assert!(overlay.step(start + FRAME * frame));
    }

    let stats = overlay.stats();
    assert_eq!(stats.admitted, 12);
    assert_eq!(stats.rejected_rate, 78);
}

#[test]
fn capacity_suppression_lifts_only_at_eighty_percent() {
    let capacity = 10;
    let (mut overlay, _recorder, start) = running(
        &settings(),
        FakePlatform::default(),
        EngineOptions {
            pool_capacity: capacity,
            ..options(21)
        },
    );
    let handle = overlay.handle();

    for _ in 0..15 {
        handle.enqueue_spawn(None, 0.5, 0.5);
    }
    assert!(overlay.step(start));
    assert_eq!(overlay.badges().len(), capacity);
    assert_eq!(overlay.stats().rejected_capacity, 5);

    let mut first_readmission = None;
    for frame in 1..200_u32 {
        let live_before = overlay.badges().len();
        let admitted_before = overlay.stats().admitted;
        handle.enqueue_spawn(None, 0.5, 0.5);
        assert!(overlay.step(start + FRAME * frame));
        if overlay.stats().admitted > admitted_before {
            first_readmission = Some(live_before);
            break;
        }
    }

    let live = first_readmission.expect("badges expire and admission resumes");
    assert!(live <= 8, "admission resumed with {live} live badges");
}

#[test]
fn concurrent_enqueues_yield_at_most_two_badges_in_one_tick() {
    let (mut overlay, _recorder, start) = running(&settings(), FakePlatform::default(), options(22));
    let handle = Arc::new(overlay.handle());

    let producers: Vec<_> = (0..2)
        .map(|index| {
            let handle = Arc::clone(&handle);
            thread::spawn(move || handle.enqueue_spawn(None, 0.25 * index as f32, 0.5))
        })
        .collect();
    for producer in producers {
        producer.join().expect("producer thread finishes");
    }

    assert!(overlay.step(start));

    assert!(overlay.badges().len() <= 2);
    assert_eq!(overlay.badges().len(), 2);
}

#[test]
fn near_caret_without_caret_lands_inside_foreground_inset() {
    let near_caret = OverlaySettings {
        badge_spawn_strategy: SpawnStrategy::NearCaret,
        ..settings()
    };
    let platform = FakePlatform {
        caret: None,
        foreground: Some(FULL_HD),
        ..FakePlatform::default()
    };
    let (mut overlay, _recorder, start) = running(&near_caret, platform, options(23));
    let handle = overlay.handle();

    for _ in 0..50 {
        handle.enqueue_spawn(None, 0.0, 0.0);
    }
    assert!(overlay.step(start));

    let low = Vec2::new(23.99 / 1920.0, 23.99 / 1080.0);
    let high = Vec2::new(1896.01 / 1920.0, 1056.01 / 1080.0);
    assert_eq!(overlay.badges().len(), 50);
    for badge in overlay.badges().iter() {
        let position = badge.position;
        assert!(position.cmpge(low).all() && position.cmple(high).all(), "{position:?}");
    }
}

#[test]
fn near_caret_uses_the_caret_when_known() {
    let near_caret = OverlaySettings {
        badge_spawn_strategy: SpawnStrategy::NearCaret,
        ..settings()
    };
    let platform = FakePlatform {
        caret: Some(Vec2::new(480.0, 540.0)),
        ..FakePlatform::default()
    };
    let (mut overlay, _recorder, start) = running(&near_caret, platform, options(24));

    overlay.handle().enqueue_spawn(None, 0.9, 0.9);
    assert!(overlay.step(start));

    let badge = overlay.badges().into_vec()[0];
    assert_eq!(badge.position, Vec2::new(0.25, 0.5));
}

#[test]
fn badge_scale_tracks_viewport_height() {
    let platform = FakePlatform {
        viewport: Viewport::new(1600, 1000),
        monitors: None,
        ..FakePlatform::default()
    };
    let (mut overlay, _recorder, start) = running(&settings(), platform, options(25));
    let handle = overlay.handle();

    for _ in 0..100 {
        handle.enqueue_spawn(None, 0.5, 0.5);
    }
    assert!(overlay.step(start));

    assert_eq!(overlay.badges().len(), 100);
    for badge in overlay.badges().iter() {
        assert!((0.12..=0.216).contains(&badge.scale), "scale {}", badge.scale);
        assert!((0.0..=1.0).contains(&badge.position.x));
        assert!((0.0..=1.0).contains(&badge.position.y));
    }
}

#[test]
fn explicit_sprite_requests_are_honoured_when_valid() {
    let (mut overlay, _recorder, start) = running(&settings(), FakePlatform::default(), options(26));
    let handle = overlay.handle();

    handle.enqueue_spawn(Some(SpriteId::new(1)), 0.5, 0.5);
    handle.enqueue_spawn(Some(SpriteId::new(99)), 0.5, 0.5);
    assert!(overlay.step(start));

    let sprites: Vec<_> = overlay.badges().iter().map(|badge| badge.sprite).collect();
    assert_eq!(sprites[0], SpriteId::new(1));
    // The default name list selects the lizard when the request is out of range.
    assert_eq!(sprites[1], SpriteId::new(0));
}

#[test]
fn live_badges_hold_their_invariants_every_tick() {
    let (mut overlay, _recorder, start) = running(&settings(), FakePlatform::default(), options(27));
    let handle = overlay.handle();

    for frame in 0..400_u32 {
        if frame % 2 == 0 {
            handle.enqueue_spawn(None, 0.5, 0.5);
        }
        assert!(overlay.step(start + FRAME * frame));
        for badge in overlay.badges().iter() {
            assert!(badge.elapsed >= 0.0 && badge.elapsed < badge.lifetime, "{badge:?}");
            assert!((0.0..=1.0).contains(&badge.alpha), "{badge:?}");
        }
    }
    assert!(overlay.stats().admitted > 0);
    assert!(overlay.badges().len() < 150);
}

#[test]
fn identical_seeds_replay_identically() {
    let replay = || {
        let (mut overlay, _recorder, start) =
            running(&settings(), FakePlatform::default(), options(0xfeed));
        let handle = overlay.handle();
        for frame in 0..90_u32 {
            if frame % 5 == 0 {
                handle.enqueue_spawn(None, 0.5, 0.5);
            }
            assert!(overlay.step(start + FRAME * frame));
        }
        overlay
            .badges()
            .into_vec()
            .into_iter()
            .map(|badge| (badge.id, badge.sprite, badge.position.to_array(), badge.scale.to_bits()))
            .collect::<Vec<_>>()
    };

    let first = replay();
    assert!(!first.is_empty());
    assert_eq!(first, replay());
}

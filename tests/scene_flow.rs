//! Integration tests for the scene lifecycle
//!
//! Drives the full non-rendering path: placement → round request →
//! generated lines folded back in → clicks → escalation → dissolve → reset.

use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

use sonder::config::AppConfig;
use sonder::scene::{Hit, Scene, SceneMode, SpeechPhase};
use sonder::{RoundKind, SceneEvent};

fn harness() -> (Scene, StdRng) {
    (
        Scene::new(&AppConfig::default(), 1280.0, 800.0),
        StdRng::seed_from_u64(7),
    )
}

/// Feed a canned successful outcome back for a pending round.
fn complete_round(scene: &mut Scene, rng: &mut StdRng, round_id: u64, now: Instant) {
    scene.apply_event(
        SceneEvent::RoundReady {
            round_id,
            first_line: "Did you see the sky this morning?".to_string(),
            second_line: "I did, it looked unreal.".to_string(),
        },
        now,
        rng,
    );
}

#[test]
fn full_round_trip_spawns_a_conversing_pair() {
    let (mut scene, mut rng) = harness();
    let now = Instant::now();

    let request = scene.begin_new_pair(&mut rng).expect("scene accepts requests");
    assert_eq!(request.kind, RoundKind::Casual);
    assert_ne!(request.first_speaker, request.second_speaker);
    assert!(scene.circles().is_empty(), "nothing spawns until lines arrive");

    complete_round(&mut scene, &mut rng, request.round_id, now);
    assert_eq!(scene.circles().len(), 2);

    let speaking = scene
        .circles()
        .iter()
        .filter(|c| c.phase != SpeechPhase::Idle)
        .count();
    assert_eq!(speaking, 1, "exactly one side speaks at a time");

    // The quote fades in over subsequent frames.
    let mut later = now;
    for _ in 0..120 {
        later += Duration::from_millis(16);
        scene.tick(later, 0.016, &mut rng);
    }
    let speaker = scene
        .circles()
        .iter()
        .find(|c| c.phase != SpeechPhase::Idle)
        .expect("someone is always speaking after a round");
    assert!(speaker.opacity >= 1.0);
}

#[test]
fn clicks_route_to_removal_and_continuation() {
    let (mut scene, mut rng) = harness();
    let now = Instant::now();
    let request = scene.begin_new_pair(&mut rng).unwrap();
    complete_round(&mut scene, &mut rng, request.round_id, now);

    let (a_id, a_x, a_y) = {
        let c = &scene.circles()[0];
        (c.id, c.x, c.y)
    };
    let b_id = scene.circles()[1].id;

    // A click on the body is a removal.
    assert_eq!(scene.hit_test(a_x, a_y), Some(Hit::Body(a_id)));
    scene.remove_circle(a_id);
    assert_eq!(scene.circles().len(), 1);

    // With the partner gone there is no conversation to continue.
    assert!(scene.begin_continuation(b_id).is_none());
}

#[test]
fn repeated_continuations_turn_existential_then_dissolve() {
    let (mut scene, mut rng) = harness();
    let config = AppConfig::default();
    let mut now = Instant::now();

    let request = scene.begin_new_pair(&mut rng).unwrap();
    complete_round(&mut scene, &mut rng, request.round_id, now);
    let clicked = scene.circles()[0].id;

    let mut kinds = Vec::new();
    for _ in 1..config.existential.dissolve_after {
        now += Duration::from_secs(5);
        let request = scene.begin_continuation(clicked).unwrap();
        kinds.push(request.kind);
        complete_round(&mut scene, &mut rng, request.round_id, now);
    }
    assert_eq!(*kinds.first().unwrap(), RoundKind::Casual);
    assert_eq!(*kinds.last().unwrap(), RoundKind::Existential);
    assert!(scene.circles().iter().all(|c| c.existential));

    // Past the dwell the scene rains, fades, and resets itself.
    now += Duration::from_secs_f32(config.existential.dissolve_dwell_secs + 1.0);
    scene.tick(now, 0.016, &mut rng);
    assert_eq!(scene.mode(), SceneMode::Dissolving);
    assert!(!scene.rain().is_empty());
    assert!(scene.begin_new_pair(&mut rng).is_none(), "dissolving scene takes no requests");

    for _ in 0..600 {
        now += Duration::from_millis(33);
        scene.tick(now, 0.033, &mut rng);
    }
    assert_eq!(scene.mode(), SceneMode::Active);
    assert_eq!(scene.circles().len(), 0);

    // And the canvas is usable again.
    let request = scene.begin_new_pair(&mut rng).unwrap();
    complete_round(&mut scene, &mut rng, request.round_id, now);
    assert_eq!(scene.circles().len(), 2);
}

#[test]
fn failed_rounds_leave_the_scene_clean() {
    let (mut scene, mut rng) = harness();
    let request = scene.begin_new_pair(&mut rng).unwrap();
    scene.apply_event(
        SceneEvent::RoundFailed {
            round_id: request.round_id,
            message: "Failed to generate conversation".to_string(),
        },
        Instant::now(),
        &mut rng,
    );
    assert_eq!(scene.circles().len(), 0);
    assert_eq!(
        scene.last_error.as_deref(),
        Some("Failed to generate conversation")
    );

    // A stale outcome for a cancelled round changes nothing.
    let request = scene.begin_new_pair(&mut rng).unwrap();
    scene.cancel_round(request.round_id);
    complete_round(&mut scene, &mut rng, request.round_id, Instant::now());
    assert_eq!(scene.circles().len(), 0);
}

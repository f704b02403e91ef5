use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::config::AppConfig;
use crate::dialogue::RoundKind;
use crate::engine::{RoundRequest, SceneEvent};
use crate::names;
use crate::placement::{self, Bounds, PlacementConfig, Point};
use crate::ui::text_layout;

/// Outline colors circles are born with.
pub const PALETTE: [[f32; 3]; 4] = [
    [0.231, 0.510, 0.965], // #3B82F6
    [0.063, 0.725, 0.506], // #10B981
    [0.545, 0.361, 0.965], // #8B5CF6
    [0.961, 0.620, 0.043], // #F59E0B
];

/// Tint circles drift toward once their exchange turns existential.
pub const EXISTENTIAL_TINT: [f32; 3] = [0.612, 0.639, 0.686]; // #9CA3AF

/// Rain particle color for the dissolve sequence.
pub const RAIN_COLOR: [f32; 3] = [0.55, 0.62, 0.78];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CircleId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairId(pub u64);

/// Explicit speech state, advanced by `Scene::tick` instead of ambient
/// timers: a new quote fades in, then holds until the speaker switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechPhase {
    Idle,
    FadingIn,
    Speaking,
}

/// A conversational circle. Created in pairs; destroyed when clicked or when
/// the session resets.
#[derive(Debug, Clone)]
pub struct Circle {
    pub id: CircleId,
    pub pair: PairId,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub quote: String,
    pub speaker: String,
    pub color: [f32; 3],
    pub phase: SpeechPhase,
    /// Fade-in ramp for the quote panel
    pub opacity: f32,
    /// Whole-entity alpha, decays during the dissolve
    pub alpha: f32,
    pub existential: bool,
}

/// Decorative particle for the closing dissolve sequence.
#[derive(Debug, Clone)]
pub struct RainCircle {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub fall_speed: f32,
    pub opacity: f32,
    pub color: [f32; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneMode {
    Active,
    Dissolving,
}

/// One-shot deferred speaker swap. A switch whose circles were removed in the
/// meantime is a harmless no-op.
#[derive(Debug, Clone)]
struct SpeakerSwitch {
    due: Instant,
    speak: CircleId,
    listen: CircleId,
}

/// Stored pairing relation; partner lookup is a map lookup, never a
/// proximity heuristic.
#[derive(Debug, Clone)]
struct PairState {
    a: CircleId,
    b: CircleId,
    rounds: u32,
}

/// Context stashed while a round is in flight, keyed by round id.
#[derive(Debug, Clone)]
enum PendingRound {
    NewPair {
        first: Point,
        second: Point,
        speaker: String,
        companion: String,
    },
    Continue {
        pair: PairId,
        speak: CircleId,
        listen: CircleId,
    },
}

/// What a click landed on, in priority order: circle body, then text label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Body(CircleId),
    Label(CircleId),
}

pub struct Scene {
    circles: Vec<Circle>,
    rain: Vec<RainCircle>,
    pairs: HashMap<PairId, PairState>,
    switches: Vec<SpeakerSwitch>,
    pending: HashMap<u64, PendingRound>,
    mode: SceneMode,
    dissolve_at: Option<Instant>,
    /// Pan offset accumulated from background drags
    pub pan: (f32, f32),
    pub last_error: Option<String>,
    view: Bounds,
    placement: PlacementConfig,
    circle_radius: f32,
    speaker_switch: Duration,
    fade_in_rate: f32,
    existential_after: u32,
    dissolve_after: u32,
    dissolve_dwell: Duration,
    rain_count: u32,
    rain_fade: f32,
    rain_min_opacity: f32,
    circle_fade: f32,
    next_circle: u64,
    next_pair: u64,
    next_round: u64,
}

impl Scene {
    pub fn new(config: &AppConfig, view_width: f32, view_height: f32) -> Self {
        Self {
            circles: Vec::new(),
            rain: Vec::new(),
            pairs: HashMap::new(),
            switches: Vec::new(),
            pending: HashMap::new(),
            mode: SceneMode::Active,
            dissolve_at: None,
            pan: (0.0, 0.0),
            last_error: None,
            view: Bounds {
                width: view_width,
                height: view_height,
            },
            placement: PlacementConfig::from_canvas(&config.canvas),
            circle_radius: config.canvas.circle_radius,
            speaker_switch: Duration::from_secs_f32(config.timing.speaker_switch_secs),
            fade_in_rate: config.timing.fade_in_rate,
            existential_after: config.existential.existential_after,
            dissolve_after: config.existential.dissolve_after,
            dissolve_dwell: Duration::from_secs_f32(config.existential.dissolve_dwell_secs),
            rain_count: config.existential.rain_count,
            rain_fade: config.existential.rain_fade,
            rain_min_opacity: config.existential.rain_min_opacity,
            circle_fade: config.existential.circle_fade,
            next_circle: 0,
            next_pair: 0,
            next_round: 0,
        }
    }

    pub fn circles(&self) -> &[Circle] {
        &self.circles
    }

    pub fn rain(&self) -> &[RainCircle] {
        &self.rain
    }

    pub fn mode(&self) -> SceneMode {
        self.mode
    }

    pub fn set_view(&mut self, width: f32, height: f32) {
        self.view = Bounds { width, height };
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.pan.0 += dx;
        self.pan.1 += dy;
    }

    fn circle(&self, id: CircleId) -> Option<&Circle> {
        self.circles.iter().find(|c| c.id == id)
    }

    fn circle_mut(&mut self, id: CircleId) -> Option<&mut Circle> {
        self.circles.iter_mut().find(|c| c.id == id)
    }

    /// Begin a round for a brand-new pair: pick names, place both circles,
    /// and return the request to hand to the dialogue engine. Placement is
    /// committed only when the round comes back successful.
    pub fn begin_new_pair(&mut self, rng: &mut impl Rng) -> Option<RoundRequest> {
        if self.mode != SceneMode::Active {
            return None;
        }
        self.last_error = None;

        let existing: Vec<Point> = self
            .circles
            .iter()
            .map(|c| Point { x: c.x, y: c.y })
            .collect();
        let first = placement::place_first(rng, self.view, &existing, &self.placement);
        let mut with_first = existing;
        with_first.push(first);
        let second = placement::place_partner(first, &with_first, &self.placement);

        let speaker = names::random_speaker(rng).to_string();
        let companion = names::random_companion(rng, &speaker).to_string();

        let round_id = self.next_round;
        self.next_round += 1;
        self.pending.insert(
            round_id,
            PendingRound::NewPair {
                first,
                second,
                speaker: speaker.clone(),
                companion: companion.clone(),
            },
        );
        Some(RoundRequest {
            round_id,
            kind: RoundKind::Casual,
            first_speaker: speaker,
            second_speaker: companion,
        })
    }

    /// Begin a continuation round for the clicked circle and its stored
    /// partner. Returns None when the partner is gone or the scene is
    /// dissolving.
    pub fn begin_continuation(&mut self, clicked: CircleId) -> Option<RoundRequest> {
        if self.mode != SceneMode::Active {
            return None;
        }
        let circle = self.circle(clicked)?;
        let pair_id = circle.pair;
        let state = self.pairs.get(&pair_id)?;
        let partner_id = if state.a == clicked { state.b } else { state.a };
        let partner = self.circle(partner_id)?;

        let kind = if state.rounds >= self.existential_after {
            RoundKind::Existential
        } else {
            RoundKind::Casual
        };
        let first_speaker = circle.speaker.clone();
        let second_speaker = partner.speaker.clone();
        self.last_error = None;

        let round_id = self.next_round;
        self.next_round += 1;
        self.pending.insert(
            round_id,
            PendingRound::Continue {
                pair: pair_id,
                speak: clicked,
                listen: partner_id,
            },
        );
        Some(RoundRequest {
            round_id,
            kind,
            first_speaker,
            second_speaker,
        })
    }

    /// Drop the stashed context for a round that never made it onto the
    /// request channel.
    pub fn cancel_round(&mut self, round_id: u64) {
        self.pending.remove(&round_id);
    }

    /// Fold a finished round back into the scene.
    pub fn apply_event(&mut self, event: SceneEvent, now: Instant, rng: &mut impl Rng) {
        match event {
            SceneEvent::RoundReady {
                round_id,
                first_line,
                second_line,
            } => match self.pending.remove(&round_id) {
                Some(PendingRound::NewPair {
                    first,
                    second,
                    speaker,
                    companion,
                }) => self.spawn_pair(first, second, speaker, companion, first_line, second_line, now, rng),
                Some(PendingRound::Continue { pair, speak, listen }) => {
                    self.continue_pair(pair, speak, listen, first_line, second_line, now)
                }
                // Stale outcome, e.g. the scene was reset mid-flight.
                None => {}
            },
            SceneEvent::RoundFailed { round_id, message } => {
                self.pending.remove(&round_id);
                self.last_error = Some(message);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn spawn_pair(
        &mut self,
        first: Point,
        second: Point,
        speaker: String,
        companion: String,
        first_line: String,
        second_line: String,
        now: Instant,
        rng: &mut impl Rng,
    ) {
        let pair = PairId(self.next_pair);
        self.next_pair += 1;
        let a = self.push_circle(pair, first, speaker, first_line, SpeechPhase::FadingIn, rng);
        let b = self.push_circle(pair, second, companion, second_line, SpeechPhase::Idle, rng);
        self.pairs.insert(pair, PairState { a, b, rounds: 1 });
        self.switches.push(SpeakerSwitch {
            due: now + self.speaker_switch,
            speak: b,
            listen: a,
        });
    }

    fn push_circle(
        &mut self,
        pair: PairId,
        at: Point,
        speaker: String,
        quote: String,
        phase: SpeechPhase,
        rng: &mut impl Rng,
    ) -> CircleId {
        let id = CircleId(self.next_circle);
        self.next_circle += 1;
        self.circles.push(Circle {
            id,
            pair,
            x: at.x,
            y: at.y,
            radius: self.circle_radius,
            quote,
            speaker,
            color: PALETTE[rng.random_range(0..PALETTE.len())],
            phase,
            opacity: 0.0,
            alpha: 1.0,
            existential: false,
        });
        id
    }

    fn continue_pair(
        &mut self,
        pair: PairId,
        speak: CircleId,
        listen: CircleId,
        first_line: String,
        second_line: String,
        now: Instant,
    ) {
        // Either side may have been removed while the round was in flight.
        if self.circle(speak).is_none() || self.circle(listen).is_none() {
            return;
        }
        {
            let c = self.circle_mut(speak).unwrap();
            c.quote = first_line;
            c.phase = SpeechPhase::FadingIn;
            c.opacity = 0.0;
        }
        {
            let c = self.circle_mut(listen).unwrap();
            c.quote = second_line;
            c.phase = SpeechPhase::Idle;
            c.opacity = 0.0;
        }
        self.switches.push(SpeakerSwitch {
            due: now + self.speaker_switch,
            speak: listen,
            listen: speak,
        });

        let (rounds, existential) = match self.pairs.get_mut(&pair) {
            Some(state) => {
                state.rounds += 1;
                (state.rounds, state.rounds > self.existential_after)
            }
            None => return,
        };
        if existential {
            self.escalate_pair(speak, listen);
        }
        if rounds >= self.dissolve_after && self.dissolve_at.is_none() {
            self.dissolve_at = Some(now + self.dissolve_dwell);
        }
    }

    fn escalate_pair(&mut self, a: CircleId, b: CircleId) {
        for id in [a, b] {
            if let Some(c) = self.circle_mut(id) {
                if !c.existential {
                    c.existential = true;
                    for (channel, tint) in c.color.iter_mut().zip(EXISTENTIAL_TINT) {
                        *channel = *channel * 0.35 + tint * 0.65;
                    }
                }
            }
        }
    }

    /// Remove a circle by id. Removing twice is a no-op; the partner is
    /// never touched.
    pub fn remove_circle(&mut self, id: CircleId) {
        self.circles.retain(|c| c.id != id);
    }

    /// Wipe the session back to an empty, interactive scene.
    pub fn reset(&mut self) {
        self.circles.clear();
        self.rain.clear();
        self.pairs.clear();
        self.switches.clear();
        self.pending.clear();
        self.mode = SceneMode::Active;
        self.dissolve_at = None;
        self.pan = (0.0, 0.0);
        self.last_error = None;
    }

    /// Hit-test a click in screen coordinates, body before label, in circle
    /// insertion order.
    pub fn hit_test(&self, sx: f32, sy: f32) -> Option<Hit> {
        let x = sx - self.pan.0;
        let y = sy - self.pan.1;
        for circle in &self.circles {
            let dx = x - circle.x;
            let dy = y - circle.y;
            if (dx * dx + dy * dy).sqrt() <= circle.radius {
                return Some(Hit::Body(circle.id));
            }
            let panel = match circle.phase {
                SpeechPhase::Idle => {
                    text_layout::label_panel(circle.x, circle.y, circle.radius, &circle.speaker)
                }
                _ => {
                    let lines = text_layout::quote_lines(&circle.speaker, &circle.quote);
                    text_layout::quote_panel(circle.x, circle.y, circle.radius, lines.len())
                }
            };
            if panel.contains(x, y) {
                return Some(Hit::Label(circle.id));
            }
        }
        None
    }

    /// Advance all timed state: fade-in ramps, due speaker switches, the
    /// scheduled dissolve, and rain decay.
    pub fn tick(&mut self, now: Instant, dt: f32, rng: &mut impl Rng) {
        for circle in &mut self.circles {
            if circle.phase == SpeechPhase::FadingIn {
                circle.opacity = (circle.opacity + self.fade_in_rate * dt).min(1.0);
                if circle.opacity >= 1.0 {
                    circle.phase = SpeechPhase::Speaking;
                }
            }
        }

        let due: Vec<SpeakerSwitch> = {
            let mut due = Vec::new();
            self.switches.retain(|s| {
                if s.due <= now {
                    due.push(s.clone());
                    false
                } else {
                    true
                }
            });
            due
        };
        for switch in due {
            // Filtered by id: a removed circle's pending switch does nothing.
            if let Some(c) = self.circle_mut(switch.listen) {
                c.phase = SpeechPhase::Idle;
            }
            if let Some(c) = self.circle_mut(switch.speak) {
                c.phase = SpeechPhase::FadingIn;
                c.opacity = 0.0;
            }
        }

        if let Some(at) = self.dissolve_at {
            if now >= at && self.mode == SceneMode::Active {
                self.begin_dissolve(rng);
            }
        }

        if self.mode == SceneMode::Dissolving {
            let fade = self.circle_fade * dt;
            for circle in &mut self.circles {
                circle.alpha -= fade;
            }
            self.circles.retain(|c| c.alpha > 0.02);

            let rain_fade = self.rain_fade * dt;
            let min_opacity = self.rain_min_opacity;
            for drop in &mut self.rain {
                drop.y += drop.fall_speed * dt;
                drop.opacity -= rain_fade;
            }
            self.rain.retain(|d| d.opacity > min_opacity);

            if self.circles.is_empty() && self.rain.is_empty() {
                self.reset();
            }
        }
    }

    /// Start the scripted dissolve: a burst of rain over the whole view,
    /// everything fading until the session resets.
    fn begin_dissolve(&mut self, rng: &mut impl Rng) {
        self.mode = SceneMode::Dissolving;
        self.switches.clear();
        self.rain.reserve(self.rain_count as usize);
        for _ in 0..self.rain_count {
            self.rain.push(RainCircle {
                x: rng.random_range(0.0..self.view.width.max(1.0)),
                y: rng.random_range(-self.view.height.max(1.0)..self.view.height.max(1.0)),
                radius: rng.random_range(1.5..4.5),
                fall_speed: rng.random_range(120.0..320.0),
                opacity: rng.random_range(0.35..0.9),
                color: RAIN_COLOR,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scene() -> Scene {
        Scene::new(&AppConfig::default(), 1280.0, 800.0)
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    /// Run one full round trip: request a new pair and feed back a canned
    /// successful outcome.
    fn spawn_test_pair(scene: &mut Scene, rng: &mut StdRng, now: Instant) -> (CircleId, CircleId) {
        let request = scene.begin_new_pair(rng).expect("active scene takes requests");
        scene.apply_event(
            SceneEvent::RoundReady {
                round_id: request.round_id,
                first_line: "First line.".to_string(),
                second_line: "Second line.".to_string(),
            },
            now,
            rng,
        );
        let ids: Vec<CircleId> = scene.circles().iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), 2);
        (ids[0], ids[1])
    }

    #[test]
    fn new_pair_spawns_two_circles_with_one_speaking() {
        let mut scene = scene();
        let mut rng = rng();
        let now = Instant::now();
        let (a, b) = spawn_test_pair(&mut scene, &mut rng, now);

        let first = scene.circle(a).unwrap();
        let second = scene.circle(b).unwrap();
        assert_eq!(first.phase, SpeechPhase::FadingIn);
        assert_eq!(second.phase, SpeechPhase::Idle);
        assert_eq!(first.pair, second.pair);
        assert_ne!(first.speaker, second.speaker);

        let dist = ((first.x - second.x).powi(2) + (first.y - second.y).powi(2)).sqrt();
        assert!(dist >= scene.placement.min_distance - 0.01);
    }

    #[test]
    fn clicking_a_body_removes_only_that_circle() {
        let mut scene = scene();
        let mut rng = rng();
        let (a, b) = spawn_test_pair(&mut scene, &mut rng, Instant::now());

        let (ax, ay) = {
            let c = scene.circle(a).unwrap();
            (c.x, c.y)
        };
        assert_eq!(scene.hit_test(ax, ay), Some(Hit::Body(a)));
        scene.remove_circle(a);
        assert!(scene.circle(a).is_none());
        assert!(scene.circle(b).is_some());
    }

    #[test]
    fn removal_is_idempotent() {
        let mut scene = scene();
        let mut rng = rng();
        let (a, _) = spawn_test_pair(&mut scene, &mut rng, Instant::now());
        scene.remove_circle(a);
        let count = scene.circles().len();
        scene.remove_circle(a);
        assert_eq!(scene.circles().len(), count);
    }

    #[test]
    fn speaker_switch_fires_after_the_delay_and_skips_removed_circles() {
        let mut scene = scene();
        let mut rng = rng();
        let now = Instant::now();
        let (a, b) = spawn_test_pair(&mut scene, &mut rng, now);

        // Before the deadline nothing switches.
        scene.tick(now + Duration::from_secs(1), 1.0, &mut rng);
        assert_eq!(scene.circle(b).unwrap().phase, SpeechPhase::Idle);

        scene.tick(now + Duration::from_secs(4), 0.016, &mut rng);
        assert_eq!(scene.circle(a).unwrap().phase, SpeechPhase::Idle);
        assert_ne!(scene.circle(b).unwrap().phase, SpeechPhase::Idle);

        // A switch aimed at a removed circle is a no-op.
        let request = scene.begin_continuation(b).unwrap();
        scene.apply_event(
            SceneEvent::RoundReady {
                round_id: request.round_id,
                first_line: "More.".to_string(),
                second_line: "And more.".to_string(),
            },
            now + Duration::from_secs(5),
            &mut rng,
        );
        scene.remove_circle(a);
        scene.tick(now + Duration::from_secs(10), 0.016, &mut rng);
        assert!(scene.circle(a).is_none());
    }

    #[test]
    fn label_click_requests_a_round_for_the_stored_partner() {
        let mut scene = scene();
        let mut rng = rng();
        let (a, b) = spawn_test_pair(&mut scene, &mut rng, Instant::now());

        let request = scene.begin_continuation(a).unwrap();
        let speaker_a = scene.circle(a).unwrap().speaker.clone();
        let speaker_b = scene.circle(b).unwrap().speaker.clone();
        assert_eq!(request.first_speaker, speaker_a);
        assert_eq!(request.second_speaker, speaker_b);
        scene.cancel_round(request.round_id);

        // With the partner removed there is nobody to answer.
        scene.remove_circle(b);
        assert!(scene.begin_continuation(a).is_none());
    }

    #[test]
    fn failed_round_surfaces_one_error_and_spawns_nothing() {
        let mut scene = scene();
        let mut rng = rng();
        let request = scene.begin_new_pair(&mut rng).unwrap();
        scene.apply_event(
            SceneEvent::RoundFailed {
                round_id: request.round_id,
                message: "Failed to generate conversation".to_string(),
            },
            Instant::now(),
            &mut rng,
        );
        assert!(scene.circles().is_empty());
        assert_eq!(
            scene.last_error.as_deref(),
            Some("Failed to generate conversation")
        );

        // The next attempt clears the stale error.
        let _ = scene.begin_new_pair(&mut rng).unwrap();
        assert!(scene.last_error.is_none());
    }

    #[test]
    fn rounds_escalate_and_eventually_dissolve() {
        let mut scene = scene();
        let mut rng = rng();
        let mut now = Instant::now();
        let (a, b) = spawn_test_pair(&mut scene, &mut rng, now);

        let mut saw_existential = false;
        for round in 2..=scene.dissolve_after {
            now += Duration::from_secs(8);
            let request = scene.begin_continuation(a).unwrap();
            if request.kind == RoundKind::Existential {
                saw_existential = true;
            }
            scene.apply_event(
                SceneEvent::RoundReady {
                    round_id: request.round_id,
                    first_line: format!("Round {} one way.", round),
                    second_line: format!("Round {} back.", round),
                },
                now,
                &mut rng,
            );
        }
        assert!(saw_existential);
        assert!(scene.circle(a).unwrap().existential);
        assert!(scene.circle(b).unwrap().existential);
        assert!(scene.dissolve_at.is_some());

        // Ride out the dwell, the rain burst, and the fade.
        now += scene.dissolve_dwell + Duration::from_secs(1);
        scene.tick(now, 0.016, &mut rng);
        assert_eq!(scene.mode(), SceneMode::Dissolving);
        assert!(!scene.rain().is_empty());
        for _ in 0..600 {
            now += Duration::from_millis(33);
            scene.tick(now, 0.033, &mut rng);
        }
        assert_eq!(scene.mode(), SceneMode::Active);
        assert!(scene.circles().is_empty());
        assert!(scene.rain().is_empty());
    }

    #[test]
    fn rain_dies_below_the_opacity_threshold() {
        let mut scene = scene();
        let mut rng = rng();
        scene.begin_dissolve(&mut rng);
        let spawned = scene.rain().len();
        assert_eq!(spawned, scene.rain_count as usize);
        assert!(scene.rain().iter().all(|d| d.opacity > scene.rain_min_opacity));

        let mut now = Instant::now();
        for _ in 0..400 {
            now += Duration::from_millis(33);
            scene.tick(now, 0.033, &mut rng);
            assert!(scene
                .rain()
                .iter()
                .all(|d| d.opacity > scene.rain_min_opacity));
        }
        assert!(scene.rain().is_empty());
    }

    #[test]
    fn pan_offsets_hit_testing() {
        let mut scene = scene();
        let mut rng = rng();
        let (a, _) = spawn_test_pair(&mut scene, &mut rng, Instant::now());
        let (ax, ay) = {
            let c = scene.circle(a).unwrap();
            (c.x, c.y)
        };
        scene.pan_by(300.0, -120.0);
        assert_eq!(scene.hit_test(ax + 300.0, ay - 120.0), Some(Hit::Body(a)));
        assert_ne!(scene.hit_test(ax, ay), Some(Hit::Body(a)));
    }
}

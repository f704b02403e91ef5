use rand::Rng;

use crate::config::CanvasConfig;

/// A candidate circle center in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn distance(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Canvas area available for placement.
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

/// Distance constraints derived from the canvas configuration.
#[derive(Debug, Clone, Copy)]
pub struct PlacementConfig {
    /// Minimum center distance to every existing circle
    pub min_distance: f32,
    /// Vertical band reserved below each circle for its text label
    pub band_height: f32,
    /// Center distance between the two circles of a pair
    pub pair_distance: f32,
    /// Attempt budget for rejection sampling
    pub max_attempts: u32,
    /// Margin kept between candidates and the canvas edges
    pub edge_margin: f32,
}

impl PlacementConfig {
    pub fn from_canvas(canvas: &CanvasConfig) -> Self {
        Self {
            min_distance: canvas.circle_radius * canvas.min_distance_factor,
            band_height: canvas.circle_radius + canvas.text_band_height,
            pair_distance: canvas.pair_distance,
            max_attempts: canvas.max_attempts,
            edge_margin: canvas.edge_margin,
        }
    }
}

/// True when the candidate sits too close to any existing center or inside
/// any existing circle's text band.
pub fn overlaps(candidate: Point, existing: &[Point], cfg: &PlacementConfig) -> bool {
    existing.iter().any(|other| {
        let dy = (candidate.y - other.y).abs();
        candidate.distance(other) < cfg.min_distance || dy < cfg.band_height
    })
}

fn sample(rng: &mut impl Rng, bounds: Bounds, margin: f32) -> Point {
    // Degenerate windows collapse the sampling span rather than panic.
    let span_x = (bounds.width - 2.0 * margin).max(1.0);
    let span_y = (bounds.height - 2.0 * margin).max(1.0);
    Point {
        x: margin + rng.random_range(0.0..span_x),
        y: margin + rng.random_range(0.0..span_y),
    }
}

/// Place the first circle of a pair by rejection sampling. When the attempt
/// budget runs out the last candidate is accepted; overlap is a visual
/// blemish, not a correctness failure.
pub fn place_first(
    rng: &mut impl Rng,
    bounds: Bounds,
    existing: &[Point],
    cfg: &PlacementConfig,
) -> Point {
    let mut candidate = sample(rng, bounds, cfg.edge_margin);
    for _ in 1..cfg.max_attempts {
        if !overlaps(candidate, existing, cfg) {
            return candidate;
        }
        candidate = sample(rng, bounds, cfg.edge_margin);
    }
    candidate
}

/// Place the partner circle by sweeping angles around the first position in
/// π/8 steps, accepting the last candidate after a full revolution.
pub fn place_partner(first: Point, existing: &[Point], cfg: &PlacementConfig) -> Point {
    let step = std::f32::consts::PI / 8.0;
    let mut angle = 0.0f32;
    loop {
        let candidate = Point {
            x: first.x + angle.cos() * cfg.pair_distance,
            y: first.y + angle.sin() * cfg.pair_distance,
        };
        angle += step;
        if !overlaps(candidate, existing, cfg) || angle >= std::f32::consts::TAU {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CanvasConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn cfg() -> PlacementConfig {
        PlacementConfig::from_canvas(&CanvasConfig::default())
    }

    fn bounds() -> Bounds {
        Bounds {
            width: 1280.0,
            height: 800.0,
        }
    }

    #[test]
    fn empty_canvas_pair_respects_minimum_distance() {
        let cfg = cfg();
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let first = place_first(&mut rng, bounds(), &[], &cfg);
            let second = place_partner(first, &[first], &cfg);
            // Tolerance covers rounding on the angular search ring, which
            // sits exactly at the minimum distance.
            assert!(
                first.distance(&second) >= cfg.min_distance - 0.01,
                "seed {}: pair only {} apart",
                seed,
                first.distance(&second)
            );
        }
    }

    #[test]
    fn accepted_candidate_clears_existing_centers_or_budget_was_spent() {
        let cfg = cfg();
        let existing = vec![
            Point { x: 300.0, y: 250.0 },
            Point { x: 700.0, y: 500.0 },
        ];
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..64 {
            let placed = place_first(&mut rng, bounds(), &existing, &cfg);
            if !overlaps(placed, &existing, &cfg) {
                for other in &existing {
                    assert!(placed.distance(other) >= cfg.min_distance);
                }
            }
            // Either way the heuristic must produce something in bounds.
            assert!(placed.x >= cfg.edge_margin);
            assert!(placed.y >= cfg.edge_margin);
        }
    }

    #[test]
    fn exhausted_budget_still_returns_a_candidate() {
        // Saturate the text band across the whole canvas so nothing fits.
        let cfg = PlacementConfig {
            band_height: 10_000.0,
            ..cfg()
        };
        let existing = vec![Point { x: 640.0, y: 400.0 }];
        let mut rng = StdRng::seed_from_u64(3);
        let placed = place_first(&mut rng, bounds(), &existing, &cfg);
        assert!(placed.x.is_finite() && placed.y.is_finite());

        let partner = place_partner(existing[0], &existing, &cfg);
        assert!(
            (existing[0].distance(&partner) - cfg.pair_distance).abs() < 1.0,
            "partner must sit on the search ring even when every angle overlaps"
        );
    }

    #[test]
    fn band_overlap_rejects_vertically_close_candidates() {
        let cfg = cfg();
        let existing = vec![Point { x: 100.0, y: 400.0 }];
        // Far away horizontally but inside the label band.
        let candidate = Point { x: 900.0, y: 420.0 };
        assert!(overlaps(candidate, &existing, &cfg));
        // Outside the band and past the minimum distance.
        let candidate = Point { x: 900.0, y: 700.0 };
        assert!(!overlaps(candidate, &existing, &cfg));
    }
}

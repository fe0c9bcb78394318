#![deny(unsafe_code)]
//! Particle advection over a [`VectorField`].
//!
//! A fixed pool of massless particles is moved through the field one tick at
//! a time. Each tick a particle samples the field at its position, takes an
//! Euler step scaled by `velocity_scale` and ages by one. Particles that grow
//! older than `max_age`, or that would step onto a position without data,
//! expire and are respawned at a random cell on the following tick.
//!
//! The advector draws nothing. A rendering driver calls [`ParticleAdvector::tick`]
//! on its own schedule and strokes the returned [`Segment`]s, styling them by
//! magnitude.

use geofield_core::error::FieldError;
use geofield_core::params::{param_f64, param_u32, param_u64, param_usize};
use geofield_core::{Extent, LonLat, VectorField, Xorshift64};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Default number of particles in the pool.
pub const DEFAULT_PATHS: usize = 800;
/// Default number of ticks a particle lives.
pub const DEFAULT_MAX_AGE: u32 = 200;
/// Default factor from field units to degrees per tick.
pub const DEFAULT_VELOCITY_SCALE: f64 = 1.0 / 5000.0;
/// Default PRNG seed for spawn positions and ages.
pub const DEFAULT_SEED: u64 = 42;
/// Random draws made when respawning before settling for a cell without data.
const SPAWN_ATTEMPTS: usize = 16;

/// Tunable settings of a [`ParticleAdvector`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdvectorParams {
    /// Pool size, fixed for the advector's lifetime.
    pub paths: usize,
    /// Ticks a particle lives before it is respawned.
    pub max_age: u32,
    /// Multiplier applied to field vectors to get a per-tick displacement.
    pub velocity_scale: f64,
    /// Seed for spawn positions and initial ages.
    pub seed: u64,
}

impl Default for AdvectorParams {
    fn default() -> Self {
        Self {
            paths: DEFAULT_PATHS,
            max_age: DEFAULT_MAX_AGE,
            velocity_scale: DEFAULT_VELOCITY_SCALE,
            seed: DEFAULT_SEED,
        }
    }
}

impl AdvectorParams {
    /// Extracts parameters from a JSON object, falling back to defaults.
    pub fn from_json(params: &Value) -> Self {
        Self {
            paths: param_usize(params, "paths", DEFAULT_PATHS),
            max_age: param_u32(params, "max_age", DEFAULT_MAX_AGE),
            velocity_scale: param_f64(params, "velocity_scale", DEFAULT_VELOCITY_SCALE),
            seed: param_u64(params, "seed", DEFAULT_SEED),
        }
    }

    /// Rejects empty pools, zero or saturated lifetimes and non-finite or
    /// negative velocity scales.
    pub fn validate(&self) -> Result<(), FieldError> {
        if self.paths == 0 {
            return Err(FieldError::InvalidParams("paths must be at least 1".into()));
        }
        if self.max_age == 0 || self.max_age == u32::MAX {
            return Err(FieldError::InvalidParams(format!(
                "max_age must be in 1..{}, got {}",
                u32::MAX,
                self.max_age
            )));
        }
        if !self.velocity_scale.is_finite() || self.velocity_scale < 0.0 {
            return Err(FieldError::InvalidParams(format!(
                "velocity_scale must be finite and non-negative, got {}",
                self.velocity_scale
            )));
        }
        Ok(())
    }
}

/// One tracer: its current position, the position it moves to next, its
/// age in ticks and the magnitude sampled for the pending step.
///
/// `magnitude` is `None` until a step has been committed, so freshly spawned
/// particles and particles that already moved emit no segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Particle {
    x: f64,
    y: f64,
    xt: f64,
    yt: f64,
    age: u32,
    magnitude: Option<f64>,
}

impl Particle {
    fn spawn(field: &VectorField, rng: &mut Xorshift64, age: u32) -> Self {
        let mut position = field.random_position(rng);
        for _ in 1..SPAWN_ATTEMPTS {
            if field.has_value_at(position.lon, position.lat) {
                break;
            }
            position = field.random_position(rng);
        }
        Self {
            x: position.lon,
            y: position.lat,
            xt: position.lon,
            yt: position.lat,
            age,
            magnitude: None,
        }
    }

    /// Current position.
    pub fn position(&self) -> LonLat {
        LonLat::new(self.x, self.y)
    }

    /// Position the particle moves to on the next `advance`.
    pub fn next_position(&self) -> LonLat {
        LonLat::new(self.xt, self.yt)
    }

    /// Age in ticks.
    pub fn age(&self) -> u32 {
        self.age
    }

    /// Field magnitude sampled for the pending step, if one is pending.
    pub fn magnitude(&self) -> Option<f64> {
        self.magnitude
    }

    /// The pending segment if the particle is alive, inside `viewport` and
    /// has a committed step.
    fn drawn_segment(&self, max_age: u32, viewport: &Extent) -> Option<Segment> {
        if self.age > max_age || !viewport.contains(self.x, self.y) {
            return None;
        }
        self.magnitude.map(|magnitude| Segment {
            from: self.position(),
            to: self.next_position(),
            magnitude,
        })
    }
}

/// A line from a particle's position to its next position, tagged with the
/// field magnitude that moved it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub from: LonLat,
    pub to: LonLat,
    pub magnitude: f64,
}

/// What happened to the pool during one [`ParticleAdvector::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepStats {
    /// Particles past `max_age` that were given a new position.
    pub respawned: usize,
    /// Particles forced to expire because their position or next position
    /// had no data.
    pub expired: usize,
    /// Particles that committed a new next position.
    pub moved: usize,
}

/// A fixed-size particle pool animated by repeated sampling of a borrowed
/// [`VectorField`].
pub struct ParticleAdvector<'a> {
    field: &'a VectorField,
    params: AdvectorParams,
    rng: Xorshift64,
    particles: Vec<Particle>,
    ticks: u64,
}

impl<'a> ParticleAdvector<'a> {
    /// Creates an advector with `params.paths` particles at random cells and
    /// random ages in `[0, max_age)`.
    ///
    /// Returns `FieldError::InvalidParams` if the parameters do not validate.
    pub fn new(field: &'a VectorField, params: AdvectorParams) -> Result<Self, FieldError> {
        params.validate()?;
        let mut advector = Self {
            field,
            params,
            rng: Xorshift64::new(params.seed),
            particles: Vec::with_capacity(params.paths),
            ticks: 0,
        };
        advector.populate();
        log::debug!(
            "advector ready: {} particles, max_age {}, velocity_scale {}",
            params.paths,
            params.max_age,
            params.velocity_scale
        );
        Ok(advector)
    }

    /// Creates an advector from a JSON params object, falling back to
    /// defaults for missing keys.
    pub fn from_json(field: &'a VectorField, json_params: &Value) -> Result<Self, FieldError> {
        Self::new(field, AdvectorParams::from_json(json_params))
    }

    /// Restores the pool to the state it had right after construction.
    pub fn reset(&mut self) {
        self.rng = Xorshift64::new(self.params.seed);
        self.ticks = 0;
        self.populate();
    }

    /// The field being sampled.
    pub fn field(&self) -> &'a VectorField {
        self.field
    }

    /// Parameters the advector was built with.
    pub fn settings(&self) -> &AdvectorParams {
        &self.params
    }

    /// The particle pool.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Number of completed `step` calls since construction or `reset`.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advances every particle by one tick.
    ///
    /// Per particle: past `max_age` it respawns and skips this tick;
    /// otherwise it samples the field at its position and, if both that
    /// sample and the sample at the Euler-stepped next position exist,
    /// commits the next position and magnitude. A missing sample forces the
    /// age to `max_age`. Every particle that did not respawn then ages by one,
    /// so an expired particle is respawned on the next tick.
    pub fn step(&mut self) -> StepStats {
        let field = self.field;
        let max_age = self.params.max_age;
        let scale = self.params.velocity_scale;
        let mut stats = StepStats::default();

        for p in &mut self.particles {
            if p.age > max_age {
                *p = Particle::spawn(field, &mut self.rng, 0);
                stats.respawned += 1;
                continue;
            }
            match field.value_at(p.x, p.y) {
                Some(vector) => {
                    let xt = p.x + vector.u() * scale;
                    let yt = p.y + vector.v() * scale;
                    if field.has_value_at(xt, yt) {
                        p.xt = xt;
                        p.yt = yt;
                        p.magnitude = Some(vector.magnitude());
                        stats.moved += 1;
                    } else {
                        p.age = max_age;
                        p.magnitude = None;
                        stats.expired += 1;
                    }
                }
                None => {
                    p.age = max_age;
                    p.magnitude = None;
                    stats.expired += 1;
                }
            }
            p.age += 1;
        }

        self.ticks += 1;
        log::trace!(
            "tick {}: {} moved, {} expired, {} respawned",
            self.ticks,
            stats.moved,
            stats.expired,
            stats.respawned
        );
        stats
    }

    /// Segments for particles inside `viewport` that are still alive and
    /// have a committed step. Does not change any particle.
    pub fn segments(&self, viewport: Extent) -> impl Iterator<Item = Segment> + '_ {
        let max_age = self.params.max_age;
        self.particles
            .iter()
            .filter_map(move |p| p.drawn_segment(max_age, &viewport))
    }

    /// Emits the same segments as [`segments`](Self::segments) and moves each
    /// emitting particle to its next position, consuming its pending step.
    pub fn advance(&mut self, viewport: Extent) -> Vec<Segment> {
        let max_age = self.params.max_age;
        self.particles
            .iter_mut()
            .filter_map(|p| {
                let segment = p.drawn_segment(max_age, &viewport)?;
                p.x = p.xt;
                p.y = p.yt;
                p.magnitude = None;
                Some(segment)
            })
            .collect()
    }

    /// One animation frame: [`step`](Self::step) then [`advance`](Self::advance).
    pub fn tick(&mut self, viewport: Extent) -> Vec<Segment> {
        self.step();
        self.advance(viewport)
    }

    /// Current parameter values as a JSON object.
    pub fn params(&self) -> Value {
        json!({
            "paths": self.params.paths,
            "max_age": self.params.max_age,
            "velocity_scale": self.params.velocity_scale,
            "seed": self.params.seed,
        })
    }

    /// Schema describing every parameter: type, range, default, description.
    pub fn param_schema(&self) -> Value {
        json!({
            "paths": {
                "type": "integer",
                "default": DEFAULT_PATHS,
                "min": 1,
                "description": "Number of particles in the pool"
            },
            "max_age": {
                "type": "integer",
                "default": DEFAULT_MAX_AGE,
                "min": 1,
                "description": "Ticks a particle lives before respawning"
            },
            "velocity_scale": {
                "type": "number",
                "default": DEFAULT_VELOCITY_SCALE,
                "min": 0.0,
                "description": "Degrees moved per tick per unit of field magnitude"
            },
            "seed": {
                "type": "integer",
                "default": DEFAULT_SEED,
                "description": "PRNG seed for spawn positions and ages"
            }
        })
    }

    fn populate(&mut self) {
        let field = self.field;
        let max_age = self.params.max_age;
        let rng = &mut self.rng;
        self.particles.clear();
        self.particles.extend((0..self.params.paths).map(|_| {
            let age = rng.next_below(max_age);
            Particle::spawn(field, rng, age)
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geofield_core::{GridHeader, VectorGrid};

    /// 10x10 one-degree grid centred on the origin with a constant vector.
    fn uniform(u: f64, v: f64) -> VectorField {
        let header = GridHeader::new(10, 10, -5.0, -5.0, 1.0);
        VectorField::from_grid(&VectorGrid::new(header, vec![u; 100], vec![v; 100])).unwrap()
    }

    /// 10x10 grid where only the cells listed by `valid` hold data.
    fn sparse(valid: &[usize]) -> VectorField {
        let header = GridHeader::new(10, 10, -5.0, -5.0, 1.0);
        let us: Vec<f64> = (0..100)
            .map(|i| if valid.contains(&i) { 0.5 } else { f64::NAN })
            .collect();
        VectorField::from_grid(&VectorGrid::new(header, us, vec![0.0; 100])).unwrap()
    }

    fn params(paths: usize, max_age: u32, velocity_scale: f64) -> AdvectorParams {
        AdvectorParams {
            paths,
            max_age,
            velocity_scale,
            seed: 7,
        }
    }

    // ---- Construction ----

    #[test]
    fn new_builds_fixed_pool_with_young_particles() {
        let field = uniform(1.0, 0.0);
        let adv = ParticleAdvector::new(&field, params(300, 50, 0.01)).unwrap();
        assert_eq!(adv.particles().len(), 300);
        for p in adv.particles() {
            assert!(p.age() < 50, "initial age {} not below max_age", p.age());
            assert!(field.contains(p.position().lon, p.position().lat));
            assert_eq!(p.position(), p.next_position());
        }
    }

    #[test]
    fn new_rejects_invalid_params() {
        let field = uniform(1.0, 0.0);
        for bad in [
            params(0, 10, 0.1),
            params(10, 0, 0.1),
            params(10, u32::MAX, 0.1),
            params(10, 10, -0.1),
            params(10, 10, f64::NAN),
        ] {
            assert!(
                matches!(
                    ParticleAdvector::new(&field, bad),
                    Err(FieldError::InvalidParams(_))
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn from_json_uses_defaults_for_empty_json() {
        let field = uniform(1.0, 0.0);
        let adv = ParticleAdvector::from_json(&field, &json!({})).unwrap();
        assert_eq!(*adv.settings(), AdvectorParams::default());
        assert_eq!(adv.particles().len(), DEFAULT_PATHS);
    }

    #[test]
    fn from_json_extracts_custom_values() {
        let field = uniform(1.0, 0.0);
        let json_params = json!({"paths": 64, "max_age": 90, "velocity_scale": 0.5, "seed": 3});
        let adv = ParticleAdvector::from_json(&field, &json_params).unwrap();
        assert_eq!(adv.particles().len(), 64);
        let p = adv.params();
        assert_eq!(p["max_age"], 90);
        assert!((p["velocity_scale"].as_f64().unwrap() - 0.5).abs() < f64::EPSILON);
        assert_eq!(p["seed"], 3);
    }

    #[test]
    fn param_schema_describes_every_parameter() {
        let field = uniform(1.0, 0.0);
        let adv = ParticleAdvector::new(&field, params(4, 10, 0.1)).unwrap();
        let schema = adv.param_schema();
        for key in &["paths", "max_age", "velocity_scale", "seed"] {
            assert!(schema.get(key).is_some(), "schema missing parameter: {key}");
            assert!(schema[key].get("type").is_some(), "{key} missing 'type'");
            assert!(schema[key].get("default").is_some(), "{key} missing 'default'");
        }
    }

    #[test]
    fn spawning_prefers_cells_with_data() {
        // 5 valid cells out of 100: 16 draws find one nearly always
        let field = sparse(&[0, 22, 45, 67, 99]);
        let adv = ParticleAdvector::new(&field, params(200, 20, 0.01)).unwrap();
        let on_data = adv
            .particles()
            .iter()
            .filter(|p| field.has_value_at(p.position().lon, p.position().lat))
            .count();
        assert!(on_data > 100, "only {on_data} of 200 particles spawned on data");
    }

    // ---- Determinism ----

    #[test]
    fn same_seed_same_pool_and_evolution() {
        let field = uniform(0.3, -0.2);
        let mut a = ParticleAdvector::new(&field, params(100, 30, 0.05)).unwrap();
        let mut b = ParticleAdvector::new(&field, params(100, 30, 0.05)).unwrap();
        for _ in 0..40 {
            assert_eq!(a.tick(Extent::world()), b.tick(Extent::world()));
        }
        assert_eq!(a.particles(), b.particles());
    }

    #[test]
    fn reset_restores_initial_pool() {
        let field = uniform(1.0, 1.0);
        let mut adv = ParticleAdvector::new(&field, params(50, 10, 0.1)).unwrap();
        let initial = adv.particles().to_vec();
        for _ in 0..25 {
            adv.tick(Extent::world());
        }
        assert_eq!(adv.ticks(), 25);
        adv.reset();
        assert_eq!(adv.ticks(), 0);
        assert_eq!(adv.particles(), initial.as_slice());
    }

    // ---- Stepping ----

    #[test]
    fn step_moves_particles_along_the_field() {
        let field = uniform(1.0, -2.0);
        let mut adv = ParticleAdvector::new(&field, params(100, 1000, 0.01)).unwrap();
        let before = adv.particles().to_vec();
        let stats = adv.step();
        assert_eq!(stats.moved, 100);
        assert_eq!(stats.expired + stats.respawned, 0);
        for (old, new) in before.iter().zip(adv.particles()) {
            assert_eq!(new.position(), old.position(), "step must not move the position");
            assert!((new.next_position().lon - (old.position().lon + 0.01)).abs() < 1e-12);
            assert!((new.next_position().lat - (old.position().lat - 0.02)).abs() < 1e-12);
            assert!((new.magnitude().unwrap() - 5.0_f64.sqrt()).abs() < 1e-12);
            assert_eq!(new.age(), old.age() + 1);
        }
    }

    #[test]
    fn particles_past_max_age_respawn_at_age_zero() {
        let field = uniform(0.0, 0.0);
        let mut adv = ParticleAdvector::new(&field, params(50, 3, 0.1)).unwrap();
        for _ in 0..10 {
            let over: Vec<usize> = adv
                .particles()
                .iter()
                .enumerate()
                .filter(|(_, p)| p.age() > 3)
                .map(|(i, _)| i)
                .collect();
            adv.step();
            for i in over {
                assert_eq!(adv.particles()[i].age(), 0, "particle {i} was not respawned");
            }
        }
    }

    #[test]
    fn stranded_particles_expire_then_respawn() {
        // every step leaves the 10-degree grid, so no move is ever valid
        let field = uniform(100.0, 0.0);
        let mut adv = ParticleAdvector::new(&field, params(40, 20, 1.0)).unwrap();

        let stats = adv.step();
        assert_eq!(stats.expired, 40);
        assert!(adv.particles().iter().all(|p| p.age() == 21));
        assert_eq!(adv.segments(Extent::world()).count(), 0);

        let stats = adv.step();
        assert_eq!(stats.respawned, 40);
        for p in adv.particles() {
            assert_eq!(p.age(), 0);
            assert!(field.has_value_at(p.position().lon, p.position().lat));
        }
    }

    #[test]
    fn particle_without_data_under_it_expires() {
        // a single valid cell whose vector points east into no-data
        let field = sparse(&[44]);
        let mut adv = ParticleAdvector::new(&field, params(30, 10, 0.4)).unwrap();
        adv.step();
        for p in adv.particles() {
            let here = p.position();
            // from the valid cell's center a 0.2 degree step stays in the cell
            if field.has_value_at(here.lon, here.lat) {
                assert!(p.age() <= 10);
            } else {
                assert_eq!(p.age(), 11, "stranded particle at {here:?} not expired");
            }
        }
    }

    // ---- Segments ----

    #[test]
    fn segments_are_read_only_and_repeatable() {
        let field = uniform(1.0, 0.0);
        let mut adv = ParticleAdvector::new(&field, params(20, 100, 0.1)).unwrap();
        adv.step();
        let first: Vec<Segment> = adv.segments(Extent::world()).collect();
        let second: Vec<Segment> = adv.segments(Extent::world()).collect();
        assert_eq!(first, second);
        assert!(!first.is_empty());
        for s in &first {
            assert!((s.to.lon - s.from.lon - 0.1).abs() < 1e-12);
            assert!((s.magnitude - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn advance_moves_only_emitting_particles() {
        let field = uniform(1.0, 0.0);
        let mut adv = ParticleAdvector::new(&field, params(200, 1000, 0.1)).unwrap();
        adv.step();
        // western half of the grid only
        let viewport = Extent::new(-5.0, -5.0, 0.0, 5.0);
        let before = adv.particles().to_vec();
        let emitted = adv.advance(viewport);
        let expected = before
            .iter()
            .filter(|p| viewport.contains(p.position().lon, p.position().lat))
            .count();
        assert_eq!(emitted.len(), expected);
        for (old, new) in before.iter().zip(adv.particles()) {
            if viewport.contains(old.position().lon, old.position().lat) {
                assert_eq!(new.position(), old.next_position());
            } else {
                assert_eq!(new.position(), old.position());
            }
        }
    }

    #[test]
    fn expired_particles_emit_no_segments() {
        let field = uniform(100.0, 0.0);
        let mut adv = ParticleAdvector::new(&field, params(10, 5, 1.0)).unwrap();
        assert!(adv.tick(Extent::world()).is_empty());
    }

    #[test]
    fn respawned_particles_emit_no_segment_until_they_step() {
        let field = uniform(1.0, 0.0);
        let mut adv = ParticleAdvector::new(&field, params(50, 2, 0.01)).unwrap();
        let mut emitted = 0;
        for _ in 0..10 {
            for s in adv.tick(Extent::world()) {
                assert_ne!(s.from, s.to, "zero-length segment emitted");
                assert!((s.magnitude - 1.0).abs() < 1e-12, "magnitude {}", s.magnitude);
                emitted += 1;
            }
        }
        assert!(emitted > 0);
    }

    #[test]
    fn fresh_pool_has_no_pending_segments() {
        let field = uniform(1.0, 0.0);
        let adv = ParticleAdvector::new(&field, params(20, 10, 0.1)).unwrap();
        assert!(adv.particles().iter().all(|p| p.magnitude().is_none()));
        assert_eq!(adv.segments(Extent::world()).count(), 0);
    }

    #[test]
    fn advance_consumes_the_pending_step() {
        let field = uniform(1.0, 0.0);
        let mut adv = ParticleAdvector::new(&field, params(20, 100, 0.1)).unwrap();
        adv.step();
        assert_eq!(adv.advance(Extent::world()).len(), 20);
        assert!(adv.advance(Extent::world()).is_empty());
        assert_eq!(adv.segments(Extent::world()).count(), 0);
    }

    #[test]
    fn particles_travel_over_several_ticks() {
        let field = uniform(0.0, 1.0);
        let mut adv = ParticleAdvector::new(&field, params(1, 1000, 0.1)).unwrap();
        let start = adv.particles()[0].position();
        for _ in 0..3 {
            adv.tick(Extent::world());
        }
        let p = adv.particles()[0];
        if p.age() <= 1000 && field.has_value_at(start.lon, start.lat + 0.3) {
            assert!((p.position().lat - (start.lat + 0.3)).abs() < 1e-9);
        }
    }

    // ---- Property-based tests ----

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn no_particle_stays_past_max_age(
                seed: u64,
                max_age in 1_u32..20,
                scale in 0.0_f64..2.0,
                valid in prop::collection::vec(0_usize..100, 1..40),
            ) {
                let field = sparse(&valid);
                let p = AdvectorParams { paths: 60, max_age, velocity_scale: scale, seed };
                let mut adv = ParticleAdvector::new(&field, p).unwrap();
                for _ in 0..30 {
                    let expiring: Vec<bool> =
                        adv.particles().iter().map(|p| p.age() > max_age).collect();
                    adv.step();
                    for (i, p) in adv.particles().iter().enumerate() {
                        prop_assert!(p.age() <= max_age + 1);
                        if expiring[i] {
                            prop_assert_eq!(p.age(), 0);
                        }
                        let here = p.position();
                        if p.age() != 0 && !field.has_value_at(here.lon, here.lat) {
                            prop_assert_eq!(p.age(), max_age + 1, "stranded particle kept alive");
                        }
                    }
                    adv.advance(Extent::world());
                }
            }
        }
    }
}

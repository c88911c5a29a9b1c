use bevy::prelude::*;
use rand::Rng;

use crate::body::Body;
use crate::settings::SimSettings;
use crate::surface::{FrameClock, Surface};

/// Floor on squared separation in the gravity law.
pub const MIN_DISTANCE_SQ: f32 = 100.0;

pub const BACKGROUND: Color = Color::BLACK;
pub const ANCHOR_COLOR: Color = Color::BLACK;
pub const MERGE_COLOR: Color = Color::srgb(1.0, 206.0 / 255.0, 41.0 / 255.0);

const PLANET_COLORS: [Color; 3] = [
    Color::srgb(77.0 / 255.0, 157.0 / 255.0, 236.0 / 255.0),
    Color::srgb(85.0 / 255.0, 168.0 / 255.0, 101.0 / 255.0),
    Color::srgb(192.0 / 255.0, 139.0 / 255.0, 219.0 / 255.0),
];

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimSet {
    Input,
    Physics,
    Draw,
}

#[derive(Event, Default)]
pub struct ResetEvent;

#[derive(Event)]
pub struct SpawnPlanet {
    pub pos: Vec2,
}

/// Measured length of the previous frame, in seconds.
#[derive(Resource, Default, Deref, DerefMut)]
pub struct FrameDt(pub f32);

#[derive(Resource, Default, Deref, DerefMut)]
struct Pacer(FrameClock);

pub struct SimPlugin;
impl Plugin for SimPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimSettings>()
            .init_resource::<FrameDt>()
            .init_resource::<Pacer>()
            .add_event::<ResetEvent>()
            .add_event::<SpawnPlanet>()
            .configure_sets(
                Update,
                (SimSet::Input, SimSet::Physics, SimSet::Draw).chain(),
            )
            .add_systems(Startup, (check_settings, spawn_initial_bodies))
            .add_systems(First, pace_frame)
            .add_systems(
                Update,
                (handle_reset, spawn_planets, step_simulation)
                    .chain()
                    .in_set(SimSet::Physics),
            );
    }
}

/// Stable handle to a body; never reused within one simulator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(u64);

#[derive(Clone, Debug)]
struct Slot {
    id: BodyId,
    body: Body,
    merged: bool,
}

#[derive(Resource, Clone, Debug)]
pub struct Simulator {
    slots: Vec<Slot>,
    next_id: u64,
    merges: u64,
    pub g: f32,
    pub dt: f32,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(SimSettings::default().g)
    }
}

fn pair_mut<T>(v: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    debug_assert!(i < j);
    let (head, tail) = v.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}

fn gravity(g: f32, b1: &Body, b2: &Body) -> Vec2 {
    let direction = b2.pos - b1.pos;
    let distance_sq = direction.length_squared().max(MIN_DISTANCE_SQ);
    let magnitude = g * b1.mass * b2.mass / distance_sq;
    // coincident bodies have no direction and so exert no force
    direction.normalize_or_zero() * magnitude
}

impl Simulator {
    pub fn new(g: f32) -> Self {
        Self {
            slots: Vec::new(),
            next_id: 0,
            merges: 0,
            g,
            dt: 0.0,
        }
    }

    /// The star and three orbiting planets the window opens with.
    pub fn solar_system(settings: &SimSettings) -> Self {
        let mut sim = Self::new(settings.g);
        let c = settings.center();

        let star = Body::new_static(c, 30000.0, 100.0, ANCHOR_COLOR);
        let planets = [
            Body::new(c - Vec2::new(75.0 + star.radius, 0.0), 200.0, 20.0, PLANET_COLORS[0]),
            Body::new(c + Vec2::new(200.0 + star.radius, 0.0), 300.0, 15.0, PLANET_COLORS[1]),
            Body::new(c - Vec2::new(0.0, 100.0 + star.radius), 100.0, 25.0, PLANET_COLORS[2]),
        ];

        sim.add_body(star.clone());
        for mut planet in planets {
            sim.compute_orbit_velocity(&mut planet, &star);
            sim.add_body(planet);
        }
        sim
    }

    pub fn add_body(&mut self, body: Body) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        self.slots.push(Slot {
            id,
            body,
            merged: false,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.slots.iter().map(|s| &s.body)
    }

    pub fn get(&self, id: BodyId) -> Option<&Body> {
        self.slots.iter().find(|s| s.id == id).map(|s| &s.body)
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.get(id).is_some()
    }

    pub fn merges(&self) -> u64 {
        self.merges
    }

    pub fn total_mass(&self) -> f32 {
        self.bodies().map(|b| b.mass).sum()
    }

    pub fn total_momentum(&self) -> Vec2 {
        self.bodies().map(Body::momentum).sum()
    }

    pub fn heaviest_static(&self) -> Option<&Body> {
        self.bodies()
            .filter(|b| b.is_static)
            .max_by(|a, b| a.mass.total_cmp(&b.mass))
    }

    /// Force pulling `b1` toward `b2`; `b2` feels the negation.
    pub fn compute_gravity(&self, b1: &Body, b2: &Body) -> Vec2 {
        gravity(self.g, b1, b2)
    }

    /// True when the centres are no further apart than `b1.radius - b2.radius`.
    ///
    /// This is a containment test, not circle overlap: it only fires once the
    /// larger body has swallowed the smaller one's centre, and never when
    /// `b1` is the smaller of the two.
    pub fn check_collision(b1: &Body, b2: &Body) -> bool {
        b1.pos.distance(b2.pos) <= b1.radius - b2.radius
    }

    /// Perfectly inelastic merge. Does not touch the collection.
    pub fn handle_collision(b1: &Body, b2: &Body) -> Body {
        let total_mass = b1.mass + b2.mass;
        let vel = (b1.vel * b1.mass + b2.vel * b2.mass) / total_mass;
        let pos = (b1.pos * b1.mass + b2.pos * b2.mass) / total_mass;

        if b1.is_static || b2.is_static {
            let radius = if b1.is_static { b1.radius } else { b2.radius };
            Body::new_static(pos, total_mass, radius, ANCHOR_COLOR).with_velocity(vel)
        } else {
            Body::new(pos, total_mass, b1.radius + b2.radius, MERGE_COLOR).with_velocity(vel)
        }
    }

    pub fn step(&mut self, dt: f32) {
        self.dt = dt;
        self.update_physics();
    }

    /// One physics step of length `self.dt`.
    ///
    /// Pairs are drawn from the bodies present when the step starts. A merged
    /// pair still exchanges gravity in the iteration that merged it, then takes
    /// no part in later pairs; the merge product joins the scan next step.
    pub fn update_physics(&mut self) {
        let n = self.slots.len();
        let mut born = Vec::new();

        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = pair_mut(&mut self.slots, i, j);
                if a.merged || b.merged {
                    continue;
                }
                if Self::check_collision(&a.body, &b.body) {
                    born.push((a.id, b.id, Self::handle_collision(&a.body, &b.body)));
                    a.merged = true;
                    b.merged = true;
                }
                let force = gravity(self.g, &a.body, &b.body);
                a.body.apply_force(force);
                b.body.apply_force(-force);
            }
        }

        if !born.is_empty() {
            self.slots.retain(|s| !s.merged);
            for (a, b, body) in born {
                let mass = body.mass;
                let id = self.add_body(body);
                self.merges += 1;
                debug!("merged {a:?} and {b:?} into {id:?} (mass {mass})");
            }
        }

        let dt = self.dt;
        for slot in &mut self.slots {
            slot.body.integrate(dt);
        }
    }

    /// Put `planet` on a circular orbit around `star`.
    ///
    /// A planet sitting exactly on the star has no orbit and is left at rest.
    pub fn compute_orbit_velocity(&self, planet: &mut Body, star: &Body) {
        let r = planet.pos - star.pos;
        let dist = r.length();
        if dist == 0.0 {
            planet.vel = Vec2::ZERO;
            return;
        }
        let speed = (self.g * star.mass / dist).sqrt();
        planet.vel = Vec2::new(-r.y, r.x).normalize_or_zero() * speed;
    }

    pub fn draw<S: Surface>(&self, surface: &mut S) {
        surface.clear(BACKGROUND);
        for body in self.bodies() {
            body.render(surface);
        }
        surface.present();
    }
}

fn check_settings(settings: Res<SimSettings>, mut exit: EventWriter<AppExit>) {
    if let Err(err) = settings.validate() {
        error!("invalid settings: {err}");
        exit.send(AppExit::error());
    }
}

fn spawn_initial_bodies(mut commands: Commands, settings: Res<SimSettings>) {
    let sim = Simulator::solar_system(&settings);
    info!("spawned {} bodies", sim.len());
    commands.insert_resource(sim);
}

fn pace_frame(mut pacer: ResMut<Pacer>, settings: Res<SimSettings>, mut dt: ResMut<FrameDt>) {
    dt.0 = pacer.tick(settings.target_fps);
}

fn handle_reset(
    mut ev: EventReader<ResetEvent>,
    mut sim: ResMut<Simulator>,
    settings: Res<SimSettings>,
) {
    if ev.read().next().is_some() {
        *sim = Simulator::solar_system(&settings);
        info!("simulation reset");
    }
}

fn spawn_planets(mut ev: EventReader<SpawnPlanet>, mut sim: ResMut<Simulator>) {
    let mut rng = rand::thread_rng();
    for e in ev.read() {
        let mass = rng.gen_range(50.0..400.0);
        let radius = rng.gen_range(8.0..25.0);
        let color = Color::srgb(
            rng.gen_range(0.3..1.0),
            rng.gen_range(0.3..1.0),
            rng.gen_range(0.3..1.0),
        );
        let mut planet = Body::new(e.pos, mass, radius, color);
        if let Some(star) = sim.heaviest_static().cloned() {
            sim.compute_orbit_velocity(&mut planet, &star);
        }
        let id = sim.add_body(planet);
        info!("spawned planet {id:?} at {} (mass {mass:.0})", e.pos);
    }
}

fn step_simulation(mut sim: ResMut<Simulator>, settings: Res<SimSettings>, dt: Res<FrameDt>) {
    if !settings.running {
        return;
    }
    sim.g = settings.g;
    sim.step(settings.step_dt(dt.0));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_at(x: f32, y: f32, mass: f32, radius: f32) -> Body {
        Body::new(Vec2::new(x, y), mass, radius, Color::WHITE)
    }

    #[test]
    fn gravity_of_coincident_bodies_is_zero() {
        let sim = Simulator::new(100.0);
        let a = body_at(5.0, 5.0, 10.0, 1.0);
        let b = body_at(5.0, 5.0, 20.0, 1.0);
        assert_eq!(sim.compute_gravity(&a, &b), Vec2::ZERO);
    }

    #[test]
    fn gravity_uses_true_distance_beyond_floor() {
        let sim = Simulator::new(2.0);
        let a = body_at(0.0, 0.0, 3.0, 1.0);
        let b = body_at(0.0, 20.0, 5.0, 1.0);
        let f = sim.compute_gravity(&a, &b);
        assert!((f - Vec2::new(0.0, 2.0 * 15.0 / 400.0)).length() < 1e-6);
    }

    #[test]
    fn merge_with_anchor_stays_static_and_keeps_anchor_radius() {
        let star = Body::new_static(Vec2::ZERO, 1000.0, 50.0, Color::WHITE);
        let rock = body_at(10.0, 0.0, 10.0, 5.0).with_velocity(Vec2::new(0.0, 3.0));
        let merged = Simulator::handle_collision(&rock, &star);
        assert!(merged.is_static);
        assert_eq!(merged.radius, 50.0);
        assert_eq!(merged.mass, 1010.0);
        assert_eq!(merged.color, ANCHOR_COLOR);
        assert!(merged.trail.is_empty());
    }

    #[test]
    fn merge_of_free_bodies_sums_radii() {
        let a = body_at(0.0, 0.0, 1.0, 3.0);
        let b = body_at(4.0, 0.0, 3.0, 4.0);
        let merged = Simulator::handle_collision(&a, &b);
        assert!(!merged.is_static);
        assert_eq!(merged.radius, 7.0);
        assert_eq!(merged.pos, Vec2::new(3.0, 0.0));
        assert_eq!(merged.color, MERGE_COLOR);
    }

    #[test]
    fn merged_body_is_not_paired_again_in_same_step() {
        let mut sim = Simulator::new(0.0);
        let big = sim.add_body(body_at(0.0, 0.0, 100.0, 50.0));
        let small = sim.add_body(body_at(1.0, 0.0, 1.0, 2.0));
        // also inside `big`, but `big` is spent by the time this pair comes up
        let other = sim.add_body(body_at(2.0, 0.0, 1.0, 2.0));
        sim.step(0.1);

        assert_eq!(sim.len(), 2);
        assert!(!sim.contains(big));
        assert!(!sim.contains(small));
        assert!(sim.contains(other));
        assert_eq!(sim.merges(), 1);
        assert!((sim.total_mass() - 102.0).abs() < 1e-4);
    }

    #[test]
    fn solar_system_planets_orbit_the_star() {
        let settings = SimSettings::default();
        let sim = Simulator::solar_system(&settings);
        assert_eq!(sim.len(), 4);
        let star = sim.heaviest_static().cloned().unwrap();
        assert_eq!(star.pos, Vec2::new(500.0, 500.0));
        for planet in sim.bodies().filter(|b| !b.is_static) {
            let r = planet.pos - star.pos;
            assert!(r.dot(planet.vel).abs() < 1e-2);
            let expected = (settings.g * star.mass / r.length()).sqrt();
            assert!((planet.vel.length() - expected).abs() < 1e-3);
        }
    }

    #[test]
    fn orbit_velocity_for_planet_on_star_is_zero() {
        let sim = Simulator::new(100.0);
        let star = Body::new_static(Vec2::ZERO, 10.0, 1.0, Color::BLACK);
        let mut planet = body_at(0.0, 0.0, 1.0, 1.0).with_velocity(Vec2::ONE);
        sim.compute_orbit_velocity(&mut planet, &star);
        assert_eq!(planet.vel, Vec2::ZERO);
    }
}

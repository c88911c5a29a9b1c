use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy::render::camera::ClearColorConfig;
use bevy::render::view::RenderLayers;
use bevy::sprite::{MaterialMesh2dBundle, Mesh2dHandle};

use crate::body::TRAIL_WIDTH;
use crate::settings::SimSettings;
use crate::sim::{SimSet, Simulator};
use crate::surface::Surface;

pub struct RenderPlugin;
impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DiscPool>()
            .add_systems(Startup, (configure_gizmos, spawn_disc_camera))
            .add_systems(Update, draw_bodies.in_set(SimSet::Draw))
            .add_systems(PostUpdate, sync_discs);
    }
}

/// Gizmos (trails, rings) stay on the default layer; discs are drawn on their
/// own layer by a second camera so they cover the lines, as painted order wants.
pub const LINE_LAYER: usize = 0;
pub const DISC_LAYER: usize = 1;

#[derive(Component)]
pub struct DiscCamera;

#[derive(Clone, Copy, Debug)]
struct Disc {
    center: Vec2,
    radius: f32,
    color: Color,
}

/// Filled circles requested this frame, and the mesh entities that show them.
#[derive(Resource, Default)]
pub struct DiscPool {
    pending: Vec<Disc>,
    entities: Vec<(Entity, Handle<ColorMaterial>)>,
    mesh: Option<Mesh2dHandle>,
}

/// Bevy-backed drawing surface. Gizmos draw lines and rings, pooled meshes
/// draw filled discs.
#[derive(SystemParam)]
pub struct BevySurface<'w, 's> {
    gizmos: Gizmos<'w, 's>,
    pool: ResMut<'w, DiscPool>,
    clear: ResMut<'w, ClearColor>,
    settings: Res<'w, SimSettings>,
}

impl BevySurface<'_, '_> {
    /// Screen pixels (top-left origin, y down) to centred, y-up world space.
    fn to_world(&self, p: Vec2) -> Vec2 {
        to_world(&self.settings, p)
    }
}

pub fn to_world(settings: &SimSettings, p: Vec2) -> Vec2 {
    let c = settings.center();
    Vec2::new(p.x - c.x, c.y - p.y)
}

pub fn to_screen(settings: &SimSettings, p: Vec2) -> Vec2 {
    let c = settings.center();
    Vec2::new(p.x + c.x, c.y - p.y)
}

impl Surface for BevySurface<'_, '_> {
    fn clear(&mut self, color: Color) {
        self.clear.0 = color;
        self.pool.pending.clear();
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        let center = self.to_world(center);
        self.pool.pending.push(Disc {
            center,
            radius,
            color,
        });
    }

    fn circle_outline(&mut self, center: Vec2, radius: f32, color: Color, width: f32) {
        let center = self.to_world(center);
        // stroke grows inward from the outer edge
        let rings = width.max(1.0).round() as u32;
        for k in 0..rings {
            let r = radius - k as f32;
            if r > 0.0 {
                self.gizmos.circle_2d(center, r, color);
            }
        }
    }

    fn polyline<I>(&mut self, points: I, color: Color, _width: f32)
    where
        I: IntoIterator<Item = Vec2>,
    {
        let settings = &self.settings;
        let points = points.into_iter().map(|p| to_world(settings, p));
        self.gizmos.linestrip_2d(points, color);
    }

    fn present(&mut self) {}
}

fn configure_gizmos(mut store: ResMut<GizmoConfigStore>) {
    let (config, _) = store.config_mut::<DefaultGizmoConfigGroup>();
    config.line_width = TRAIL_WIDTH;
    config.render_layers = RenderLayers::layer(LINE_LAYER);
}

fn spawn_disc_camera(mut commands: Commands) {
    commands.spawn((
        Camera2dBundle {
            camera: Camera {
                order: 1,
                clear_color: ClearColorConfig::None,
                ..default()
            },
            ..default()
        },
        RenderLayers::layer(DISC_LAYER),
        DiscCamera,
    ));
}

fn draw_bodies(sim: Res<Simulator>, mut surface: BevySurface) {
    sim.draw(&mut surface);
}

fn sync_discs(
    mut commands: Commands,
    mut pool: ResMut<DiscPool>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    mut q: Query<(&mut Transform, &mut Visibility)>,
) {
    let mesh = pool
        .mesh
        .get_or_insert_with(|| Mesh2dHandle(meshes.add(Circle::new(1.0))))
        .clone();
    let DiscPool {
        pending, entities, ..
    } = &mut *pool;

    for (i, disc) in pending.iter().enumerate() {
        // later discs stack on top
        let transform = Transform::from_xyz(disc.center.x, disc.center.y, i as f32 * 0.01)
            .with_scale(Vec3::new(disc.radius, disc.radius, 1.0));

        if let Some((entity, material)) = entities.get(i) {
            if let Ok((mut t, mut v)) = q.get_mut(*entity) {
                *t = transform;
                *v = Visibility::Visible;
            }
            if let Some(m) = materials.get_mut(material) {
                m.color = disc.color;
            }
        } else {
            let material = materials.add(ColorMaterial::from(disc.color));
            let entity = commands
                .spawn((
                    MaterialMesh2dBundle {
                        mesh: mesh.clone(),
                        material: material.clone(),
                        transform,
                        ..default()
                    },
                    RenderLayers::layer(DISC_LAYER),
                ))
                .id();
            entities.push((entity, material));
        }
    }

    for (entity, _) in entities.iter().skip(pending.len()) {
        if let Ok((_, mut v)) = q.get_mut(*entity) {
            *v = Visibility::Hidden;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discs_render_after_lines() {
        let mut app = App::new();
        app.add_systems(Startup, spawn_disc_camera);
        app.update();

        let mut q = app
            .world_mut()
            .query_filtered::<(&Camera, &RenderLayers), With<DiscCamera>>();
        let (camera, layers) = q.single(app.world());
        assert!(camera.order > 0);
        assert!(matches!(camera.clear_color, ClearColorConfig::None));
        assert!(layers.intersects(&RenderLayers::layer(DISC_LAYER)));
        assert!(!layers.intersects(&RenderLayers::layer(LINE_LAYER)));
    }

    #[test]
    fn screen_and_world_coordinates_round_trip() {
        let settings = SimSettings::default();
        let top_left = to_world(&settings, Vec2::ZERO);
        assert_eq!(top_left, Vec2::new(-500.0, 500.0));
        assert_eq!(to_screen(&settings, top_left), Vec2::ZERO);
    }
}

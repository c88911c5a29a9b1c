use bevy::app::AppExit;
use bevy::input::mouse::MouseButtonInput;
use bevy::input::ButtonState; // needed in Bevy 0.14
use bevy::prelude::*;
use bevy::window::WindowCloseRequested;

use crate::render::to_screen;
use crate::settings::SimSettings;
use crate::sim::{ResetEvent, SimSet, SpawnPlanet};
use crate::MainCamera;

pub struct InputPlugin;
impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                quit_requested,
                click_spawn,
                pause_toggle,
                reset_trigger,
                help_toggle,
                diagnostics_toggle,
            )
                .in_set(SimSet::Input),
        );
    }
}

fn quit_requested(
    mut close_evr: EventReader<WindowCloseRequested>,
    keys: Res<ButtonInput<KeyCode>>,
    mut exit: EventWriter<AppExit>,
) {
    let closed = close_evr.read().count() > 0;
    if closed || keys.just_pressed(KeyCode::Escape) {
        info!("quit requested, shutting down");
        exit.send(AppExit::Success);
    }
}

fn click_spawn(
    windows: Query<&Window>,
    q_cam: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    mut mousebtn_evr: EventReader<MouseButtonInput>,
    mut ev_spawn: EventWriter<SpawnPlanet>,
    settings: Res<SimSettings>,
) {
    let Ok(win) = windows.get_single() else {
        return;
    };
    let Ok((cam, cam_transform)) = q_cam.get_single() else {
        return;
    };

    for ev in mousebtn_evr.read() {
        if ev.button != MouseButton::Left || ev.state != ButtonState::Pressed {
            continue;
        }
        let Some(cursor) = win.cursor_position() else {
            continue;
        };
        let Some(world) = cam.viewport_to_world_2d(cam_transform, cursor) else {
            continue;
        };
        ev_spawn.send(SpawnPlanet {
            pos: to_screen(&settings, world),
        });
    }
}

fn pause_toggle(mut settings: ResMut<SimSettings>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::Space) {
        settings.running = !settings.running;
        info!("simulation {}", if settings.running { "resumed" } else { "paused" });
    }
}

fn reset_trigger(mut ev_reset: EventWriter<ResetEvent>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::KeyR) {
        ev_reset.send(ResetEvent);
    }
}

fn help_toggle(mut settings: ResMut<SimSettings>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::KeyH) {
        settings.show_help = !settings.show_help;
    }
}

fn diagnostics_toggle(mut settings: ResMut<SimSettings>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::F3) {
        settings.show_diagnostics = !settings.show_diagnostics;
    }
}

use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::prelude::*;
use bevy::window::{ExitCondition, WindowResolution};
use space_sim::input::InputPlugin;
use space_sim::render::RenderPlugin;
use space_sim::sim::{SimPlugin, BACKGROUND};
use space_sim::ui::UiPlugin;
use space_sim::{MainCamera, SimSettings};

fn main() -> AppExit {
    let settings = SimSettings::default();

    App::new()
        .insert_resource(ClearColor(BACKGROUND))
        .insert_resource(Msaa::Sample4)
        .add_plugins(FrameTimeDiagnosticsPlugin)
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: settings.title.clone(),
                resolution: WindowResolution::new(settings.width as f32, settings.height as f32),
                resizable: false,
                ..default()
            }),
            exit_condition: ExitCondition::OnPrimaryClosed,
            close_when_requested: false,
        }))
        .insert_resource(settings)
        .add_plugins((SimPlugin, RenderPlugin, UiPlugin, InputPlugin))
        .add_systems(Startup, setup_camera)
        .run()
}

fn setup_camera(mut commands: Commands) {
    commands.spawn((Camera2dBundle::default(), MainCamera));
}

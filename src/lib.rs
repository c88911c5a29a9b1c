pub mod body;
pub mod input;
pub mod render;
pub mod settings;
pub mod sim;
pub mod surface;
pub mod ui;

use bevy::prelude::Component;

pub use body::{Body, Trail, TRAIL_CAPACITY};
pub use settings::{SettingsError, SimSettings, TimestepMode};
pub use sim::{BodyId, Simulator};
pub use surface::{run, FrameClock, Frontend, Surface};

#[derive(Component)]
pub struct MainCamera;

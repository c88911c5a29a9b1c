use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPlugin};

use crate::settings::{SimSettings, TimestepMode};
use crate::sim::{FrameDt, ResetEvent, Simulator};

pub struct UiPlugin;
impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin)
            .add_systems(Update, (ui_system, help_panel, diagnostics_panel));
    }
}

fn ui_system(
    mut contexts: EguiContexts,
    mut settings: ResMut<SimSettings>,
    sim: Res<Simulator>,
    diagnostics: Res<DiagnosticsStore>,
    mut ev_reset: EventWriter<ResetEvent>,
) {
    egui::Window::new("Settings").show(contexts.ctx_mut(), |ui| {
        ui.label(format!("Bodies: {}", sim.len()));
        ui.label(format!("Merges: {}", sim.merges()));
        ui.label(format!("Total mass: {:.1}", sim.total_mass()));
        if let Some(fps) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FPS) {
            if let Some(value) = fps.smoothed() {
                ui.label(format!("FPS: {:.1}", value));
            }
        }

        ui.separator();

        ui.checkbox(&mut settings.running, "Running");
        ui.add(egui::Slider::new(&mut settings.g, 0.0..=500.0).text("Gravity (G)"));
        ui.add(egui::Slider::new(&mut settings.time_scale, 0.1..=4.0).text("Sim Rate"));

        let mut fixed = matches!(settings.timestep, TimestepMode::Fixed(_));
        if ui.checkbox(&mut fixed, "Fixed timestep").changed() {
            settings.timestep = if fixed {
                TimestepMode::Fixed(1.0 / settings.target_fps as f32)
            } else {
                TimestepMode::Measured
            };
        }
        if let TimestepMode::Fixed(dt) = &mut settings.timestep {
            ui.add(egui::Slider::new(dt, 0.001..=0.05).text("dt"));
        }

        ui.separator();

        if ui.button("Reset").clicked() {
            ev_reset.send(ResetEvent);
        }
    });
}

fn help_panel(mut contexts: EguiContexts, settings: Res<SimSettings>) {
    if settings.show_help {
        egui::Window::new("Help").show(contexts.ctx_mut(), |ui| {
            ui.label("Space: Pause Simulation");
            ui.label("R: Reset Simulation");
            ui.label("H: Toggle Help");
            ui.label("F3: Toggle Diagnostics");
            ui.label("Left Mouse: Spawn Planet");
            ui.label("Esc: Quit");
        });
    }
}

fn diagnostics_panel(
    mut contexts: EguiContexts,
    settings: Res<SimSettings>,
    sim: Res<Simulator>,
    dt: Res<FrameDt>,
) {
    if settings.show_diagnostics {
        egui::Window::new("Diagnostics").show(contexts.ctx_mut(), |ui| {
            ui.label(format!("Frame dt: {:.4}s", dt.0));
            ui.label(format!("Step dt: {:.4}s", sim.dt));
            let p = sim.total_momentum();
            ui.label(format!("Momentum: ({:.1}, {:.1})", p.x, p.y));
        });
    }
}

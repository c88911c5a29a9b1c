use bevy::prelude::*;
use thiserror::Error;

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub enum TimestepMode {
    /// Feed the measured wall-clock frame time into integration.
    #[default]
    Measured,
    /// Advance by a constant dt every frame, for reproducible runs.
    Fixed(f32),
}

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("gravitational constant must be finite and non-negative, got {0}")]
    Gravity(f32),
    #[error("target frame rate must be at least 1")]
    FrameRate,
    #[error("window must have non-zero size, got {0}x{1}")]
    Window(u32, u32),
    #[error("fixed timestep must be finite and positive, got {0}")]
    FixedStep(f32),
    #[error("time scale must be finite and positive, got {0}")]
    TimeScale(f32),
}

#[derive(Resource, Clone, Debug)]
pub struct SimSettings {
    pub g: f32,
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub target_fps: u32,
    pub timestep: TimestepMode,
    pub time_scale: f32,
    pub running: bool,
    pub show_help: bool,
    pub show_diagnostics: bool,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            g: 100.0,
            width: 1000,
            height: 1000,
            title: "Space Simulation".into(),
            target_fps: 60,
            timestep: TimestepMode::Measured,
            time_scale: 1.0,
            running: true,
            show_help: true,
            show_diagnostics: false,
        }
    }
}

impl SimSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.g.is_finite() || self.g < 0.0 {
            return Err(SettingsError::Gravity(self.g));
        }
        if self.target_fps == 0 {
            return Err(SettingsError::FrameRate);
        }
        if self.width == 0 || self.height == 0 {
            return Err(SettingsError::Window(self.width, self.height));
        }
        if let TimestepMode::Fixed(dt) = self.timestep {
            if !dt.is_finite() || dt <= 0.0 {
                return Err(SettingsError::FixedStep(dt));
            }
        }
        if !self.time_scale.is_finite() || self.time_scale <= 0.0 {
            return Err(SettingsError::TimeScale(self.time_scale));
        }
        Ok(())
    }

    /// Resolve the dt handed to the physics step from a measured frame time.
    pub fn step_dt(&self, measured: f32) -> f32 {
        let base = match self.timestep {
            TimestepMode::Measured => measured,
            TimestepMode::Fixed(dt) => dt,
        };
        base * self.time_scale
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width as f32 / 2.0, self.height as f32 / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(SimSettings::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_values() {
        let mut s = SimSettings::default();
        s.g = f32::NAN;
        assert!(matches!(s.validate(), Err(SettingsError::Gravity(_))));

        let mut s = SimSettings::default();
        s.target_fps = 0;
        assert_eq!(s.validate(), Err(SettingsError::FrameRate));

        let mut s = SimSettings::default();
        s.timestep = TimestepMode::Fixed(0.0);
        assert_eq!(s.validate(), Err(SettingsError::FixedStep(0.0)));

        let mut s = SimSettings::default();
        s.height = 0;
        assert_eq!(s.validate(), Err(SettingsError::Window(1000, 0)));
    }

    #[test]
    fn step_dt_follows_mode() {
        let mut s = SimSettings::default();
        assert_eq!(s.step_dt(0.016), 0.016);
        s.timestep = TimestepMode::Fixed(0.01);
        s.time_scale = 2.0;
        assert_eq!(s.step_dt(0.5), 0.02);
    }
}

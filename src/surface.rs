//! The display/input collaborator the simulator draws into, plus the
//! cooperative frame loop that drives it.
//!
//! Coordinates handed to a [`Surface`] are simulation pixels: origin at the
//! top-left corner, y growing downwards.

use bevy::color::Color;
use bevy::log::info;
use bevy::math::Vec2;
use std::thread;
use std::time::{Duration, Instant};

use crate::settings::SimSettings;
use crate::sim::Simulator;

pub trait Surface {
    fn clear(&mut self, color: Color);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color);
    fn circle_outline(&mut self, center: Vec2, radius: f32, color: Color, width: f32);
    fn polyline<I>(&mut self, points: I, color: Color, width: f32)
    where
        I: IntoIterator<Item = Vec2>;
    fn present(&mut self);
}

/// A surface that also owns input polling and frame pacing.
pub trait Frontend: Surface {
    /// Block until the next frame is due and return seconds since the last call.
    fn tick(&mut self, rate: u32) -> f32;
    /// Drain pending input; true once a close request has been seen.
    fn poll_quit(&mut self) -> bool;
    fn close(&mut self);
}

/// Frame pacer: sleeps out the rest of the frame interval, reports elapsed time.
///
/// The clock starts on its first tick, so time spent before the loop begins
/// never shows up as a frame.
#[derive(Debug, Default)]
pub struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    pub fn tick(&mut self, rate: u32) -> f32 {
        let last = *self.last.get_or_insert_with(Instant::now);
        if rate > 0 {
            let interval = Duration::from_secs_f64(1.0 / rate as f64);
            let spent = last.elapsed();
            if spent < interval {
                thread::sleep(interval - spent);
            }
        }
        let now = Instant::now();
        self.last = Some(now);
        now.duration_since(last).as_secs_f32()
    }
}

/// Run frames until the frontend reports a quit, then close it.
///
/// The quit flag is only looked at between frames; a physics step in
/// progress always completes.
pub fn run<F: Frontend>(sim: &mut Simulator, frontend: &mut F, settings: &SimSettings) -> u64 {
    let mut running = true;
    let mut frames = 0;
    while running {
        let measured = frontend.tick(settings.target_fps);
        if frontend.poll_quit() {
            running = false;
        }
        sim.step(settings.step_dt(measured));
        sim.draw(frontend);
        frames += 1;
    }
    info!("frame loop stopped after {frames} frames");
    frontend.close();
    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_paces_to_rate() {
        let mut clock = FrameClock::default();
        let dt = clock.tick(100);
        assert!(dt >= 0.009, "tick returned too early: {dt}");
    }

    #[test]
    fn clock_returns_immediately_when_overrun() {
        let mut clock = FrameClock::default();
        clock.tick(100);
        thread::sleep(Duration::from_millis(30));
        let dt = clock.tick(100);
        assert!(dt >= 0.03);
        assert!(dt < 1.0);
    }

    #[test]
    fn first_tick_ignores_time_before_the_loop() {
        let mut clock = FrameClock::default();
        thread::sleep(Duration::from_millis(200));
        let dt = clock.tick(60);
        assert!(dt >= 1.0 / 60.0 - 0.001, "first tick too short: {dt}");
        assert!(dt < 0.1, "startup time leaked into first frame: {dt}");
    }
}

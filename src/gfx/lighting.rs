// src/gfx/lighting.rs
//! Directional sun light, the day/night cycle, and lamp light bounds
//!
//! The sun is the single shadow-casting directional light; lamp lights are a
//! bounded set of point lights sharing one color profile. `MAX_LIGHTS` is
//! mirrored by the lamp array length in scene.wgsl.

use std::f32::consts::TAU;

use cgmath::{InnerSpace, Vector3};

/// Maximum number of lamp lights reaching the shader in one frame
///
/// Submissions beyond this bound are dropped with a warning; see
/// [`crate::gfx::rendering::frame::FrameQueue::add_light`].
pub const MAX_LIGHTS: usize = 8;

/// Directional light description consumed by the color pass
#[derive(Debug, Clone, Copy)]
pub struct LightSource {
    /// Direction the light travels, unit length
    pub direction: Vector3<f32>,
    /// Cone half-angle in radians bounding the diffuse contribution
    pub max_angle: f32,
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
}

/// Shared color profile for all lamp lights
#[derive(Debug, Clone, Copy)]
pub struct LampProfile {
    pub color: [f32; 3],
    pub intensity: f32,
}

impl Default for LampProfile {
    fn default() -> Self {
        Self {
            color: [1.0, 0.85, 0.6],
            intensity: 6.0,
        }
    }
}

/// Drives the directional light through a day/night cycle
///
/// The sun orbits the scene in a tilted circle; its elevation determines the
/// daylight scalar used by both the color shader (lighting blend) and the
/// skybox shader (skin blend).
#[derive(Debug, Clone, Copy)]
pub struct Sun {
    /// Orbit angle in radians; 0 is sunrise at the horizon
    angle: f32,
    /// Seconds for one full day/night cycle
    cycle_length: f32,
    /// Distance of the sun position from the scene origin
    orbit_radius: f32,
}

const DAY_AMBIENT: [f32; 3] = [0.35, 0.35, 0.38];
const DAY_DIFFUSE: [f32; 3] = [1.0, 0.96, 0.88];
const SUNSET_AMBIENT: [f32; 3] = [0.22, 0.16, 0.14];
const SUNSET_DIFFUSE: [f32; 3] = [0.95, 0.55, 0.3];
const NIGHT_AMBIENT: [f32; 3] = [0.05, 0.06, 0.1];
const NIGHT_DIFFUSE: [f32; 3] = [0.12, 0.14, 0.25];

impl Sun {
    pub fn new(cycle_length: f32, orbit_radius: f32) -> Self {
        debug_assert!(cycle_length > 0.0 && orbit_radius > 0.0);
        Self {
            // Start mid-morning so the scene opens lit.
            angle: TAU / 8.0,
            cycle_length,
            orbit_radius,
        }
    }

    /// Advances the cycle by `dt` seconds
    pub fn advance(&mut self, dt: f32) {
        self.angle = (self.angle + TAU * dt / self.cycle_length).rem_euclid(TAU);
    }

    /// Sun elevation as the sine of the orbit angle, in [-1, 1]
    pub fn elevation(&self) -> f32 {
        self.angle.sin()
    }

    /// World position of the sun on its orbit
    pub fn position(&self) -> Vector3<f32> {
        Vector3::new(self.angle.cos(), self.angle.sin(), 0.25).normalize() * self.orbit_radius
    }

    /// Direction the sunlight travels, toward the scene origin
    pub fn direction(&self) -> Vector3<f32> {
        -self.position().normalize()
    }

    /// Day/night blend scalar in [0, 1]; 1 at full day, 0 at night
    pub fn daylight(&self) -> f32 {
        self.skin_weights()[0]
    }

    pub fn is_day(&self) -> bool {
        self.elevation() > 0.0
    }

    /// Skybox skin weights (day, sunset, night), always summing to 1
    pub fn skin_weights(&self) -> [f32; 3] {
        let e = self.elevation();
        let day = smoothstep(0.05, 0.35, e);
        let night = smoothstep(0.05, 0.35, -e);
        let sunset = (1.0 - day - night).max(0.0);
        [day, sunset, night]
    }

    /// Current directional light, blended across day, sunset and night colors
    pub fn light(&self) -> LightSource {
        let [day, sunset, night] = self.skin_weights();
        LightSource {
            direction: self.direction(),
            max_angle: TAU / 4.0,
            ambient: blend3(DAY_AMBIENT, SUNSET_AMBIENT, NIGHT_AMBIENT, day, sunset, night),
            diffuse: blend3(DAY_DIFFUSE, SUNSET_DIFFUSE, NIGHT_DIFFUSE, day, sunset, night),
        }
    }
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn blend3(a: [f32; 3], b: [f32; 3], c: [f32; 3], wa: f32, wb: f32, wc: f32) -> [f32; 3] {
    [
        a[0] * wa + b[0] * wb + c[0] * wc,
        a[1] * wa + b[1] * wb + c[1] * wc,
        a[2] * wa + b[2] * wb + c[2] * wc,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn skin_weights_sum_to_one_over_full_cycle() {
        let mut sun = Sun::new(60.0, 100.0);
        for _ in 0..240 {
            sun.advance(0.25);
            let [day, sunset, night] = sun.skin_weights();
            assert!(day >= 0.0 && sunset >= 0.0 && night >= 0.0);
            assert_relative_eq!(day + sunset + night, 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn daylight_stays_in_unit_range() {
        let mut sun = Sun::new(10.0, 100.0);
        for _ in 0..1000 {
            sun.advance(0.05);
            let d = sun.daylight();
            assert!((0.0..=1.0).contains(&d));
        }
    }

    #[test]
    fn noon_is_day_and_midnight_is_not() {
        let mut sun = Sun::new(TAU, 100.0);
        sun.advance(TAU / 4.0 - TAU / 8.0); // from the mid-morning start to noon
        assert!(sun.is_day());
        assert_relative_eq!(sun.daylight(), 1.0, epsilon = 1e-5);

        sun.advance(TAU / 2.0); // noon to midnight
        assert!(!sun.is_day());
        assert_relative_eq!(sun.daylight(), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn direction_points_from_position_to_origin() {
        let sun = Sun::new(60.0, 50.0);
        let expected = -sun.position().normalize();
        assert_relative_eq!(sun.direction(), expected, epsilon = 1e-6);
        assert_relative_eq!(sun.direction().magnitude(), 1.0, epsilon = 1e-5);
    }
}

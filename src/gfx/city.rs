// src/gfx/city.rs
//! Procedural city layout
//!
//! Lays buildings out on a street grid with a seeded RNG, so a given seed
//! always yields the same skyline. The generator only produces transforms;
//! every building is the same unit cube model stretched into place, which
//! keeps the whole city at one vertex/index buffer pair.

use cgmath::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::gfx::lighting::MAX_LIGHTS;
use crate::gfx::rendering::frame::FrameQueue;
use crate::gfx::scene::ModelData;

/// One building: translation and half-extent scale for a unit cube
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Building {
    pub position: Vector3<f32>,
    pub scale: Vector3<f32>,
}

/// A generated city layout: building transforms plus street lamp positions
#[derive(Debug, Clone, Default)]
pub struct City {
    pub buildings: Vec<Building>,
    pub lamps: Vec<Point3<f32>>,
}

impl City {
    /// Generates a city on a square grid of `cells_per_side`² blocks spaced
    /// `spacing` apart. Deterministic for a fixed seed. The center block is
    /// kept clear as the spawn area.
    pub fn generate(seed: u64, cells_per_side: u32, spacing: f32) -> Self {
        debug_assert!(spacing > 0.0, "spacing must be positive");

        let mut rng = StdRng::seed_from_u64(seed);
        let mut buildings = Vec::new();
        let mut lamps = Vec::new();

        let half = cells_per_side as i32 / 2;
        for gx in -half..=half {
            for gz in -half..=half {
                let center_x = gx as f32 * spacing;
                let center_z = gz as f32 * spacing;

                // Spawn area stays empty.
                if gx == 0 && gz == 0 {
                    continue;
                }

                // Street lamps on a sparser sub-grid, at block corners.
                if (gx + gz).rem_euclid(2) == 0 {
                    lamps.push(Point3::new(
                        center_x + spacing * 0.5,
                        3.0,
                        center_z + spacing * 0.5,
                    ));
                }

                if rng.random::<f32>() < 0.15 {
                    continue; // empty lot
                }

                let footprint = spacing * 0.5 * rng.random_range(0.5..0.85);
                let height = rng.random_range(2.0..12.0);
                buildings.push(Building {
                    // Unit cube spans -1..1, so y = scale.y rests it on the ground.
                    position: Vector3::new(center_x, height, center_z),
                    scale: Vector3::new(footprint, height, footprint),
                });
            }
        }

        log::info!(
            "generated city: {} buildings, {} lamps (seed {})",
            buildings.len(),
            lamps.len(),
            seed
        );

        Self { buildings, lamps }
    }

    /// Submits every building as a transformed instance of `model`
    pub fn draw<'scene>(&self, frame: &mut FrameQueue<'scene>, model: &'scene ModelData) {
        for building in &self.buildings {
            frame.draw_model_at(
                model,
                building.position,
                building.scale,
                Vector3::new(0.0, 0.0, 0.0),
            );
        }
    }

    /// Registers the street lamps closest to `viewpoint`, up to the shader's
    /// light capacity
    pub fn submit_lamps(&self, frame: &mut FrameQueue<'_>, viewpoint: Point3<f32>) {
        let mut by_distance: Vec<&Point3<f32>> = self.lamps.iter().collect();
        by_distance.sort_by(|a, b| {
            let da = distance2(**a, viewpoint);
            let db = distance2(**b, viewpoint);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        });
        for lamp in by_distance.into_iter().take(MAX_LIGHTS) {
            frame.add_light(*lamp);
        }
    }
}

fn distance2(a: Point3<f32>, b: Point3<f32>) -> f32 {
    let d = Vector3::new(a.x - b.x, a.y - b.y, a.z - b.z);
    d.x * d.x + d.y * d.y + d.z * d.z
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic() {
        let a = City::generate(42, 8, 10.0);
        let b = City::generate(42, 8, 10.0);
        assert_eq!(a.buildings, b.buildings);
        assert_eq!(a.lamps, b.lamps);
    }

    #[test]
    fn seeds_change_layout() {
        let a = City::generate(1, 8, 10.0);
        let b = City::generate(2, 8, 10.0);
        assert_ne!(a.buildings, b.buildings);
    }

    #[test]
    fn spawn_block_is_clear() {
        let city = City::generate(7, 8, 10.0);
        for building in &city.buildings {
            let clear = building.position.x.abs() > 1.0 || building.position.z.abs() > 1.0;
            assert!(clear, "building placed in spawn block: {building:?}");
        }
    }

    #[test]
    fn buildings_rest_on_ground() {
        let city = City::generate(3, 6, 10.0);
        for building in &city.buildings {
            assert!((building.position.y - building.scale.y).abs() < 1e-6);
        }
    }

    #[test]
    fn lamp_submission_respects_capacity() {
        let city = City::generate(5, 10, 10.0);
        assert!(city.lamps.len() > MAX_LIGHTS);
        let mut frame = FrameQueue::new();
        city.submit_lamps(&mut frame, Point3::new(0.0, 2.0, 0.0));
        assert_eq!(frame.lamps().len(), MAX_LIGHTS);
    }

    #[test]
    fn nearest_lamps_chosen_first() {
        let mut city = City::default();
        city.lamps.push(Point3::new(100.0, 3.0, 0.0));
        city.lamps.push(Point3::new(1.0, 3.0, 0.0));
        let mut frame = FrameQueue::new();
        city.submit_lamps(&mut frame, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(frame.lamps()[0].x, 1.0);
    }
}

//! Bounded particle field
//!
//! Two index-aligned buffers of positions and velocities. Each step adds the
//! velocity to the position and reflects any component that has left the
//! `[-bound, bound]` box while still moving outward, so a particle overshoots
//! by at most one step before heading back. The whole field also spins
//! slowly about Y for parallax.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::config::ParticleConfig;
use crate::foundation::math::{Mat4, Mat4Ext};
use crate::simulation::SimulationError;

/// Particle positions and velocities plus the field's spin
#[derive(Debug, Clone)]
pub struct ParticleField {
    positions: Vec<[f32; 3]>,
    velocities: Vec<[f32; 3]>,
    bound: f32,
    spin_rate: f32,
    rotation: f32,
}

impl ParticleField {
    /// Seed a field from configuration
    ///
    /// Uses the configured seed when present, entropy otherwise.
    pub fn new(config: &ParticleConfig) -> Self {
        match config.seed {
            Some(seed) => Self::from_seed(config, seed),
            None => Self::seeded_with(config, &mut StdRng::from_entropy()),
        }
    }

    /// Seed a field deterministically
    pub fn from_seed(config: &ParticleConfig, seed: u64) -> Self {
        Self::seeded_with(config, &mut StdRng::seed_from_u64(seed))
    }

    fn seeded_with(config: &ParticleConfig, rng: &mut StdRng) -> Self {
        let extent = config.spawn_extent.min(config.bound);
        let speed = config.max_speed;
        let mut sample = |range: f32| {
            if range > 0.0 {
                rng.gen_range(-range..=range)
            } else {
                0.0
            }
        };

        let mut positions = Vec::with_capacity(config.count);
        let mut velocities = Vec::with_capacity(config.count);
        for _ in 0..config.count {
            positions.push([sample(extent), sample(extent), sample(extent)]);
            velocities.push([sample(speed), sample(speed), sample(speed)]);
        }

        log::debug!(
            "Seeded {} particles within ±{extent} (bound {}, max speed {speed})",
            config.count,
            config.bound
        );
        Self {
            positions,
            velocities,
            bound: config.bound,
            spin_rate: config.field_spin,
            rotation: 0.0,
        }
    }

    /// Build a field from explicit buffers
    pub fn from_parts(
        positions: Vec<[f32; 3]>,
        velocities: Vec<[f32; 3]>,
        bound: f32,
        spin_rate: f32,
    ) -> Result<Self, SimulationError> {
        if positions.len() != velocities.len() {
            return Err(SimulationError::MisalignedBuffers {
                positions: positions.len(),
                velocities: velocities.len(),
            });
        }
        if !(bound.is_finite() && bound > 0.0) {
            return Err(SimulationError::InvalidBound(bound));
        }
        Ok(Self { positions, velocities, bound, spin_rate, rotation: 0.0 })
    }

    /// Advance every particle by one step of `scale` reference frames
    ///
    /// A velocity component is negated only while its position is past the
    /// bound and still heading outward. With `scale` above 1 a particle can
    /// land more than one reference step outside; it then keeps its inward
    /// velocity until it is back in range instead of flipping every frame.
    pub fn advance(&mut self, scale: f32) {
        let bound = self.bound;
        for (position, velocity) in self.positions.iter_mut().zip(self.velocities.iter_mut()) {
            for axis in 0..3 {
                position[axis] += velocity[axis] * scale;
                if position[axis].abs() > bound && position[axis] * velocity[axis] > 0.0 {
                    velocity[axis] = -velocity[axis];
                }
            }
        }
        self.rotation += self.spin_rate * scale;
    }

    /// Number of particles
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True when the field holds no particles
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Positions in field space
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    /// Velocities, index-aligned with [`positions`](Self::positions)
    pub fn velocities(&self) -> &[[f32; 3]] {
        &self.velocities
    }

    /// Reflection bound
    pub fn bound(&self) -> f32 {
        self.bound
    }

    /// Accumulated field rotation about Y
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Largest velocity component magnitude in the field
    pub fn max_step_speed(&self) -> f32 {
        self.velocities
            .iter()
            .flat_map(|v| v.iter())
            .fold(0.0_f32, |max, c| max.max(c.abs()))
    }

    /// Field-to-world matrix
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::rotation_y(self.rotation)
    }

    /// Raw position bytes for upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn config(count: usize) -> ParticleConfig {
        ParticleConfig { count, seed: Some(42), ..ParticleConfig::default() }
    }

    #[test]
    fn test_seeding_respects_bound_and_speed() {
        let field = ParticleField::new(&config(500));
        assert_eq!(field.len(), 500);
        assert_eq!(field.velocities().len(), 500);
        for p in field.positions() {
            assert!(p.iter().all(|c| c.abs() <= 12.0));
        }
        assert!(field.max_step_speed() <= 0.01);
    }

    #[test]
    fn test_same_seed_same_field() {
        let a = ParticleField::from_seed(&config(32), 9);
        let b = ParticleField::from_seed(&config(32), 9);
        assert_eq!(a.positions(), b.positions());
        assert_eq!(a.velocities(), b.velocities());
    }

    #[test]
    fn test_reflects_component_past_bound() {
        let mut field = ParticleField::from_parts(vec![[11.995, 0.0, 0.0]], vec![[0.01, 0.0, -0.01]], 12.0, 0.0).unwrap();
        field.advance(1.0);
        assert_relative_eq!(field.positions()[0][0], 12.005, epsilon = 1e-5);
        assert_relative_eq!(field.velocities()[0][0], -0.01);
        // Untouched axes keep their velocity
        assert_relative_eq!(field.velocities()[0][2], -0.01);

        field.advance(1.0);
        assert_relative_eq!(field.positions()[0][0], 11.995, epsilon = 1e-5);
        assert_relative_eq!(field.velocities()[0][0], -0.01);
    }

    #[test]
    fn test_outside_particle_moving_inward_is_not_flipped() {
        let mut field = ParticleField::from_parts(vec![[-12.5, 0.0, 0.0]], vec![[0.01, 0.0, 0.0]], 12.0, 0.0).unwrap();
        field.advance(1.0);
        assert_relative_eq!(field.velocities()[0][0], 0.01);
    }

    #[test]
    fn test_scaled_overshoot_returns_without_reflipping() {
        let mut field = ParticleField::from_parts(vec![[11.99, 0.0, 0.0]], vec![[0.01, 0.0, 0.0]], 12.0, 0.0).unwrap();
        field.advance(4.0);
        assert_relative_eq!(field.positions()[0][0], 12.03, epsilon = 1e-5);
        assert_relative_eq!(field.velocities()[0][0], -0.01);

        // Still outside after a single step back, heading in
        field.advance(1.0);
        assert_relative_eq!(field.positions()[0][0], 12.02, epsilon = 1e-5);
        assert_relative_eq!(field.velocities()[0][0], -0.01);

        field.advance(3.0);
        assert!(field.positions()[0][0] < 12.0);
        assert_relative_eq!(field.velocities()[0][0], -0.01);
    }

    #[test]
    fn test_positions_stay_within_bound_plus_one_step() {
        let mut field = ParticleField::new(&ParticleConfig { max_speed: 0.5, ..config(200) });
        let limit = field.bound() + field.max_step_speed();
        for _ in 0..2_000 {
            field.advance(1.0);
            for p in field.positions() {
                assert!(p.iter().all(|c| c.abs() <= limit + 1e-4));
            }
        }
    }

    #[test]
    fn test_field_spin_accumulates() {
        let mut field = ParticleField::new(&config(1));
        field.advance(1.0);
        field.advance(2.0);
        assert_relative_eq!(field.rotation(), 0.0018, epsilon = 1e-7);
    }

    #[test]
    fn test_from_parts_rejects_misaligned_buffers() {
        let result = ParticleField::from_parts(vec![[0.0; 3]; 2], vec![[0.0; 3]], 12.0, 0.0);
        assert_eq!(result.unwrap_err(), SimulationError::MisalignedBuffers { positions: 2, velocities: 1 });
        assert!(ParticleField::from_parts(vec![], vec![], 0.0, 0.0).is_err());
    }

    #[test]
    fn test_byte_view_covers_all_positions() {
        let field = ParticleField::new(&config(10));
        assert_eq!(field.as_bytes().len(), 10 * 3 * std::mem::size_of::<f32>());
    }
}

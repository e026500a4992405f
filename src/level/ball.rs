//! The rolling ball: tilt acceleration, quadratic drag and the visual roll

use glam::{Quat, Vec2, Vec3};

use crate::consts::*;

#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    /// World-space center; z is the floor height of the ball's cell
    pub position: Vec3,
    /// Position at the last redraw
    prev_position: Vec3,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    /// Accumulated roll for drawing
    pub total_rotated: Quat,
}

impl Ball {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            // Far enough from anywhere on the board to force the first redraw
            prev_position: Vec3::new(-10.0, 0.0, 0.0),
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            total_rotated: Quat::IDENTITY,
        }
    }

    /// Take a tilt sensor reading. The board is flat, so z is ignored.
    pub fn update_acceleration(&mut self, x: f32, y: f32, _z: f32) {
        self.acceleration = ACCELERATION_ADJUSTMENT * Vec2::new(-x, -y);
    }

    /// Drag opposing the velocity, proportional to speed squared
    pub fn drag_force(&self) -> Vec2 {
        if self.velocity.length() < LENGTH_TOO_SMALL_TO_NORMALIZE {
            return Vec2::ZERO;
        }
        -DRAG_CONSTANT * self.velocity.dot(self.velocity) * self.velocity.normalize()
    }

    /// Velocity after `time_diff` seconds of acceleration and drag.
    ///
    /// Drag that would reverse the ball within the step stops it instead, so
    /// only the acceleration is applied.
    pub fn updated_velocity(&self, time_diff: f32) -> Vec2 {
        let drag = self.drag_force();
        if self.velocity.length() < (drag * time_diff).length() {
            self.acceleration * time_diff
        } else {
            self.velocity + self.acceleration * time_diff + drag * time_diff
        }
    }

    /// Roll about the axis perpendicular to the velocity in the board plane
    pub fn update_rotation(&mut self, time_diff: f32) {
        let axis = Vec3::Z.cross(self.velocity.extend(0.0));
        if axis.length() > LENGTH_TOO_SMALL_TO_NORMALIZE {
            let angle = self.velocity.length() * time_diff * ROLL_SCALE_FACTOR;
            let q = Quat::from_axis_angle(axis.normalize(), angle);
            self.total_rotated = (q * self.total_rotated).normalize();
        }
    }

    /// Whether the ball moved far enough since the last redraw to need another.
    /// Resets the reference point when it did.
    pub fn drawing_necessary(&mut self, diagonal: f32) -> bool {
        let necessary = (self.position - self.prev_position).length() > diagonal / 200.0;
        if necessary {
            self.prev_position = self.position;
        }
        necessary
    }
}

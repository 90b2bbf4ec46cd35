//! Locomotion helpers shared by the chasing enemies.

use crate::components::*;

/// Step `pos` toward `target` by at most `speed * dt`, stopping
/// `stop_distance` short. Returns the unit direction to the target.
pub fn chase_step(
    pos: &mut Position,
    target: &Position,
    speed: f32,
    stop_distance: f32,
    dt: f32,
) -> (f32, f32) {
    let dir = pos.direction_to(target);
    let distance = pos.distance_to(target);
    if distance > stop_distance {
        let step = (speed * dt).min(distance - stop_distance);
        pos.x += dir.0 * step;
        pos.y += dir.1 * step;
    }
    dir
}

/// Move `pos` toward `target` by at most `max_step`, never overshooting.
/// Returns true once `pos` sits on the target.
pub fn move_towards(pos: &mut Position, target: &Position, max_step: f32) -> bool {
    let distance = pos.distance_to(target);
    if distance <= max_step || distance < 1.0e-6 {
        *pos = *target;
        return true;
    }
    let (dx, dy) = pos.direction_to(target);
    pos.x += dx * max_step;
    pos.y += dy * max_step;
    false
}

/// Flip the sprite to face the horizontal direction of travel.
pub fn face_horizontally(presentation: &mut Presentation, dx: f32) {
    if dx < 0.0 {
        presentation.mirrored = true;
    } else if dx > 0.0 {
        presentation.mirrored = false;
    }
}

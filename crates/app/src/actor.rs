//! Scene actors: plain data records with an explicit per-kind update
//! strategy instead of virtual dispatch.

use corelib::{Vec3, vec3};

use crate::assets::{MeshId, TextureId};

/// Axis-aligned box used for collision bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec3,
    pub size: Vec3,
}

/// What drives an actor each frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActorKind {
    /// Static scenery; integrates velocity only.
    Prop,
    /// The player: plays the death animation once health runs out.
    Player,
}

/// One drawable object in the scene.
#[derive(Clone, Copy, Debug)]
pub struct Actor {
    pub kind: ActorKind,
    pub mesh: MeshId,
    pub texture: TextureId,

    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,

    pub velocity: Vec3,
    pub health: i32,
    pub col_local: Rect,
    pub col_world: Rect,
}

impl Actor {
    pub fn new(
        kind: ActorKind,
        mesh: MeshId,
        texture: TextureId,
        health: i32,
        position: Vec3,
        rotation: Vec3,
        scale: Vec3,
    ) -> Self {
        Self {
            kind,
            mesh,
            texture,
            position,
            rotation,
            scale,
            velocity: Vec3::ZERO,
            health,
            col_local: Rect::default(),
            col_world: Rect::default(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Advance one frame: kind-specific behavior, then velocity
    /// integration and the world-space collision rect.
    pub fn update(&mut self, dt: f32) {
        match self.kind {
            ActorKind::Player => update_player(self, dt),
            ActorKind::Prop => {}
        }
        self.position += self.velocity * dt;
        self.col_world = Rect {
            origin: self.col_local.origin + self.position,
            size: self.col_local.size,
        };
    }
}

/// Dead players pitch forward until they lie flat.
fn update_player(actor: &mut Actor, dt: f32) {
    if actor.health <= 0 {
        actor.rotation.x -= 45f32.to_radians() * dt;
        if actor.rotation.x < (-90f32).to_radians() {
            actor.rotation.x = (-90f32).to_radians();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Actor {
        Actor::new(
            ActorKind::Player,
            MeshId::Player,
            TextureId::Player,
            10,
            vec3(2.0, -3.0, 0.0),
            Vec3::ZERO,
            Vec3::ONE,
        )
    }

    #[test]
    fn velocity_integrates_over_time() {
        let mut actor = player();
        actor.velocity = vec3(0.0, 0.0, -10.0);
        actor.update(0.5);
        assert_eq!(actor.position, vec3(2.0, -3.0, -5.0));
    }

    #[test]
    fn world_rect_follows_position_absolutely() {
        let mut actor = player();
        actor.col_local = Rect {
            origin: vec3(-0.5, 0.0, -0.5),
            size: vec3(1.0, 1.7, 1.0),
        };
        actor.update(0.1);
        actor.update(0.1);
        // Repeated updates must not accumulate the local offset.
        assert_eq!(actor.col_world.origin, actor.col_local.origin + actor.position);
        assert_eq!(actor.col_world.size, actor.col_local.size);
    }

    #[test]
    fn dead_player_pitches_down_to_flat() {
        let mut actor = player();
        actor.health = 0;
        for _ in 0..240 {
            actor.update(1.0 / 60.0);
        }
        assert!((actor.rotation.x - (-90f32).to_radians()).abs() < 1e-6);
    }

    #[test]
    fn living_player_keeps_its_pitch() {
        let mut actor = player();
        actor.update(1.0);
        assert_eq!(actor.rotation.x, 0.0);
        assert!(actor.is_alive());
    }
}

//! The game scene: loads assets at startup, then updates and renders the
//! player and the environment every frame.

use anyhow::{Context, Result};
use glam::Mat4;

use asset::tga::{TextureData, load_tga};
use corelib::camera::Camera;
use corelib::lights::LightList;
use corelib::{Vec3, vec3};
use platform::{App, InputState, KeyCode};
use renderer::{FrameCtx, Gpu, GpuTexture, MeshRegistry, SCENE_SHADER, ShaderProgram, compile_shader};

use crate::actor::{Actor, ActorKind, Rect};
use crate::assets::{MeshId, TextureId};

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.3,
    b: 0.5,
    a: 1.0,
};

const MOVE_SPEED: f32 = 10.0;
const TURN_SPEED: f32 = 1.8;
const FALLBACK_TEXTURE_SIZE: u32 = 64;

pub struct GameScene {
    registry: MeshRegistry,
    program: ShaderProgram,
    textures: Vec<GpuTexture>,
    lights: LightList,
    player: Actor,
}

impl GameScene {
    pub fn new() -> Self {
        let mut player = Actor::new(
            ActorKind::Player,
            MeshId::Player,
            TextureId::Player,
            10,
            vec3(2.0, -3.0, 0.0),
            Vec3::ZERO,
            Vec3::ONE,
        );
        player.col_local = Rect {
            origin: vec3(-0.5, 0.0, -0.5),
            size: vec3(1.0, 1.7, 1.0),
        };

        Self {
            registry: MeshRegistry::new(),
            program: ShaderProgram::new(),
            textures: Vec::new(),
            lights: scene_lights(),
            player,
        }
    }

    /// Turn with A/D, move along world Z with W/S.
    fn steer(&mut self, input: &InputState, dt: f32) {
        if input.is_pressed(KeyCode::KeyA) {
            self.player.rotation.y += TURN_SPEED * dt;
        } else if input.is_pressed(KeyCode::KeyD) {
            self.player.rotation.y -= TURN_SPEED * dt;
        }

        let mut velocity = Vec3::ZERO;
        if input.is_pressed(KeyCode::KeyW) {
            velocity.z = -1.0;
        } else if input.is_pressed(KeyCode::KeyS) {
            velocity.z = 1.0;
        }
        if velocity != Vec3::ZERO {
            velocity = velocity.normalize();
        }
        self.player.velocity = velocity * MOVE_SPEED;
    }

}

impl Default for GameScene {
    fn default() -> Self {
        Self::new()
    }
}

impl App for GameScene {
    fn init(&mut self, gpu: &Gpu) -> Result<()> {
        self.registry
            .allocate(gpu.device(), &MeshId::load_paths())
            .context("mesh registry allocation failed")?;

        let compiled = compile_shader(SCENE_SHADER).context("scene shader failed to build")?;
        self.program.reset(gpu, Some(compiled));

        for id in TextureId::ALL {
            let data = load_tga(id.asset_path()).unwrap_or_else(|err| {
                log::warn!("{err:#}; using checkerboard");
                TextureData::checkerboard(FALLBACK_TEXTURE_SIZE)
            });
            self.textures.push(GpuTexture::upload(gpu, &data)?);
        }

        Ok(())
    }

    fn frame(&mut self, gpu: &Gpu, ctx: &mut FrameCtx, input: &InputState, dt: f32) -> Result<()> {
        self.steer(input, dt);
        self.player.update(dt);

        let camera = follow_camera(&self.player, gpu.aspect_ratio());

        let mut rpass = ctx.clear_pass(gpu, CLEAR_COLOR);
        self.program.begin_frame();
        self.program.use_in(&mut rpass);
        self.registry.bind(&mut rpass);
        self.program.set_view_projection(camera.view_projection());
        self.program.set_light_list(self.lights);

        // Player
        self.program
            .bind_texture(gpu, &mut rpass, &self.textures[TextureId::Player.slot()]);
        self.program.draw(
            gpu,
            &mut rpass,
            self.registry.get(self.player.mesh.slot()),
            self.player.position,
            self.player.rotation,
            self.player.scale,
        );

        // Ground
        self.program
            .bind_texture(gpu, &mut rpass, &self.textures[TextureId::Ground.slot()]);
        self.program.draw(
            gpu,
            &mut rpass,
            self.registry.get(MeshId::Ground.slot()),
            vec3(0.0, -3.0, 0.0),
            Vec3::ZERO,
            Vec3::ONE,
        );

        // Walls along the Z edges
        self.program
            .bind_texture(gpu, &mut rpass, &self.textures[TextureId::WallWide.slot()]);
        for (x, z) in [(-10.0, -20.0), (10.0, -20.0), (-10.0, 20.0), (10.0, 20.0)] {
            self.program.draw(
                gpu,
                &mut rpass,
                self.registry.get(MeshId::WallWide.slot()),
                vec3(x, -5.5, z),
                Vec3::ZERO,
                Vec3::ONE,
            );
        }

        // Walls along the X edges
        self.program
            .bind_texture(gpu, &mut rpass, &self.textures[TextureId::WallTall.slot()]);
        for (x, z) in [(19.0, -10.0), (19.0, 10.0), (-19.0, -10.0), (-19.0, 10.0)] {
            self.program.draw(
                gpu,
                &mut rpass,
                self.registry.get(MeshId::WallTall.slot()),
                vec3(x, -3.9, z),
                Vec3::ZERO,
                Vec3::ONE,
            );
        }

        drop(rpass);
        Ok(())
    }
}

fn scene_lights() -> LightList {
    let mut lights = LightList::dark();
    lights.ambient.color = vec3(0.05, 0.1, 0.1) * 14.0;
    lights.directional.direction = vec3(-5.0, -50.0, -15.0).normalize();
    lights.directional.color = Vec3::ONE;
    lights
}

/// Camera above the player, looking where the player is facing.
fn follow_camera(player: &Actor, aspect: f32) -> Camera {
    let eye = player.position + vec3(0.0, 2.0, 0.0);
    let view_vector =
        Mat4::from_rotation_y(player.rotation.y).transform_point3(vec3(0.0, 2.0, -2.0));
    Camera::new_perspective(
        eye,
        player.position + view_vector,
        Vec3::Y,
        45f32.to_radians(),
        0.1,
        500.0,
        aspect,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::{ElementState, PhysicalKey};

    fn press(input: &mut InputState, code: KeyCode) {
        input.handle_key(PhysicalKey::Code(code), ElementState::Pressed);
    }

    #[test]
    fn forward_key_moves_along_negative_z() {
        let mut scene = GameScene::new();
        let mut input = InputState::new();
        press(&mut input, KeyCode::KeyW);
        scene.steer(&input, 1.0 / 60.0);
        assert_eq!(scene.player.velocity, vec3(0.0, 0.0, -MOVE_SPEED));
    }

    #[test]
    fn releasing_keys_stops_the_player() {
        let mut scene = GameScene::new();
        let mut input = InputState::new();
        press(&mut input, KeyCode::KeyS);
        scene.steer(&input, 0.1);
        assert!(scene.player.velocity.z > 0.0);

        input.handle_key(PhysicalKey::Code(KeyCode::KeyS), ElementState::Released);
        scene.steer(&input, 0.1);
        assert_eq!(scene.player.velocity, Vec3::ZERO);
    }

    #[test]
    fn turn_keys_adjust_yaw() {
        let mut scene = GameScene::new();
        let mut input = InputState::new();
        press(&mut input, KeyCode::KeyA);
        scene.steer(&input, 0.5);
        assert!((scene.player.rotation.y - TURN_SPEED * 0.5).abs() < 1e-6);
    }

    #[test]
    fn camera_follows_the_player_from_above() {
        let mut player = GameScene::new().player;
        player.position = vec3(4.0, -3.0, 8.0);
        let camera = follow_camera(&player, 16.0 / 9.0);
        assert_eq!(camera.eye, vec3(4.0, -1.0, 8.0));
        // Facing -Z by default: the look target sits in front of the player.
        assert!(camera.target.z < player.position.z + 2.0);
    }

    #[test]
    fn lights_match_the_scene_setup() {
        let lights = scene_lights();
        assert!((lights.directional.direction.length() - 1.0).abs() < 1e-6);
        assert!(lights.directional.direction.y < 0.0);
        assert_eq!(lights.directional.color, Vec3::ONE);
    }
}

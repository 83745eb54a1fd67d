use crate::Vec3;

/// Ambient term applied uniformly to every fragment.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AmbientLight {
    pub color: Vec3,
}

/// Directional light authored in world space; `direction` is normalized.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub color: Vec3,
}

/// The full light setup for one batch of draws. Plain value; the scene sets
/// it, the shader program copies it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LightList {
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
}

impl LightList {
    /// All lights off (black colors).
    pub fn dark() -> Self {
        Self::default()
    }
}

//! Named asset identities. Mesh ids are resolved to registry slots once at
//! load time; the load order below is the single source of truth.

/// Every mesh the scene loads, in registry load order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeshId {
    Ground,
    Player,
    Plane,
    WallWide,
    WallTall,
}

impl MeshId {
    pub const LOAD_ORDER: [MeshId; 5] = [
        MeshId::Ground,
        MeshId::Player,
        MeshId::Plane,
        MeshId::WallWide,
        MeshId::WallTall,
    ];

    pub fn asset_path(self) -> &'static str {
        match self {
            MeshId::Ground => "assets/ground.obj",
            MeshId::Player => "assets/human.obj",
            MeshId::Plane => "assets/plane.obj",
            MeshId::WallWide => "assets/wall_wide.obj",
            MeshId::WallTall => "assets/wall_tall.obj",
        }
    }

    /// Registry slot: position in [`Self::LOAD_ORDER`].
    #[inline]
    pub fn slot(self) -> usize {
        self as usize
    }

    pub fn load_paths() -> [&'static str; 5] {
        Self::LOAD_ORDER.map(MeshId::asset_path)
    }
}

/// Every texture the scene uploads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureId {
    Ground,
    Player,
    WallWide,
    WallTall,
}

impl TextureId {
    pub const ALL: [TextureId; 4] = [
        TextureId::Ground,
        TextureId::Player,
        TextureId::WallWide,
        TextureId::WallTall,
    ];

    pub fn asset_path(self) -> &'static str {
        match self {
            TextureId::Ground => "assets/ground.tga",
            TextureId::Player => "assets/human.tga",
            TextureId::WallWide => "assets/wall_wide.tga",
            TextureId::WallTall => "assets/wall_tall.tga",
        }
    }

    #[inline]
    pub fn slot(self) -> usize {
        self as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_match_load_order() {
        for (i, id) in MeshId::LOAD_ORDER.iter().enumerate() {
            assert_eq!(id.slot(), i);
        }
        for (i, id) in TextureId::ALL.iter().enumerate() {
            assert_eq!(id.slot(), i);
        }
    }
}

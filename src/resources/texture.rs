use uuid::Uuid;
use wgpu::TextureFormat;

/// How an environment image maps onto the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentKind {
    /// LDR equirectangular panorama (jpg, png, webp).
    Equirectangular,
    /// Wide dynamic range equirectangular panorama (hdr, exr).
    HighDynamicRange,
}

/// Decoded pixel data plus the format the backend should upload it as.
#[derive(Debug, Clone)]
pub struct Texture {
    pub uuid: Uuid,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub data: Vec<u8>,
}

impl Texture {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        width: u32,
        height: u32,
        format: TextureFormat,
        data: Vec<u8>,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            width,
            height,
            format,
            data,
        }
    }
}

/// Background environment map and whether it is currently shown.
#[derive(Debug, Clone)]
pub struct Environment {
    pub kind: EnvironmentKind,
    pub texture: Texture,
    pub enabled: bool,
}

impl Environment {
    #[must_use]
    pub fn new(kind: EnvironmentKind, texture: Texture) -> Self {
        Self {
            kind,
            texture,
            enabled: true,
        }
    }
}

#[cfg(feature = "gltf")]
pub mod gltf;
pub mod image;
pub mod ply;

#[cfg(feature = "gltf")]
pub use self::gltf::GltfDecoder;
pub use self::image::ImageTextureDecoder;
pub use ply::PlyDecoder;

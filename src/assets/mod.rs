pub mod decoders;
pub mod io;
pub mod kind;
pub mod loader;
pub mod loaders;

pub use decoders::{
    ColorDepth, DecodedAsset, DecodedMesh, DecodedNode, DecodedPointCloud, MeshDecoder, PointCloudDecoder,
    TextureDecoder,
};
pub use io::{AssetReader, FileAssetReader};
pub use kind::{AssetKind, display_name};
pub use loader::{AssetLoader, DecodeResult, LoadBatch, LoadReport};
#[cfg(feature = "gltf")]
pub use loaders::GltfDecoder;
pub use loaders::{ImageTextureDecoder, PlyDecoder};

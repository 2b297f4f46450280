//! glTF / GLB mesh-container decoder.
//!
//! Flattens the default scene into a [`DecodedMesh`] node forest. Each
//! primitive becomes one [`Mesh`] with a [`MeshMaterial`] carrying the base
//! color factor and, when present, the base color texture. Node transforms
//! are kept as authored; the loader places the container at the origin.

use futures::future::BoxFuture;
use glam::{Quat, Vec3, Vec4};

use crate::assets::decoders::{DecodedMesh, DecodedNode, MeshDecoder};
use crate::assets::io::{AssetReader, FileAssetReader, parent_uri};
use crate::assets::loaders::image::decode_color_map;
use crate::errors::{MirageError, Result};
use crate::resources::geometry::Geometry;
use crate::resources::material::{Material, MeshMaterial};
use crate::resources::mesh::Mesh;
use crate::resources::texture::Texture;

/// Built-in [`MeshDecoder`] for `.gltf` and `.glb` files.
#[derive(Debug, Clone, Default)]
pub struct GltfDecoder<R = FileAssetReader> {
    reader: R,
}

impl<R: AssetReader> GltfDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    async fn load_buffers(&self, gltf: &gltf::Gltf, base: &str) -> Result<Vec<Vec<u8>>> {
        let mut buffers = Vec::with_capacity(gltf.buffers().len());
        for buffer in gltf.buffers() {
            let data = match buffer.source() {
                gltf::buffer::Source::Bin => gltf
                    .blob
                    .clone()
                    .ok_or_else(|| MirageError::GltfError("GLB binary chunk missing".into()))?,
                gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => {
                    gltf::buffer::Data::from_source(buffer.source(), None)?.0
                }
                gltf::buffer::Source::Uri(uri) => {
                    self.reader.read_bytes(&format!("{base}{uri}")).await?
                }
            };
            buffers.push(data);
        }
        Ok(buffers)
    }

    /// Raw (still encoded) bytes of every image, indexed like `gltf.images()`.
    async fn load_image_bytes(&self, gltf: &gltf::Gltf, buffers: &[Vec<u8>], base: &str) -> Result<Vec<(String, Vec<u8>)>> {
        let mut images = Vec::with_capacity(gltf.images().len());
        for image in gltf.images() {
            let label = image
                .name()
                .map_or_else(|| format!("image_{}", image.index()), str::to_string);
            let bytes = match image.source() {
                gltf::image::Source::View { view, .. } => {
                    let buffer = buffers
                        .get(view.buffer().index())
                        .ok_or_else(|| MirageError::GltfError("image view references a missing buffer".into()))?;
                    buffer
                        .get(view.offset()..view.offset() + view.length())
                        .ok_or_else(|| MirageError::GltfError("image view out of range".into()))?
                        .to_vec()
                }
                gltf::image::Source::Uri { uri, .. } if uri.starts_with("data:") => {
                    return Err(MirageError::GltfError(format!(
                        "embedded image URIs are not supported ({label})"
                    )));
                }
                gltf::image::Source::Uri { uri, .. } => {
                    self.reader.read_bytes(&format!("{base}{uri}")).await?
                }
            };
            images.push((label, bytes));
        }
        Ok(images)
    }
}

async fn decode_textures(images: Vec<(String, Vec<u8>)>) -> Result<Vec<Texture>> {
    let decode_all = move || {
        images
            .iter()
            .map(|(label, bytes)| decode_color_map(bytes, label))
            .collect::<Result<Vec<_>>>()
    };
    #[cfg(not(target_arch = "wasm32"))]
    {
        tokio::task::spawn_blocking(decode_all).await?
    }
    #[cfg(target_arch = "wasm32")]
    {
        decode_all()
    }
}

impl<R: AssetReader> MeshDecoder for GltfDecoder<R> {
    fn decode<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<DecodedMesh>> {
        Box::pin(async move {
            let bytes = self.reader.read_bytes(path).await?;
            let gltf = gltf::Gltf::from_slice(&bytes)?;
            let base = parent_uri(path);
            let buffers = self.load_buffers(&gltf, base).await?;
            let images = self.load_image_bytes(&gltf, &buffers, base).await?;
            let textures = decode_textures(images).await?;
            build_decoded_mesh(&gltf.document, &buffers, &textures)
        })
    }
}

/// Converts a parsed document plus its resolved buffers and textures.
pub fn build_decoded_mesh(document: &gltf::Document, buffers: &[Vec<u8>], textures: &[Texture]) -> Result<DecodedMesh> {
    let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) else {
        return Ok(DecodedMesh::default());
    };
    let roots = scene
        .nodes()
        .map(|node| convert_node(&node, buffers, textures))
        .collect::<Result<Vec<_>>>()?;
    Ok(DecodedMesh { roots })
}

fn convert_node(node: &gltf::Node, buffers: &[Vec<u8>], textures: &[Texture]) -> Result<DecodedNode> {
    let name = node
        .name()
        .map_or_else(|| format!("node_{}", node.index()), str::to_string);
    let (translation, rotation, scale) = node.transform().decomposed();
    let mut decoded = DecodedNode::new(name.clone());
    decoded.translation = Vec3::from_array(translation);
    decoded.rotation = Quat::from_array(rotation);
    decoded.scale = Vec3::from_array(scale);

    if let Some(mesh) = node.mesh() {
        let mut meshes = mesh
            .primitives()
            .map(|primitive| convert_primitive(&name, &primitive, buffers, textures))
            .collect::<Result<Vec<_>>>()?;
        if meshes.len() == 1 {
            decoded.mesh = meshes.pop();
        } else {
            for (i, mesh) in meshes.into_iter().enumerate() {
                decoded
                    .children
                    .push(DecodedNode::new(format!("{name}_primitive_{i}")).with_mesh(mesh));
            }
        }
    }

    for child in node.children() {
        decoded.children.push(convert_node(&child, buffers, textures)?);
    }
    Ok(decoded)
}

fn convert_primitive(
    node_name: &str,
    primitive: &gltf::Primitive,
    buffers: &[Vec<u8>],
    textures: &[Texture],
) -> Result<Mesh> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or_else(|| MirageError::GltfError(format!("primitive of '{node_name}' has no positions")))?
        .collect();
    let mut geometry = Geometry::new(node_name, positions);
    geometry.normals = reader.read_normals().map(Iterator::collect);
    geometry.colors = reader.read_colors(0).map(|c| c.into_rgb_f32().collect());
    geometry.indices = reader.read_indices().map(|i| i.into_u32().collect());
    geometry.compute_bounding_box();

    let gltf_material = primitive.material();
    let pbr = gltf_material.pbr_metallic_roughness();
    let mut material = MeshMaterial::new(
        gltf_material.name().unwrap_or("material"),
        Vec4::from_array(pbr.base_color_factor()),
    );
    if let Some(info) = pbr.base_color_texture()
        && let Some(texture) = textures.get(info.texture().source().index())
    {
        material.maps.push(texture.clone());
    }

    Ok(Mesh::new(geometry, Material::Mesh(material)))
}

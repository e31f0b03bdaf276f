use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use gltf::accessor::DataType;

use crate::accessor::{self, AccessorLayout, ComponentType, Encoding, IndexType, SparseLayout, ViewLayout};
use crate::animation::clip::{AnimationClip, Track, TrackData};
use crate::animation::tracks::{InterpolationMode, KeyframeTrack};
use crate::animation::values::MorphWeights;
use crate::errors::{AnimatorError, Result, ResultExt};
use crate::model::Model;
use crate::scene::mesh::{Mesh, Primitive};
use crate::scene::skeleton::Skeleton;
use crate::scene::{MeshKey, Node, NodeHandle, Scene, SkeletonKey};
use crate::settings::LoadSettings;

/// Builds a [`Model`] from a glTF 2.0 document (`.gltf` or `.glb`).
///
/// Loading is all-or-nothing: any structural problem (missing positions,
/// undecodable accessors, cyclic hierarchy, malformed tracks) fails the
/// whole load with an error naming the item that broke.
pub struct GltfLoader {
    scene: Scene,
    settings: LoadSettings,
    // glTF node index -> NodeHandle
    node_mapping: Vec<NodeHandle>,
    // glTF mesh index -> MeshKey
    mesh_mapping: Vec<MeshKey>,
    // glTF skin index -> SkeletonKey
    skin_mapping: Vec<SkeletonKey>,
}

impl GltfLoader {
    /// Loads the file at `path` with default settings.
    pub fn load(path: &Path) -> Result<Model> {
        Self::load_with_settings(path, LoadSettings::default())
    }

    pub fn load_with_settings(path: &Path, settings: LoadSettings) -> Result<Model> {
        let bytes = fs::read(path)
            .map_err(AnimatorError::from)
            .with_context(|| format!("reading {}", path.display()))?;
        let base_path = path.parent().unwrap_or(Path::new("./")).to_path_buf();
        Self::load_from_slice(&bytes, Some(&base_path), settings)
            .with_context(|| format!("loading {}", path.display()))
    }

    /// Loads a document held in memory. External buffer URIs are resolved
    /// against `base_path`; without one, only GLB and `data:` buffers work.
    pub fn load_from_slice(
        bytes: &[u8],
        base_path: Option<&Path>,
        settings: LoadSettings,
    ) -> Result<Model> {
        let gltf = gltf::Gltf::from_slice(bytes)?;
        let buffers = Self::load_buffers(&gltf, base_path)?;

        let mut loader = Self {
            scene: Scene::new(),
            settings,
            node_mapping: Vec::with_capacity(gltf.nodes().count()),
            mesh_mapping: Vec::with_capacity(gltf.meshes().count()),
            skin_mapping: Vec::with_capacity(gltf.skins().count()),
        };

        // Step 1: create every node with its static TRS
        for node in gltf.nodes() {
            let handle = loader.create_node_shallow(&node);
            loader.node_mapping.push(handle);
        }

        // Step 2: wire the hierarchy; children may precede their parents
        loader.link_hierarchy(&gltf)?;
        loader.collect_roots(&gltf)?;

        // Step 3: meshes and skins, now that every node exists
        for mesh in gltf.meshes() {
            let engine_mesh = Self::load_mesh(&mesh, &buffers)
                .with_context(|| format!("mesh {} '{}'", mesh.index(), mesh.name().unwrap_or("")))?;
            let key = loader.scene.add_mesh(engine_mesh);
            loader.mesh_mapping.push(key);
        }
        for skin in gltf.skins() {
            let key = loader
                .load_skin(&skin, &buffers)
                .with_context(|| format!("skin {} '{}'", skin.index(), skin.name().unwrap_or("")))?;
            loader.skin_mapping.push(key);
        }

        // Step 4: attach meshes and skins to nodes
        for node in gltf.nodes() {
            loader
                .bind_node_mesh_and_skin(&node)
                .with_context(|| format!("node {} '{}'", node.index(), node.name().unwrap_or("")))?;
        }

        // Step 5: animation clips
        let clips = loader.load_animations(&gltf, &buffers)?;

        log::info!(
            "Loaded glTF: {} nodes ({} roots), {} meshes, {} skins, {} clips",
            loader.scene.nodes.len(),
            loader.scene.root_nodes.len(),
            loader.scene.meshes.len(),
            loader.scene.skins.len(),
            clips.len()
        );

        Model::new(loader.scene, clips, loader.settings)
    }

    // --- Helpers ---

    fn load_buffers(gltf: &gltf::Gltf, base_path: Option<&Path>) -> Result<Vec<Vec<u8>>> {
        let mut buffer_data = Vec::with_capacity(gltf.buffers().count());
        for buffer in gltf.buffers() {
            let mut data = match buffer.source() {
                gltf::buffer::Source::Bin => gltf
                    .blob
                    .as_deref()
                    .map(<[u8]>::to_vec)
                    .ok_or_else(|| AnimatorError::GltfError("Missing GLB binary chunk".to_string()))?,
                gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => decode_data_uri(uri)?,
                gltf::buffer::Source::Uri(uri) => {
                    let Some(base) = base_path else {
                        return Err(AnimatorError::GltfError(format!(
                            "buffer '{uri}' is external but no base path was given"
                        )));
                    };
                    let buffer_path: PathBuf = base.join(uri);
                    fs::read(&buffer_path)
                        .map_err(AnimatorError::from)
                        .with_context(|| format!("reading buffer {}", buffer_path.display()))?
                }
            };

            if data.len() < buffer.length() {
                return Err(AnimatorError::GltfError(format!(
                    "buffer {} declares {} bytes but holds {}",
                    buffer.index(),
                    buffer.length(),
                    data.len()
                )));
            }
            // GLB chunks may carry up to 3 bytes of padding
            data.truncate(buffer.length());
            buffer_data.push(data);
        }
        Ok(buffer_data)
    }

    // --- Loading Logic ---

    fn create_node_shallow(&mut self, node: &gltf::Node) -> NodeHandle {
        let node_name = node
            .name()
            .map_or_else(|| format!("Node_{}", node.index()), str::to_string);

        let mut engine_node = Node::new(&node_name);
        // Matrix-form nodes are decomposed; absent components are identity
        let (t, r, s) = node.transform().decomposed();
        engine_node.transform.position = Vec3::from_array(t);
        engine_node.transform.rotation = Quat::from_array(r);
        engine_node.transform.scale = Vec3::from_array(s);

        self.scene.create_node(engine_node)
    }

    fn link_hierarchy(&mut self, gltf: &gltf::Gltf) -> Result<()> {
        for node in gltf.nodes() {
            let parent_handle = self.node_mapping[node.index()];
            for child in node.children() {
                let child_handle = self.node_mapping[child.index()];
                self.scene.attach(child_handle, parent_handle).with_context(|| {
                    format!("linking node {} under node {}", child.index(), node.index())
                })?;
            }
        }
        Ok(())
    }

    /// Roots of the default (or first) scene in declaration order; without
    /// any scene, every parentless node in index order.
    fn collect_roots(&mut self, gltf: &gltf::Gltf) -> Result<()> {
        let roots: Vec<NodeHandle> =
            if let Some(scene) = gltf.default_scene().or_else(|| gltf.scenes().next()) {
                let mut roots = Vec::new();
                for node in scene.nodes() {
                    let handle = self.node_mapping[node.index()];
                    if self.scene.nodes[handle].parent().is_some() {
                        return Err(AnimatorError::GltfError(format!(
                            "scene root node {} is also a child of another node",
                            node.index()
                        )));
                    }
                    roots.push(handle);
                }
                roots
            } else {
                self.node_mapping
                    .iter()
                    .copied()
                    .filter(|&h| self.scene.nodes[h].parent().is_none())
                    .collect()
            };

        self.scene.root_nodes = roots;
        Ok(())
    }

    fn load_mesh(mesh: &gltf::Mesh, buffers: &[Vec<u8>]) -> Result<Mesh> {
        let mut primitives = Vec::with_capacity(mesh.primitives().count());
        for primitive in mesh.primitives() {
            let engine_primitive = Self::load_primitive(&primitive, buffers)
                .with_context(|| format!("primitive {}", primitive.index()))?;
            primitives.push(engine_primitive);
        }

        let name = mesh
            .name()
            .map_or_else(|| format!("Mesh_{}", mesh.index()), str::to_string);
        let mut engine_mesh = Mesh::new(&name, primitives);
        if let Some(weights) = mesh.weights() {
            engine_mesh.default_weights = weights.to_vec();
        }

        log::debug!(
            "Mesh '{}': {} primitives, {} morph targets",
            engine_mesh.name,
            engine_mesh.primitives.len(),
            engine_mesh.morph_target_count()
        );
        Ok(engine_mesh)
    }

    fn load_primitive(primitive: &gltf::Primitive, buffers: &[Vec<u8>]) -> Result<Primitive> {
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

        let positions_accessor = primitive.get(&gltf::Semantic::Positions).ok_or_else(|| {
            AnimatorError::MissingAccessor("primitive has no POSITION attribute".to_string())
        })?;
        let positions: Vec<Vec3> =
            read_checked(&positions_accessor, buffers, Encoding::Float, 3, || {
                reader.read_positions().map(|iter| iter.map(Vec3::from_array))
            })
            .with_context(|| "POSITION".to_string())?;
        let vertex_count = positions.len();

        let normals = match primitive.get(&gltf::Semantic::Normals) {
            Some(a) => Some(
                read_checked(&a, buffers, Encoding::Float, 3, || {
                    reader.read_normals().map(|iter| iter.map(Vec3::from_array))
                })
                .with_context(|| "NORMAL".to_string())?,
            ),
            None => None,
        };

        let tex_coords = match primitive.get(&gltf::Semantic::TexCoords(0)) {
            Some(a) => Some(
                read_checked(&a, buffers, Encoding::UnsignedNormalized, 2, || {
                    reader
                        .read_tex_coords(0)
                        .map(|r| r.into_f32().map(Vec2::from_array))
                })
                .with_context(|| "TEXCOORD_0".to_string())?,
            ),
            None => None,
        };

        let indices = match primitive.indices() {
            Some(a) => Some(
                read_checked(&a, buffers, Encoding::Indices, 1, || {
                    reader.read_indices().map(gltf::mesh::util::ReadIndices::into_u32)
                })
                .with_context(|| "indices".to_string())?,
            ),
            None => None,
        };

        let joints = match primitive.get(&gltf::Semantic::Joints(0)) {
            Some(a) => Some(
                read_checked(&a, buffers, Encoding::Joints, 4, || {
                    reader
                        .read_joints(0)
                        .map(|r| r.into_u16().map(|j| j.map(u32::from)))
                })
                .with_context(|| "JOINTS_0".to_string())?,
            ),
            None => None,
        };

        let weights = match primitive.get(&gltf::Semantic::Weights(0)) {
            Some(a) => Some(
                read_checked(&a, buffers, Encoding::UnsignedNormalized, 4, || {
                    reader
                        .read_weights(0)
                        .map(|r| r.into_f32().map(Vec4::from_array))
                })
                .with_context(|| "WEIGHTS_0".to_string())?,
            ),
            None => None,
        };

        let mut morph_targets = Vec::new();
        for (i, (target, (deltas, _, _))) in primitive
            .morph_targets()
            .zip(reader.read_morph_targets())
            .enumerate()
        {
            let deltas = match target.positions() {
                Some(a) => read_checked(&a, buffers, Encoding::Float, 3, || {
                    deltas.map(|iter| iter.map(Vec3::from_array))
                })
                .with_context(|| format!("morph target {i} POSITION"))?,
                None => vec![Vec3::ZERO; vertex_count],
            };
            morph_targets.push(deltas);
        }

        Ok(Primitive {
            positions,
            normals,
            tex_coords,
            indices,
            joints,
            weights,
            morph_targets,
        })
    }

    fn load_skin(&mut self, skin: &gltf::Skin, buffers: &[Vec<u8>]) -> Result<SkeletonKey> {
        let name = skin
            .name()
            .map_or_else(|| format!("Skin_{}", skin.index()), str::to_string);

        let bones: Vec<NodeHandle> = skin
            .joints()
            .map(|node| self.node_mapping[node.index()])
            .collect();

        let ibms: Vec<Mat4> = if let Some(a) = skin.inverse_bind_matrices() {
            let reader = skin.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
            read_checked(&a, buffers, Encoding::Float, 16, || {
                reader
                    .read_inverse_bind_matrices()
                    .map(|iter| iter.map(|m| Mat4::from_cols_array_2d(&m)))
            })
            .with_context(|| "inverse bind matrices".to_string())?
        } else {
            log::warn!("Skin '{name}' has no inverse bind matrices, using identity");
            vec![Mat4::IDENTITY; bones.len()]
        };

        let skeleton = Skeleton::new(&name, bones, ibms)?;
        log::debug!("Skin '{name}': {} joints", skeleton.joint_count());
        Ok(self.scene.add_skeleton(skeleton))
    }

    fn bind_node_mesh_and_skin(&mut self, node: &gltf::Node) -> Result<()> {
        let handle = self.node_mapping[node.index()];

        if let Some(mesh) = node.mesh() {
            let mesh_key = self.mesh_mapping[mesh.index()];
            // Initial weights: node, then mesh, then zeros
            let initial = node.weights().or_else(|| mesh.weights()).unwrap_or_default();
            if let Some(engine_node) = self.scene.get_node_mut(handle) {
                engine_node.morph_weights = MorphWeights::from_slice(initial);
            }
            self.scene.set_mesh(handle, mesh_key)?;
        }

        if let Some(skin) = node.skin() {
            let skeleton_key = self.skin_mapping[skin.index()];
            self.scene.bind_skeleton(handle, skeleton_key)?;
            if let Some(mesh) = node.mesh() {
                self.check_skin_joints(self.mesh_mapping[mesh.index()], skeleton_key)?;
            }
        }

        Ok(())
    }

    fn check_skin_joints(&self, mesh_key: MeshKey, skeleton_key: SkeletonKey) -> Result<()> {
        let (Some(mesh), Some(skeleton)) =
            (self.scene.meshes.get(mesh_key), self.scene.skins.get(skeleton_key))
        else {
            return Ok(());
        };
        let Some(max_joint) = mesh.max_joint_index() else {
            return Ok(());
        };

        match skeleton.validate_joint_index(max_joint) {
            Err(e) if self.settings.strict_skin_joints => Err(e),
            Err(e) => {
                log::warn!("Mesh '{}' with skin '{}': {e}", mesh.name, skeleton.name);
                Ok(())
            }
            Ok(()) => {
                let used = max_joint as usize + 1;
                if used < skeleton.joint_count() {
                    log::warn!(
                        "Skin '{}' defines {} joints but mesh '{}' only uses {used}",
                        skeleton.name,
                        skeleton.joint_count(),
                        mesh.name
                    );
                }
                Ok(())
            }
        }
    }

    fn load_animations(&self, gltf: &gltf::Gltf, buffers: &[Vec<u8>]) -> Result<Vec<AnimationClip>> {
        let mut animations = Vec::with_capacity(gltf.animations().count());

        for anim in gltf.animations() {
            let name = anim
                .name()
                .map_or_else(|| format!("Animation_{}", anim.index()), str::to_string);

            let mut tracks = Vec::new();
            for (channel_index, channel) in anim.channels().enumerate() {
                let track = self
                    .load_channel(&channel, buffers)
                    .with_context(|| format!("animation '{name}' channel {channel_index}"))?;
                tracks.push(track);
            }

            let clip = AnimationClip::with_duration_policy(name, tracks, self.settings.duration_policy);
            log::debug!(
                "Clip '{}': {} tracks, duration {:.3}s",
                clip.name,
                clip.tracks.len(),
                clip.duration
            );
            animations.push(clip);
        }

        Ok(animations)
    }

    fn load_channel(&self, channel: &gltf::animation::Channel, buffers: &[Vec<u8>]) -> Result<Track> {
        use gltf::animation::util::ReadOutputs;

        let reader = channel.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
        let sampler = channel.sampler();
        let target = channel.target();
        let target_handle = self.node_mapping[target.node().index()];

        let times = read_checked(&sampler.input(), buffers, Encoding::Float, 1, || reader.read_inputs())
            .with_context(|| "input times".to_string())?;

        let interpolation = match sampler.interpolation() {
            gltf::animation::Interpolation::Linear => InterpolationMode::Linear,
            gltf::animation::Interpolation::Step => InterpolationMode::Step,
            gltf::animation::Interpolation::CubicSpline => InterpolationMode::CubicSpline,
        };

        let output = sampler.output();
        let data = match target.property() {
            gltf::animation::Property::Translation => {
                let values = read_checked(&output, buffers, Encoding::Float, 3, || {
                    match reader.read_outputs() {
                        Some(ReadOutputs::Translations(iter)) => Some(iter.map(Vec3::from_array)),
                        _ => None,
                    }
                })?;
                TrackData::Translation(KeyframeTrack::new(times, values, interpolation)?)
            }
            gltf::animation::Property::Scale => {
                let values = read_checked(&output, buffers, Encoding::Float, 3, || {
                    match reader.read_outputs() {
                        Some(ReadOutputs::Scales(iter)) => Some(iter.map(Vec3::from_array)),
                        _ => None,
                    }
                })?;
                TrackData::Scale(KeyframeTrack::new(times, values, interpolation)?)
            }
            gltf::animation::Property::Rotation => {
                // Stored x, y, z, w
                let values: Vec<[f32; 4]> = read_checked(&output, buffers, Encoding::Normalized, 4, || {
                    match reader.read_outputs() {
                        Some(ReadOutputs::Rotations(rotations)) => Some(rotations.into_f32()),
                        _ => None,
                    }
                })?;
                let values = values.into_iter().map(Quat::from_array).collect();
                TrackData::Rotation(KeyframeTrack::new(times, values, interpolation)?)
            }
            gltf::animation::Property::MorphTargetWeights => {
                let flat = read_checked(&output, buffers, Encoding::Normalized, 1, || {
                    match reader.read_outputs() {
                        Some(ReadOutputs::MorphTargetWeights(weights)) => Some(weights.into_f32()),
                        _ => None,
                    }
                })?;
                TrackData::weights(times, &flat, interpolation)?
            }
        };

        Ok(Track {
            target: target_handle,
            data,
        })
    }
}

// --- Accessor bridging ---

fn component_type(data_type: DataType) -> ComponentType {
    match data_type {
        DataType::I8 => ComponentType::I8,
        DataType::U8 => ComponentType::U8,
        DataType::I16 => ComponentType::I16,
        DataType::U16 => ComponentType::U16,
        DataType::U32 => ComponentType::U32,
        DataType::F32 => ComponentType::F32,
    }
}

fn view_layout(view: &gltf::buffer::View, buffers: &[Vec<u8>]) -> Result<ViewLayout> {
    let buffer = buffers.get(view.buffer().index()).ok_or_else(|| {
        AnimatorError::AssetIndexOutOfBounds {
            context: "buffer".to_string(),
            index: view.buffer().index(),
        }
    })?;
    Ok(ViewLayout {
        offset: view.offset(),
        length: view.length(),
        stride: view.stride(),
        buffer_length: buffer.len(),
    })
}

fn accessor_layout(a: &gltf::Accessor, buffers: &[Vec<u8>]) -> Result<AccessorLayout> {
    let view = match a.view() {
        Some(view) => Some(view_layout(&view, buffers)?),
        None => None,
    };

    let sparse = match a.sparse() {
        Some(sparse) => {
            let indices = sparse.indices();
            let values = sparse.values();
            Some(SparseLayout {
                count: sparse.count(),
                index_type: match indices.index_type() {
                    gltf::accessor::sparse::IndexType::U8 => IndexType::U8,
                    gltf::accessor::sparse::IndexType::U16 => IndexType::U16,
                    gltf::accessor::sparse::IndexType::U32 => IndexType::U32,
                },
                indices: view_layout(&indices.view(), buffers)?,
                indices_offset: indices.offset(),
                values: view_layout(&values.view(), buffers)?,
                values_offset: values.offset(),
            })
        }
        None => None,
    };

    Ok(AccessorLayout {
        component_type: component_type(a.data_type()),
        components: a.dimensions().multiplicity(),
        count: a.count(),
        normalized: a.normalized(),
        offset: a.offset(),
        view,
        sparse,
    })
}

/// Vets `a` and only then asks `read` for the glTF reader's iterator, so the
/// reader never sees an encoding or layout it cannot handle.
fn read_checked<T, I>(
    a: &gltf::Accessor,
    buffers: &[Vec<u8>],
    encoding: Encoding,
    components: usize,
    read: impl FnOnce() -> Option<I>,
) -> Result<Vec<T>>
where
    T: Clone + Default,
    I: Iterator<Item = T>,
{
    let layout = accessor_layout(a, buffers)?;
    layout
        .check(encoding, components)
        .with_context(|| format!("accessor {}", a.index()))?;
    accessor::decode(&layout, read())
}

/// Decodes a base64 `data:` URI.
fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| AnimatorError::DataUriError("missing 'data:' prefix".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| AnimatorError::DataUriError("missing ',' separator".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(AnimatorError::DataUriError(format!(
            "only base64 data URIs are supported, got '{header}'"
        )));
    }
    Ok(base64::engine::general_purpose::STANDARD.decode(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_uri_decoding() {
        let data = decode_data_uri("data:application/octet-stream;base64,AAEC").unwrap();
        assert_eq!(data, vec![0, 1, 2]);
    }

    #[test]
    fn test_data_uri_requires_base64() {
        assert!(matches!(
            decode_data_uri("data:text/plain,hello"),
            Err(AnimatorError::DataUriError(_))
        ));
    }
}

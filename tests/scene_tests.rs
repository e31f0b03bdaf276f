//! Scene Integration Tests
//!
//! Tests for:
//! - Scene: node creation, attach rules, name lookup, root bookkeeping
//! - AnimationSystem: binding, sampling, keyframe posing
//! - Model: evaluate / tick / clip switching with rest-pose restore
//! - CPU skinning and morph helpers on primitives

use glam::{Mat4, Quat, Vec3, Vec4};
use gltf_animator::animation::clip::{AnimationClip, Track, TrackData};
use gltf_animator::animation::playback::Playback;
use gltf_animator::animation::system::AnimationSystem;
use gltf_animator::animation::tracks::{InterpolationMode, KeyframeCursor, KeyframeTrack};
use gltf_animator::errors::AnimatorError;
use gltf_animator::model::Model;
use gltf_animator::scene::mesh::Primitive;
use gltf_animator::scene::node::Node;
use gltf_animator::scene::scene::Scene;
use gltf_animator::scene::NodeHandle;
use gltf_animator::settings::LoadSettings;

const EPSILON: f32 = 1e-5;

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    (a - b).abs().max_element() < EPSILON
}

fn translation(target: NodeHandle, times: Vec<f32>, values: Vec<Vec3>) -> Track {
    Track {
        target,
        data: TrackData::Translation(
            KeyframeTrack::new(times, values, InterpolationMode::Linear).unwrap(),
        ),
    }
}

fn position(scene: &Scene, handle: NodeHandle) -> Vec3 {
    scene.get_node(handle).unwrap().transform.position
}

fn world_position(scene: &Scene, handle: NodeHandle) -> Vec3 {
    scene.get_node(handle).unwrap().world_matrix().translation.into()
}

// ============================================================================
// Node Creation & Hierarchy
// ============================================================================

#[test]
fn scene_add_node_to_root() {
    let mut scene = Scene::new();
    let handle = scene.add_node(Node::new("root"));
    assert!(scene.root_nodes.contains(&handle));
}

#[test]
fn scene_create_node_is_detached() {
    let mut scene = Scene::new();
    let handle = scene.create_node(Node::new("loose"));
    assert!(scene.get_node(handle).is_some());
    assert!(scene.root_nodes.is_empty());
}

#[test]
fn scene_attach_links_both_sides_and_leaves_roots() {
    let mut scene = Scene::new();
    let parent = scene.add_node(Node::new("parent"));
    let child = scene.add_node(Node::new("child"));

    scene.attach(child, parent).unwrap();

    assert_eq!(scene.get_node(child).unwrap().parent(), Some(parent));
    assert_eq!(scene.get_node(parent).unwrap().children(), &[child]);
    assert_eq!(scene.root_nodes, vec![parent]);
}

#[test]
fn scene_attach_preserves_child_order() {
    let mut scene = Scene::new();
    let parent = scene.add_node(Node::new("parent"));
    let children: Vec<_> = (0..4)
        .map(|i| scene.create_node(Node::new(&format!("c{i}"))))
        .collect();
    for &c in children.iter().rev() {
        scene.attach(c, parent).unwrap();
    }

    let expected: Vec<_> = children.iter().rev().copied().collect();
    assert_eq!(scene.get_node(parent).unwrap().children(), expected.as_slice());
}

#[test]
fn scene_attach_rejects_self() {
    let mut scene = Scene::new();
    let node = scene.add_node(Node::new("n"));
    assert!(matches!(scene.attach(node, node), Err(AnimatorError::HierarchyCycle(_))));
}

#[test]
fn scene_attach_rejects_cycle() {
    let mut scene = Scene::new();
    let a = scene.add_node(Node::new("a"));
    let b = scene.create_node(Node::new("b"));
    let c = scene.create_node(Node::new("c"));
    scene.attach(b, a).unwrap();
    scene.attach(c, b).unwrap();

    // `a` is a root without a parent, so only the ancestry check can refuse this
    assert!(matches!(scene.attach(a, c), Err(AnimatorError::HierarchyCycle(_))));
    assert!(scene.is_ancestor(a, c));
    assert!(!scene.is_ancestor(c, a));
}

#[test]
fn scene_attach_rejects_second_parent() {
    let mut scene = Scene::new();
    let p1 = scene.add_node(Node::new("p1"));
    let p2 = scene.add_node(Node::new("p2"));
    let child = scene.create_node(Node::new("child"));
    scene.attach(child, p1).unwrap();

    assert!(matches!(scene.attach(child, p2), Err(AnimatorError::AlreadyParented(_))));
    assert!(scene.get_node(p2).unwrap().children().is_empty());
}

#[test]
fn scene_attach_rejects_missing_nodes() {
    let mut scene = Scene::new();
    let node = scene.add_node(Node::new("n"));
    let missing = NodeHandle::default();

    assert!(matches!(scene.attach(node, missing), Err(AnimatorError::InvalidHandle(_))));
    assert!(matches!(scene.attach(missing, node), Err(AnimatorError::InvalidHandle(_))));
}

#[test]
fn scene_find_node_by_name() {
    let mut scene = Scene::new();
    scene.add_node(Node::new("hips"));
    let spine = scene.add_node(Node::new("spine"));

    assert_eq!(scene.find_node_by_name("spine"), Some(spine));
    assert_eq!(scene.find_node_by_name("head"), None);
}

#[test]
fn rest_pose_round_trip() {
    let mut scene = Scene::new();
    let node = scene.build_node("n").with_position(1.0, 2.0, 3.0).build().unwrap();
    let pose = scene.capture_rest_pose();
    assert_eq!(pose.len(), 1);

    scene.get_node_mut(node).unwrap().transform.position = Vec3::ZERO;
    scene.restore_rest_pose(&pose);
    assert_eq!(position(&scene, node), Vec3::new(1.0, 2.0, 3.0));
}

// ============================================================================
// AnimationSystem
// ============================================================================

#[test]
fn bind_rejects_duplicate_channel() {
    let mut scene = Scene::new();
    let node = scene.add_node(Node::new("n"));
    let clip = AnimationClip::new(
        "dup".to_string(),
        vec![
            translation(node, vec![0.0, 1.0], vec![Vec3::ZERO, Vec3::X]),
            translation(node, vec![0.0, 1.0], vec![Vec3::ZERO, Vec3::Y]),
        ],
    );

    let result = AnimationSystem::bind(&mut scene, &clip);
    assert!(matches!(result, Err(AnimatorError::DuplicateChannel(_))));
    assert!(scene.get_node(node).unwrap().bindings().is_empty());
}

#[test]
fn bind_rejects_missing_target() {
    let mut scene = Scene::new();
    let clip = AnimationClip::new(
        "orphan".to_string(),
        vec![translation(NodeHandle::default(), vec![0.0, 1.0], vec![Vec3::ZERO, Vec3::X])],
    );
    assert!(matches!(
        AnimationSystem::bind(&mut scene, &clip),
        Err(AnimatorError::InvalidHandle(_))
    ));
}

#[test]
fn apply_writes_sampled_values_and_holds_short_tracks() {
    let mut scene = Scene::new();
    let short = scene.add_node(Node::new("short"));
    let long = scene.add_node(Node::new("long"));
    let clip = AnimationClip::new(
        "clip".to_string(),
        vec![
            translation(short, vec![0.0, 1.0], vec![Vec3::ZERO, Vec3::X]),
            translation(long, vec![0.0, 2.0], vec![Vec3::ZERO, Vec3::new(0.0, 4.0, 0.0)]),
        ],
    );
    let mut cursors = Vec::<KeyframeCursor>::new();

    AnimationSystem::bind(&mut scene, &clip).unwrap();
    AnimationSystem::apply(&mut scene, &clip, 1.5, &mut cursors).unwrap();

    assert!(vec3_approx(position(&scene, short), Vec3::X));
    assert!(vec3_approx(position(&scene, long), Vec3::new(0.0, 3.0, 0.0)));
}

#[test]
fn apply_out_of_range_leaves_scene_untouched() {
    let mut scene = Scene::new();
    let node = scene.build_node("n").with_position(9.0, 9.0, 9.0).build().unwrap();
    let clip = AnimationClip::new(
        "clip".to_string(),
        vec![translation(node, vec![0.0, 1.0], vec![Vec3::ZERO, Vec3::X])],
    );
    let mut cursors = Vec::new();

    AnimationSystem::bind(&mut scene, &clip).unwrap();
    let result = AnimationSystem::apply(&mut scene, &clip, 1.5, &mut cursors);

    assert!(matches!(result, Err(AnimatorError::TimeOutOfRange { .. })));
    assert_eq!(position(&scene, node), Vec3::splat(9.0));
}

#[test]
fn apply_keyframe_poses_exact_keyframes() {
    let mut scene = Scene::new();
    let node = scene.add_node(Node::new("n"));
    let clip = AnimationClip::new(
        "clip".to_string(),
        vec![translation(node, vec![0.0, 0.5, 1.0], vec![Vec3::ZERO, Vec3::X, Vec3::Y])],
    );

    AnimationSystem::bind(&mut scene, &clip).unwrap();
    AnimationSystem::apply_keyframe(&mut scene, &clip, 1).unwrap();
    assert_eq!(position(&scene, node), Vec3::X);

    // Past the end holds the last keyframe
    AnimationSystem::apply_keyframe(&mut scene, &clip, 10).unwrap();
    assert_eq!(position(&scene, node), Vec3::Y);
}

// ============================================================================
// Model
// ============================================================================

/// Two root nodes `a` and `b`; clip 0 moves `a` and returns, clip 1 moves `b`.
fn two_clip_model() -> (Model, NodeHandle, NodeHandle) {
    let mut scene = Scene::new();
    let a = scene.build_node("a").with_position(0.0, 0.0, 1.0).build().unwrap();
    let b = scene.build_node("b").build().unwrap();

    let clips = vec![
        AnimationClip::new(
            "wave".to_string(),
            vec![translation(
                a,
                vec![0.0, 1.0, 2.0],
                vec![Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0), Vec3::ZERO],
            )],
        ),
        AnimationClip::new(
            "lift".to_string(),
            vec![translation(b, vec![0.0, 1.0], vec![Vec3::ZERO, Vec3::Y])],
        ),
    ];

    let model = Model::new(scene, clips, LoadSettings::default()).unwrap();
    (model, a, b)
}

#[test]
fn model_starts_on_first_clip_at_time_zero() {
    let (model, a, _) = two_clip_model();
    assert_eq!(model.active_clip(), Some(0));
    assert!(vec3_approx(world_position(&model.scene, a), Vec3::ZERO));
}

#[test]
fn model_tick_advances_and_wraps() {
    let (mut model, a, _) = two_clip_model();
    let playback = model.playback();

    let playback = model.tick(playback, 0.5).unwrap();
    assert!(vec3_approx(world_position(&model.scene, a), Vec3::new(2.0, 0.0, 0.0)));

    let playback = model.tick(playback, 2.0).unwrap();
    assert!((playback.time - 0.5).abs() < EPSILON);
    assert!(vec3_approx(world_position(&model.scene, a), Vec3::new(2.0, 0.0, 0.0)));
}

#[test]
fn model_loop_endpoints_match() {
    let (mut model, a, _) = two_clip_model();

    model.evaluate(&Playback::new(0)).unwrap();
    let start = *model.scene.get_node(a).unwrap().world_matrix();

    let end = Playback {
        time: model.clip(0).unwrap().duration,
        ..Playback::new(0)
    };
    model.evaluate(&end).unwrap();

    assert_eq!(*model.scene.get_node(a).unwrap().world_matrix(), start);
}

#[test]
fn model_switch_restores_rest_pose() {
    let (mut model, a, b) = two_clip_model();
    let playback = model.tick(model.playback(), 1.0).unwrap();
    assert!(vec3_approx(position(&model.scene, a), Vec3::new(4.0, 0.0, 0.0)));

    let playback = model.switch_clip(playback, 1).unwrap();
    assert_eq!(playback.clip_index, 1);
    assert_eq!(playback.time, 0.0);

    // `a` is not animated by "lift" and returns to its load-time position
    assert_eq!(position(&model.scene, a), Vec3::new(0.0, 0.0, 1.0));
    assert!(vec3_approx(position(&model.scene, b), Vec3::ZERO));
    assert_eq!(model.active_clip(), Some(1));
}

#[test]
fn model_switch_to_missing_clip_fails() {
    let (mut model, _, _) = two_clip_model();
    let playback = model.playback();
    assert!(matches!(
        model.switch_clip(playback, 5),
        Err(AnimatorError::AssetIndexOutOfBounds { index: 5, .. })
    ));
}

#[test]
fn model_cycles_clips() {
    let (mut model, _, _) = two_clip_model();
    let playback = model.previous_clip(model.playback()).unwrap();
    assert_eq!(playback.clip_index, 1);
    let playback = model.next_clip(playback).unwrap();
    assert_eq!(playback.clip_index, 0);
    assert_eq!(model.find_clip("lift"), Some(1));
}

#[test]
fn model_pose_keyframe() {
    let (mut model, a, _) = two_clip_model();
    model.pose_keyframe(&model.playback(), 1).unwrap();
    assert!(vec3_approx(world_position(&model.scene, a), Vec3::new(4.0, 0.0, 0.0)));
}

#[test]
fn model_rejects_duplicate_channels() {
    let mut scene = Scene::new();
    let node = scene.add_node(Node::new("n"));
    let clip = AnimationClip::new(
        "dup".to_string(),
        vec![
            translation(node, vec![0.0, 1.0], vec![Vec3::ZERO, Vec3::X]),
            Track {
                target: node,
                data: TrackData::Translation(
                    KeyframeTrack::new(vec![0.0], vec![Vec3::Y], InterpolationMode::Step).unwrap(),
                ),
            },
        ],
    );

    let result = Model::new(scene, vec![clip], LoadSettings::default());
    assert!(matches!(result, Err(AnimatorError::DuplicateChannel(_))));
}

#[test]
fn model_without_clips_still_updates_world() {
    let mut scene = Scene::new();
    let node = scene
        .build_node("n")
        .with_rotation(Quat::from_rotation_y(0.5))
        .with_position(1.0, 0.0, 0.0)
        .build()
        .unwrap();
    let mut model = Model::new(scene, Vec::new(), LoadSettings::default()).unwrap();

    assert!(vec3_approx(world_position(&model.scene, node), Vec3::X));
    let playback = model.tick(model.playback(), 1.0).unwrap();
    assert_eq!(playback.time, 0.0);
}

// ============================================================================
// CPU skinning & morphing
// ============================================================================

#[test]
fn skinned_positions_blend_joint_matrices() {
    let primitive = Primitive {
        positions: vec![Vec3::new(0.0, 1.0, 0.0)],
        joints: Some(vec![[0, 1, 0, 0]]),
        weights: Some(vec![Vec4::new(0.5, 0.5, 0.0, 0.0)]),
        ..Default::default()
    };
    let joints = [Mat4::IDENTITY, Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0))];

    let skinned = primitive.skinned_positions(&joints).unwrap();
    assert!(vec3_approx(skinned[0], Vec3::new(1.0, 1.0, 0.0)));
    assert_eq!(primitive.max_joint_index(), Some(1));

    assert!(matches!(
        primitive.skinned_positions(&joints[..1]),
        Err(AnimatorError::JointOutOfRange { index: 1, count: 1 })
    ));
}

#[test]
fn morphed_positions_add_weighted_targets() {
    let primitive = Primitive {
        positions: vec![Vec3::ZERO, Vec3::ONE],
        morph_targets: vec![vec![Vec3::X, Vec3::X], vec![Vec3::Y, Vec3::ZERO]],
        ..Default::default()
    };

    let morphed = primitive.morphed_positions(&[0.5, 2.0]);
    assert!(vec3_approx(morphed[0], Vec3::new(0.5, 2.0, 0.0)));
    assert!(vec3_approx(morphed[1], Vec3::new(1.5, 1.0, 1.0)));
}

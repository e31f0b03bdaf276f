//! Headless animation player.
//!
//! Usage: `anim_player <model.gltf|model.glb> [clip] [seconds]`
//!
//! Plays `clip` (index or name, default 0) at 60 Hz for `seconds` (default:
//! one clip duration) and logs the pose of every mesh and skin once per
//! simulated second. Run with `RUST_LOG=debug` for per-item load detail.

use std::path::PathBuf;

use anyhow::{Context, bail};
use gltf_animator::{GltfLoader, Model, Playback};

const TIMESTEP: f32 = 1.0 / 60.0;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next().map(PathBuf::from) else {
        bail!("usage: anim_player <model.gltf|model.glb> [clip] [seconds]");
    };

    let mut model = GltfLoader::load(&path)
        .with_context(|| format!("Failed to load {}", path.display()))?;

    let mut playback = model.playback();
    if let Some(clip) = args.next() {
        let index = match clip.parse::<usize>() {
            Ok(index) => index,
            Err(_) => model
                .find_clip(&clip)
                .with_context(|| format!("No clip named '{clip}'"))?,
        };
        playback = model.switch_clip(playback, index)?;
    }

    let Some(clip) = model.clip(playback.clip_index) else {
        log::info!("Model has no animations; static pose:");
        log_pose(&model, &playback);
        return Ok(());
    };
    log::info!("Playing '{}' ({:.3}s)", clip.name, clip.duration);

    let seconds = match args.next() {
        Some(s) => s.parse::<f32>().context("seconds must be a number")?,
        None => clip.duration.max(TIMESTEP),
    };

    let steps = (seconds / TIMESTEP).ceil() as u32;
    for step in 0..=steps {
        if step % 60 == 0 {
            log_pose(&model, &playback);
        }
        playback = model.tick(playback, TIMESTEP)?;
    }

    Ok(())
}

fn log_pose(model: &Model, playback: &Playback) {
    log::info!("t = {:.3}s", playback.time);
    for mesh in model.scene.meshes.values() {
        let translation = mesh.pose_matrix.w_axis.truncate();
        log::info!(
            "  mesh '{}': translation {translation:?}, weights {:?}",
            mesh.name,
            mesh.morph_weights
        );
    }
    for skin in model.scene.skins.values() {
        if let Some(first) = skin.joint_matrices().first() {
            log::info!(
                "  skin '{}': {} joints, joint 0 translation {:?}",
                skin.name,
                skin.joint_count(),
                first.w_axis.truncate()
            );
        }
    }
}

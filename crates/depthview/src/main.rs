use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use glam::Vec3;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use depthview::{CameraPose, CoordFrame, DepthImage, DepthRenderer, MeshSource, Pose, RendererOptions};

const DEMO_CONFIG_FILE: &str = "depthview.ron";

fn default_size() -> u32 {
    100
}

fn default_frames() -> usize {
    100
}

fn default_scale() -> f32 {
    1.0
}

fn default_camera() -> Vec<f32> {
    vec![0.7, 0.7, 2.0]
}

#[derive(Debug, Deserialize)]
struct MeshEntry {
    name: String,
    path: PathBuf,
    #[serde(default = "default_scale")]
    scale: f32,
}

#[derive(Debug, Deserialize)]
struct DemoConfig {
    #[serde(default = "default_size")]
    width: u32,
    #[serde(default = "default_size")]
    height: u32,
    #[serde(default)]
    show: bool,
    #[serde(default)]
    meshes: Vec<MeshEntry>,
    #[serde(default = "default_frames")]
    frames: usize,
    #[serde(default = "default_camera")]
    camera: Vec<f32>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        DemoConfig {
            width: default_size(),
            height: default_size(),
            show: false,
            meshes: Vec::new(),
            frames: default_frames(),
            camera: default_camera(),
        }
    }
}

impl DemoConfig {
    fn load() -> Result<Self> {
        if let Ok(config_str) = std::fs::read_to_string(DEMO_CONFIG_FILE) {
            let config: Self = ron::de::from_str(&config_str)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }
}

fn main() -> Result<()> {
    let fmt_layer = fmt::layer().with_target(false);
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(if cfg!(debug_assertions) { "debug" } else { "info" }))?;
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
    info!("starting depthview");

    let config = DemoConfig::load()?;

    let mut objects = BTreeMap::new();
    if config.meshes.is_empty() {
        objects.insert(
            "box".to_string(),
            MeshSource::Box {
                half_extents: Vec3::splat(0.5),
            },
        );
    } else {
        for entry in &config.meshes {
            objects.insert(
                entry.name.clone(),
                MeshSource::File {
                    path: entry.path.clone(),
                    scale: entry.scale,
                },
            );
        }
    }
    let names: Vec<String> = objects.keys().cloned().collect();

    let options = RendererOptions {
        width: config.width,
        height: config.height,
        camera_k: None,
        show: config.show,
    };
    let mut renderer = DepthRenderer::new(&objects, &options)?;
    let camera = CameraPose::from_slice(&config.camera)?;

    std::fs::create_dir_all("frames")?;
    let timer = Instant::now();
    let mut rendered = 0usize;
    for i in 0..config.frames {
        // sweep every object through a full turn over the batch
        let yaw = i as f32 * std::f32::consts::TAU / config.frames.max(1) as f32;
        let mut poses = HashMap::new();
        for name in &names {
            poses.insert(
                name.clone(),
                Pose::new(Vec3::new(0.0, 0.0, -1.5), Vec3::new(0.0, 0.0, yaw)),
            );
        }

        let depth = renderer.render(&poses, &camera, CoordFrame::Camera)?;
        save_depth_png(&depth, &format!("frames/depth_{i:04}.png"))?;
        rendered += 1;
    }
    let elapsed = timer.elapsed().as_secs_f32();
    info!(
        "rendered {rendered} frames in {elapsed:.3}s | {:.1} fps",
        rendered as f32 / elapsed
    );
    Ok(())
}

/// Normalizes a depth image to its own range and writes it as grayscale PNG.
fn save_depth_png(depth: &DepthImage, path: &str) -> Result<()> {
    let max = depth.pixels().iter().copied().fold(f32::EPSILON, f32::max);
    let bytes: Vec<u8> = depth
        .pixels()
        .iter()
        .map(|d| (d / max * 255.0) as u8)
        .collect();
    image::save_buffer_with_format(
        path,
        &bytes,
        depth.width(),
        depth.height(),
        image::ColorType::L8,
        image::ImageFormat::Png,
    )?;
    Ok(())
}

//! Progressive LOD Demo
//!
//! Streams three procedurally generated tiers of a sphere through a fetcher
//! with simulated network latency, while a camera flies towards the object
//! and the tracker switches tiers.
//!
//! Run with:
//! ```bash
//! RUST_LOG=debug cargo run --example progressive_lod
//! ```

use std::f32::consts::{PI, TAU};
use std::time::Duration;

use glam::Vec3;
use myth_lod::assets::{AssetFetcher, AssetServer, Mesh, Model, ModelData};
use myth_lod::errors::{AssetError, Result};
use myth_lod::lod::naming::split_tier_suffix;
use myth_lod::lod::{LoadOptions, LodLevelDesc, LodLoader, LodTracker};

/// Serves UV spheres whose resolution halves with every tier.
struct ProceduralFetcher {
    server: AssetServer,
    latency: Duration,
}

impl ProceduralFetcher {
    fn sphere(segments: u32) -> Mesh {
        let rings = segments / 2;
        let mut positions = Vec::new();
        for r in 0..=rings {
            let phi = PI * r as f32 / rings as f32;
            for s in 0..=segments {
                let theta = TAU * s as f32 / segments as f32;
                positions.push(Vec3::new(
                    phi.sin() * theta.cos(),
                    phi.cos(),
                    phi.sin() * theta.sin(),
                ));
            }
        }

        let stride = segments + 1;
        let mut indices = Vec::new();
        for r in 0..rings {
            for s in 0..segments {
                let a = r * stride + s;
                let b = a + stride;
                indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
            }
        }

        Mesh {
            name: Some(format!("sphere{segments}")),
            positions,
            indices,
        }
    }
}

impl AssetFetcher for ProceduralFetcher {
    async fn fetch_and_parse(&self, url: &str) -> Result<Model> {
        let stem = url.rsplit_once('.').map_or(url, |(stem, _)| stem);
        let (_, tier) = split_tier_suffix(stem)
            .ok_or_else(|| AssetError::NotFound(url.to_string()))?;

        // Finer tiers are bigger downloads
        let delay = self.latency * (3 - tier.min(2) as u32);
        tokio::time::sleep(delay).await;

        let data = ModelData {
            name: Some(stem.to_string()),
            meshes: vec![Self::sphere(64 >> tier)],
        };
        Ok(Model::from_data(&self.server, data, url))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let server = AssetServer::new();
    let tracker = LodTracker::new();
    let loader = LodLoader::new(
        ProceduralFetcher {
            server: server.clone(),
            latency: Duration::from_millis(150),
        },
        tracker.clone(),
    );

    let transitions = tracker.subscribe();
    tokio::spawn(async move {
        while let Ok(t) = transitions.recv_async().await {
            log::info!(
                "'{}' switched LOD{:?} -> LOD{} at {:.1}",
                t.name,
                t.previous,
                t.current,
                t.distance
            );
        }
    });

    let options = LoadOptions::default()
        .with_levels([
            LodLevelDesc::new(0, 0.0).with_simplification(1.0, 0.0),
            LodLevelDesc::new(1, 12.0).with_simplification(0.25, 0.01),
            LodLevelDesc::new(2, 30.0).with_simplification(0.06, 0.05),
        ])
        .with_position(Vec3::new(0.0, 0.0, -5.0))
        .on_tier_loaded(|progress| log::info!("{}", progress.message))
        .on_ready(|lod| log::info!("{} ready with tiers {:?}", lod.id(), lod.read().tiers().collect::<Vec<_>>()));

    let load = loader.load_lod("planet_LOD0.mesh", options).await?;
    log::info!(
        "First tier in: {} triangle(s) resident",
        server.meshes.read_lock().values().map(|m| m.triangle_count()).sum::<usize>()
    );

    // Fly from far away to right next to the planet
    let mut frame = tokio::time::interval(Duration::from_millis(16));
    for step in 0..=120 {
        frame.tick().await;
        let camera = Vec3::new(0.0, 0.0, 40.0 - step as f32 * 0.4);
        tracker.update(camera);
    }

    if let Some(background) = load.background {
        let report = background.finish().await?;
        log::info!("Background load report: {report:?}");
    }

    tracker.dispose(&load.lod);
    log::info!("Disposed; {} mesh(es) still resident", server.meshes.len());
    Ok(())
}

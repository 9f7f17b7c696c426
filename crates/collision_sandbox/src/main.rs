//! Collision sandbox
//!
//! Runs a scripted scene through the collision engine and logs what the
//! collision pass did each frame.

use std::collections::HashMap;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use collision_engine::foundation::logging;
use collision_engine::prelude::*;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

mod scene;
use scene::Scene;

const DEFAULT_FRAMES: u32 = 240;
const REPORT_INTERVAL: u32 = 30;

/// Logs attachment changes as they are dispatched
struct AttachmentLog;

impl EventHandler for AttachmentLog {
    fn on_event(&mut self, event: &Event) -> bool {
        match &event.payload {
            CollisionEvent::Mounted { rider, mount } => info!("frame {}: {rider} mounted {mount}", event.frame),
            CollisionEvent::PlatformAttached { platform, object } => {
                debug!("frame {}: {object:?} landed on {platform}", event.frame);
            }
            CollisionEvent::PlatformDetached { platform, object } => {
                debug!("frame {}: {object:?} left {platform}", event.frame);
            }
            _ => {}
        }
        false
    }
}

#[derive(Debug, Default)]
struct Totals {
    frames: u32,
    candidates: usize,
    dropped: usize,
    mounts: usize,
    chr_chr: usize,
    chr_prt: usize,
    terminated: usize,
    events: HashMap<EventType, usize>,
}

impl Totals {
    fn add(&mut self, report: &FrameReport) {
        let stats = &report.stats;
        self.frames += 1;
        self.candidates += stats.candidates;
        self.dropped += stats.dropped;
        self.mounts += stats.mounts;
        self.chr_chr += stats.chr_chr_collisions;
        self.chr_prt += stats.chr_prt_collisions;
        self.terminated += stats.particles_terminated;
        for event in &report.events {
            *self.events.entry(event.event_type()).or_default() += 1;
        }
    }
}

fn main() -> Result<()> {
    let matches = Command::new("collision_sandbox")
        .about("Runs a scripted scene through the collision engine and reports per-frame statistics")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Collision config to load (.toml or .ron)"),
        )
        .arg(
            Arg::new("frames")
                .short('n')
                .long("frames")
                .value_name("COUNT")
                .help("Number of frames to run")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("seed")
                .short('s')
                .long("seed")
                .value_name("SEED")
                .help("Seed for the scene layout and damage rolls")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("write-config")
                .long("write-config")
                .value_name("FILE")
                .help("Write the default config to FILE and exit"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log every frame")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let level = if matches.get_flag("verbose") { log::LevelFilter::Debug } else { log::LevelFilter::Info };
    logging::init_with_level(level);

    if let Some(path) = matches.get_one::<String>("write-config") {
        CollisionConfig::default()
            .save_to_file(path)
            .with_context(|| format!("Failed to write config to {path}"))?;
        info!("Wrote default config to {path}");
        return Ok(());
    }

    let config = match matches.get_one::<String>("config") {
        Some(path) => CollisionConfig::load_from_file(path).with_context(|| format!("Failed to load config {path}"))?,
        None => CollisionConfig::default(),
    };
    let frames = matches.get_one::<u32>("frames").copied().unwrap_or(DEFAULT_FRAMES);
    let seed = matches.get_one::<u64>("seed").copied().unwrap_or(config.rng_seed);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut scene = Scene::build(&mut rng, config.platform_tolerance);
    info!(
        "Scene ready: {} characters, {} particles",
        scene.world.characters.len(),
        scene.world.particles.len()
    );

    let mut collisions = CollisionSystem::new(config);
    collisions.events_mut().register_handler(EventType::Mounted, Box::new(AttachmentLog));
    collisions.events_mut().register_handler(EventType::PlatformAttached, Box::new(AttachmentLog));
    collisions.events_mut().register_handler(EventType::PlatformDetached, Box::new(AttachmentLog));

    let mut damage = StandardDamage::new(seed);
    let mut totals = Totals::default();

    for _ in 0..frames {
        scene.volley();
        let report = collisions.run_frame(&mut scene.world, &mut damage);
        if report.stats.frame % REPORT_INTERVAL == 0 {
            info!("{}", report.stats);
        }
        totals.add(&report);
        scene.step();
    }

    info!(
        "{} frames: {} candidates ({} dropped), {} mounts, {} chr-chr, {} chr-prt, {} particles removed",
        totals.frames, totals.candidates, totals.dropped, totals.mounts, totals.chr_chr, totals.chr_prt, totals.terminated
    );
    let mut events: Vec<_> = totals.events.iter().collect();
    events.sort_by_key(|(kind, _)| format!("{kind:?}"));
    for (kind, count) in events {
        info!("  {kind:?}: {count}");
    }

    if let Some(guard) = scene.world.character(scene.guard) {
        info!("Guard life {:.1}/{:.1}", f64::from(guard.life) / 256.0, f64::from(guard.life_max) / 256.0);
    }
    if let Some(archer) = scene.world.character(scene.archer) {
        debug!("Archer {} at {:?}", scene.archer, archer.pos);
    }
    if let Some(collector) = scene.world.character(scene.collector) {
        info!("Collector holds {} money", collector.money);
    }
    if let Some(raft) = scene.world.character(scene.raft) {
        info!("Raft carries {:.0} weight", raft.holding_weight);
    }

    Ok(())
}

use std::collections::HashSet;

use approx::assert_relative_eq;

use super::walker;
use crate::config::CollisionConfig;
use crate::events::CollisionEvent;
use crate::foundation::math::Vec3;
use crate::geometry::Bumper;
use crate::physics::CollisionSystem;
use crate::world::{Character, DamageRange, Particle, StandardDamage, TeamId, World};

fn arrow(pos: Vec3, vel: Vec3) -> Particle {
    let mut prt = Particle::new(pos, vel, Bumper::new(4.0, 5.6, 4.0));
    prt.team = TeamId::EVIL;
    prt.damage = DamageRange::new(512, 0);
    prt.profile.allow_push = true;
    prt
}

#[test]
fn test_every_pair_is_stored_once() {
    let mut system = CollisionSystem::new(CollisionConfig::default());
    let mut world = World::new();
    for pos in [Vec3::zeros(), Vec3::new(12.0, 0.0, 0.0), Vec3::new(6.0, 10.0, 0.0)] {
        world.spawn_character(walker(pos));
    }
    let mut sink = StandardDamage::new(1);

    let report = system.run_frame(&mut world, &mut sink);

    let pairs: HashSet<_> = system
        .candidates()
        .iter()
        .filter_map(|c| c.characters())
        .map(|(a, b)| (a.min(b), a.max(b)))
        .collect();
    assert_eq!(pairs.len(), 3);
    assert_eq!(system.candidates().len(), 3);
    assert_eq!(report.stats.candidates, 3);
    assert_eq!(report.stats.duplicates, 3);
}

#[test]
fn test_candidates_are_processed_earliest_first() {
    let mut system = CollisionSystem::new(CollisionConfig::default());
    let mut world = World::new();
    world.spawn_character(walker(Vec3::zeros()));
    // already touching, and one that arrives mid-frame
    world.spawn_character(walker(Vec3::new(15.0, 0.0, 0.0)));
    let mut late = walker(Vec3::new(-30.0, 0.0, 0.0));
    late.vel = Vec3::new(20.0, 0.0, 0.0);
    world.spawn_character(late);
    let mut sink = StandardDamage::new(1);

    system.run_frame(&mut world, &mut sink);

    let tmins: Vec<f32> = system.candidates().iter().map(|c| c.tmin).collect();
    assert!(tmins.len() >= 2);
    assert!(tmins.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_quiet_world_settles_after_one_frame() {
    let mut system = CollisionSystem::new(CollisionConfig::default());
    let mut world = World::new();
    let chrs: Vec<_> = [0.0, 200.0, 400.0]
        .into_iter()
        .map(|x| world.spawn_character(walker(Vec3::new(x, 0.0, 0.0))))
        .collect();
    world.spawn_particle(arrow(Vec3::new(-300.0, 0.0, 20.0), Vec3::zeros()));
    let mut sink = StandardDamage::new(1);

    system.run_frame(&mut world, &mut sink);
    let before: Vec<(Vec3, Vec3)> = chrs
        .iter()
        .map(|&c| world.character(c).map(|chr| (chr.pos, chr.vel)).unwrap())
        .collect();

    let report = system.run_frame(&mut world, &mut sink);
    let after: Vec<(Vec3, Vec3)> = chrs
        .iter()
        .map(|&c| world.character(c).map(|chr| (chr.pos, chr.vel)).unwrap())
        .collect();

    assert_eq!(before, after);
    assert_eq!(report.stats.mounts, 0);
    assert_eq!(report.stats.platforms_attached, 0);
    assert_eq!(report.stats.platforms_detached, 0);
    assert_eq!(report.stats.chr_chr_collisions, 0);
    assert_eq!(report.stats.chr_prt_collisions, 0);
    assert!(report.events.is_empty());
    for &c in &chrs {
        let chr = world.character(c).unwrap();
        assert!(chr.phys.is_settled());
        assert_eq!(chr.on_platform, None);
        assert_eq!(chr.attached_to, None);
    }
}

#[test]
fn test_arrow_is_stopped_by_full_damage() {
    let mut system = CollisionSystem::new(CollisionConfig::default());
    let mut world = World::new();
    let mut guard = walker(Vec3::zeros());
    guard.team = TeamId::GOOD;
    let guard = world.spawn_character(guard);
    let shot = world.spawn_particle(arrow(Vec3::new(12.0, 0.0, 20.0), Vec3::new(-6.0, 0.0, 0.0)));
    let life = world.character(guard).unwrap().life;
    let mut sink = StandardDamage::new(1);

    let report = system.run_frame(&mut world, &mut sink);

    assert_eq!(report.stats.chr_prt_collisions, 1);
    assert_eq!(world.character(guard).unwrap().life, life - 512);

    // recoil cancelled the arrow's motion during the flush
    let prt = world.particle(shot).unwrap();
    assert_relative_eq!(prt.vel, Vec3::zeros(), epsilon = 1e-5);
    assert!(prt.phys.is_settled());
}

#[test]
fn test_coin_is_collected_and_removed() {
    let mut system = CollisionSystem::new(CollisionConfig::default());
    let mut world = World::new();
    let mut hero = walker(Vec3::zeros());
    hero.team = TeamId::GOOD;
    hero.can_grab_money = true;
    let hero = world.spawn_character(hero);

    let mut coin = Particle::new(Vec3::new(5.0, 0.0, 10.0), Vec3::zeros(), Bumper::new(4.0, 5.6, 4.0));
    coin.profile.end_bump = true;
    coin.profile.bump_money = 25;
    let coin = world.spawn_particle(coin);
    let mut sink = StandardDamage::new(1);

    let report = system.run_frame(&mut world, &mut sink);

    assert_eq!(world.character(hero).unwrap().money, 25);
    assert!(world.particle(coin).is_none());
    assert_eq!(report.stats.particles_terminated, 1);

    let payloads: Vec<_> = report.events.into_iter().map(|e| e.payload).collect();
    assert!(payloads.contains(&CollisionEvent::BumpParticles { character: hero, particle: coin }));
    assert!(payloads.contains(&CollisionEvent::ParticleTerminated { particle: coin }));
}

#[test]
fn test_falling_rider_lands_on_mount() {
    let mut system = CollisionSystem::new(CollisionConfig::default());
    let mut world = World::new();

    let mut horse = Character::new(Vec3::zeros(), Bumper::new(20.0, 28.0, 60.0));
    horse.is_mount = true;
    horse.grip_offset = Some(Vec3::new(0.0, 0.0, 50.0));
    let horse = world.spawn_character(horse);

    let mut knight = walker(Vec3::new(0.0, 0.0, 55.0));
    knight.vel = Vec3::new(0.0, 0.0, -4.0);
    let knight = world.spawn_character(knight);
    let mut sink = StandardDamage::new(1);

    let report = system.run_frame(&mut world, &mut sink);

    assert_eq!(report.stats.mounts, 1);
    assert_eq!(world.character(knight).unwrap().attached_to, Some(horse));
    assert!(report
        .events
        .iter()
        .any(|e| e.payload == CollisionEvent::Mounted { rider: knight, mount: horse }));
}

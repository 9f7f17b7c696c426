//! Scripted scene: a spinning raft with passengers, a horse and a falling
//! knight, an archer shooting at a guard, and a field of coins.

use std::collections::HashMap;

use collision_engine::prelude::*;
use collision_engine::world::INFINITE_WEIGHT;
use rand::rngs::StdRng;
use rand::Rng;

const GRAVITY: f32 = 1.0;
const VOLLEY_INTERVAL: u32 = 15;
const RAFT_SPIN: u16 = 0x40;

/// World plus the handles the script drives
pub struct Scene {
    pub world: World,
    /// Moving, spinning platform
    pub raft: CharacterRef,
    /// Target of the arrows
    pub guard: CharacterRef,
    pub archer: CharacterRef,
    /// Walks through the coin field
    pub collector: CharacterRef,
}

fn walker(pos: Vec3, team: TeamId) -> Character {
    let mut chr = Character::new(pos, Bumper::new(10.0, 14.0, 40.0));
    chr.team = team;
    chr
}

impl Scene {
    /// Lay out the scene
    pub fn build(rng: &mut StdRng, platform_tolerance: f32) -> Self {
        let mut world = World::new();

        let mut raft = Character::new(Vec3::zeros(), Bumper::new(60.0, 84.0, 20.0));
        raft.platform = true;
        raft.can_use_platforms = false;
        raft.phys.weight = INFINITE_WEIGHT;
        raft.vel = Vec3::new(1.0, 0.0, 0.0);
        raft.update_collision_volumes(platform_tolerance);
        let raft = world.spawn_character(raft);

        for x in [-25.0, 25.0] {
            world.spawn_character(walker(Vec3::new(x, 0.0, 24.0), TeamId::GOOD));
        }

        let mut horse = Character::new(Vec3::new(300.0, 0.0, 0.0), Bumper::new(20.0, 28.0, 60.0));
        horse.is_mount = true;
        horse.grip_offset = Some(Vec3::new(0.0, 0.0, 50.0));
        world.spawn_character(horse);
        world.spawn_character(walker(Vec3::new(300.0, 0.0, 90.0), TeamId::GOOD));

        let guard = world.spawn_character(walker(Vec3::new(-300.0, 0.0, 0.0), TeamId::GOOD));
        let mut archer = walker(Vec3::new(-500.0, 0.0, 0.0), TeamId::EVIL);
        archer.is_ranged = true;
        let archer = world.spawn_character(archer);

        let mut collector = walker(Vec3::new(150.0, 200.0, 0.0), TeamId::GOOD);
        collector.can_grab_money = true;
        collector.vel = Vec3::new(0.0, 3.0, 0.0);
        let collector = world.spawn_character(collector);

        for _ in 0..24 {
            let pos = Vec3::new(rng.gen_range(130.0..170.0), rng.gen_range(220.0..700.0), 5.0);
            let mut coin = Particle::new(pos, Vec3::zeros(), Bumper::new(4.0, 5.6, 4.0));
            coin.profile.end_bump = true;
            coin.profile.bump_money = rng.gen_range(1..=25);
            world.spawn_particle(coin);
        }

        Self { world, raft, guard, archer, collector }
    }

    /// Fire an arrow from the archer at the guard every few frames
    pub fn volley(&mut self) {
        if self.world.frame % VOLLEY_INTERVAL != 1 {
            return;
        }
        let (Some(archer), Some(guard)) = (self.world.character(self.archer), self.world.character(self.guard)) else {
            return;
        };
        if !archer.alive || !guard.alive {
            return;
        }

        let start = archer.pos + Vec3::new(15.0, 0.0, 20.0);
        let mut arrow = Particle::new(start, Vec3::new(8.0, 0.0, 0.0), Bumper::new(3.0, 4.2, 3.0));
        arrow.team = archer.team;
        arrow.owner = Some(self.archer);
        arrow.damage = DamageRange::new(256, 128);
        arrow.damage_type = DamageType::Poke;
        arrow.profile.allow_push = true;
        arrow.profile.end_bump = true;
        self.world.spawn_particle(arrow);
    }

    /// Move everything by one frame
    ///
    /// Riders on a platform are carried by its horizontal motion, and
    /// mounted riders sit on their mount's grip.
    pub fn step(&mut self) {
        let anchors: HashMap<usize, (Vec3, Vec3)> = self
            .world
            .characters
            .iter()
            .map(|(index, chr)| (index, (chr.pos + chr.grip_offset.unwrap_or_else(Vec3::zeros), chr.vel)))
            .collect();

        if let Some(raft) = self.world.character_mut(self.raft) {
            raft.facing_old = raft.facing;
            raft.facing = raft.facing.wrapping_add(RAFT_SPIN);
        }

        for (index, chr) in self.world.characters.iter_mut() {
            chr.pos_old = chr.pos;
            chr.vel_old = chr.vel;
            if index != self.raft.0 {
                chr.facing_old = chr.facing;
            }

            if let Some((grip, _)) = chr.attached_to.and_then(|m| anchors.get(&m.0)) {
                chr.pos = *grip;
                chr.vel = Vec3::zeros();
                continue;
            }

            let carried = chr
                .on_platform
                .and_then(|p| anchors.get(&p.0))
                .map_or_else(Vec3::zeros, |(_, vel)| Vec3::new(vel.x, vel.y, 0.0));

            if !chr.flying && !chr.platform {
                chr.vel.z -= GRAVITY;
            }
            chr.pos += chr.vel + carried;

            let floor = chr.enviro.walk_level;
            if chr.pos.z < floor {
                chr.pos.z = floor;
                chr.vel.z = chr.vel.z.max(0.0);
            }
        }

        for (_, prt) in self.world.particles.iter_mut() {
            prt.pos_old = prt.pos;
            prt.pos += prt.vel;
            if prt.pos.z < 0.0 {
                prt.pos.z = 0.0;
                prt.vel = Vec3::zeros();
            }
        }
    }
}

//! Entity store consumed by the collision pass
//!
//! Characters and particles live in slot arenas and are addressed by small
//! integer handles. Slots are recycled, so a handle kept across a frame
//! boundary may point at a different object or at nothing; every consumer
//! revalidates through [`World::character`] / [`World::particle`] before use.

use std::fmt;

use crate::foundation::collections::EntityArena;

pub mod character;
pub mod damage;
pub mod particle;

pub use character::{
    AiState, AlertFlags, BlockArc, Character, Environment, MissileTreatment, PhysicsData, Slot,
    INFINITE_WEIGHT, MAX_MONEY,
};
pub use damage::{DamageFx, DamageHit, DamageRange, DamageSink, DamageType, StandardDamage};
pub use particle::{Particle, ParticleProfile};

/// Handle to a character slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharacterRef(pub usize);

/// Handle to a particle slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleRef(pub usize);

impl fmt::Display for CharacterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chr#{}", self.0)
    }
}

impl fmt::Display for ParticleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "prt#{}", self.0)
    }
}

/// Number of teams, one per letter plus the damage-tile team
pub const TEAM_MAX: usize = 27;

/// Team index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TeamId(pub u8);

impl TeamId {
    /// Evil team
    pub const EVIL: TeamId = TeamId(b'E' - b'A');
    /// Good team
    pub const GOOD: TeamId = TeamId(b'G' - b'A');
    /// Neutral team, hates nobody and is hated by nobody
    pub const NULL: TeamId = TeamId(b'N' - b'A');
    /// Team of damage tiles
    pub const DAMAGE: TeamId = TeamId(26);

    fn slot(self) -> usize {
        usize::from(self.0) % TEAM_MAX
    }
}

/// Who hates whom
#[derive(Debug, Clone)]
pub struct TeamTable {
    hates: [[bool; TEAM_MAX]; TEAM_MAX],
}

impl TeamTable {
    /// Every team hates every other team, except around the neutral team
    pub fn new() -> Self {
        let mut hates = [[false; TEAM_MAX]; TEAM_MAX];
        let null = TeamId::NULL.slot();
        for (a, row) in hates.iter_mut().enumerate() {
            for (b, cell) in row.iter_mut().enumerate() {
                *cell = a != b && a != null && b != null;
            }
        }
        Self { hates }
    }

    /// Whether `a` hates `b`
    pub fn hates(&self, a: TeamId, b: TeamId) -> bool {
        self.hates[a.slot()][b.slot()]
    }

    /// Make `a` stop hating `b`
    pub fn ally(&mut self, a: TeamId, b: TeamId) {
        self.hates[a.slot()][b.slot()] = false;
    }
}

impl Default for TeamTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Characters, particles and the frame counter
#[derive(Debug, Clone)]
pub struct World {
    /// Character store
    pub characters: EntityArena<Character>,
    /// Particle store
    pub particles: EntityArena<Particle>,
    /// Team relations
    pub teams: TeamTable,
    /// Current frame, starts at 1
    pub frame: u32,
}

impl World {
    /// Create an empty world on frame 1
    pub fn new() -> Self {
        Self {
            characters: EntityArena::new(),
            particles: EntityArena::new(),
            teams: TeamTable::new(),
            frame: 1,
        }
    }

    /// Add a character
    pub fn spawn_character(&mut self, character: Character) -> CharacterRef {
        CharacterRef(self.characters.insert(character))
    }

    /// Add a particle
    pub fn spawn_particle(&mut self, particle: Particle) -> ParticleRef {
        ParticleRef(self.particles.insert(particle))
    }

    /// Remove a particle, returning it if the slot was live
    pub fn remove_particle(&mut self, prt: ParticleRef) -> Option<Particle> {
        self.particles.remove(prt.0)
    }

    /// Look up a live character
    pub fn character(&self, chr: CharacterRef) -> Option<&Character> {
        self.characters.get(chr.0)
    }

    /// Look up a live character mutably
    pub fn character_mut(&mut self, chr: CharacterRef) -> Option<&mut Character> {
        self.characters.get_mut(chr.0)
    }

    /// Borrow two different characters mutably
    pub fn character_pair_mut(
        &mut self,
        a: CharacterRef,
        b: CharacterRef,
    ) -> Option<(&mut Character, &mut Character)> {
        self.characters.get_pair_mut(a.0, b.0)
    }

    /// Look up a live particle
    pub fn particle(&self, prt: ParticleRef) -> Option<&Particle> {
        self.particles.get(prt.0)
    }

    /// Look up a live particle mutably
    pub fn particle_mut(&mut self, prt: ParticleRef) -> Option<&mut Particle> {
        self.particles.get_mut(prt.0)
    }

    /// Whether a character handle points at an in-game character
    pub fn character_in_game(&self, chr: Option<CharacterRef>) -> bool {
        chr.and_then(|chr| self.character(chr)).is_some_and(|c| c.in_game)
    }

    /// Whether a particle handle points at an in-game particle
    pub fn particle_in_game(&self, prt: ParticleRef) -> bool {
        self.particle(prt).is_some_and(|p| p.in_game && !p.terminate_requested)
    }

    /// Whether team `a` hates team `b`
    pub fn team_hates(&self, a: TeamId, b: TeamId) -> bool {
        self.teams.hates(a, b)
    }

    /// Follow `attached_to` links down to the bottom of a holding chain
    ///
    /// With `stop_at_non_item` the walk ends at the first character that is
    /// not an item, which finds the wielder of a weapon rather than the
    /// wielder's mount. Returns `None` if `start` is not in game.
    pub fn lowest_attachment(&self, start: CharacterRef, stop_at_non_item: bool) -> Option<CharacterRef> {
        let mut current = start;
        let mut object = self.character(current).filter(|c| c.in_game)?;

        // a chain can never be longer than the number of characters
        for _ in 0..self.characters.len() {
            if stop_at_non_item && !object.is_item {
                break;
            }

            let Some(next) = object.attached_to else {
                break;
            };
            let Some(next_object) = self.character(next).filter(|c| c.in_game) else {
                break;
            };
            if next == start {
                break;
            }

            current = next;
            object = next_object;
        }

        Some(current)
    }

    /// Whether `rider` could climb onto `mount`
    pub fn can_mount(&self, rider: CharacterRef, mount: CharacterRef) -> bool {
        if rider == mount {
            return false;
        }

        let (Some(r), Some(m)) = (self.character(rider), self.character(mount)) else {
            return false;
        };

        r.in_game
            && m.in_game
            && r.alive
            && m.alive
            && m.is_mount
            && m.held(Slot::Left).is_none()
            && !r.is_item
            && r.attached_to.is_none()
    }

    /// Take `amount` mana (8.8 fixed point) from a character
    ///
    /// Characters who can channel pay the shortfall with life and may die
    /// doing so. Returns whether the cost was paid.
    pub fn cost_mana(&mut self, payer: CharacterRef, amount: i32) -> bool {
        let Some(chr) = self.character_mut(payer) else {
            return false;
        };

        let remaining = chr.mana - amount;
        if remaining >= 0 {
            chr.mana = remaining.min(chr.mana_max.max(0));
            return true;
        }

        chr.mana = 0;
        if !chr.can_channel {
            return false;
        }

        chr.life += remaining;
        if chr.life <= 0 {
            chr.alive = false;
        }
        true
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::geometry::Bumper;

    fn body() -> Character {
        Character::new(Vec3::zeros(), Bumper::new(10.0, 14.0, 40.0))
    }

    #[test]
    fn test_team_table_neutral() {
        let teams = TeamTable::new();
        assert!(teams.hates(TeamId::GOOD, TeamId::EVIL));
        assert!(!teams.hates(TeamId::GOOD, TeamId::GOOD));
        assert!(!teams.hates(TeamId::NULL, TeamId::EVIL));
        assert!(!teams.hates(TeamId::EVIL, TeamId::NULL));
    }

    #[test]
    fn test_lowest_attachment_walks_chain() {
        let mut world = World::new();
        let horse = world.spawn_character(body());
        let knight = world.spawn_character(body());
        let sword = world.spawn_character(body());

        world.character_mut(knight).unwrap().attached_to = Some(horse);
        let blade = world.character_mut(sword).unwrap();
        blade.is_item = true;
        blade.attached_to = Some(knight);

        assert_eq!(world.lowest_attachment(sword, false), Some(horse));
        assert_eq!(world.lowest_attachment(sword, true), Some(knight));
        assert_eq!(world.lowest_attachment(horse, false), Some(horse));
    }

    #[test]
    fn test_lowest_attachment_survives_cycle() {
        let mut world = World::new();
        let a = world.spawn_character(body());
        let b = world.spawn_character(body());
        world.character_mut(a).unwrap().attached_to = Some(b);
        world.character_mut(b).unwrap().attached_to = Some(a);

        assert_eq!(world.lowest_attachment(a, false), Some(b));
    }

    #[test]
    fn test_can_mount_rules() {
        let mut world = World::new();
        let rider = world.spawn_character(body());
        let horse = world.spawn_character(body());
        assert!(!world.can_mount(rider, horse));

        world.character_mut(horse).unwrap().is_mount = true;
        assert!(world.can_mount(rider, horse));
        assert!(!world.can_mount(horse, horse));

        world.character_mut(rider).unwrap().is_item = true;
        assert!(!world.can_mount(rider, horse));
    }

    #[test]
    fn test_cost_mana_channels_life() {
        let mut world = World::new();
        let mage = world.spawn_character(body());
        {
            let chr = world.character_mut(mage).unwrap();
            chr.mana = 256;
            chr.mana_max = 512;
        }
        assert!(world.cost_mana(mage, 128));
        assert_eq!(world.character(mage).unwrap().mana, 128);

        assert!(!world.cost_mana(mage, 1024));
        assert_eq!(world.character(mage).unwrap().mana, 0);

        world.character_mut(mage).unwrap().can_channel = true;
        let life = world.character(mage).unwrap().life;
        assert!(world.cost_mana(mage, 256));
        assert_eq!(world.character(mage).unwrap().life, life - 256);
    }

    #[test]
    fn test_particle_handles_go_stale() {
        let mut world = World::new();
        let spark = world.spawn_particle(Particle::new(Vec3::zeros(), Vec3::zeros(), Bumper::new(2.0, 2.8, 2.0)));
        assert!(world.particle_in_game(spark));

        world.particle_mut(spark).unwrap().terminate_requested = true;
        assert!(!world.particle_in_game(spark));

        world.remove_particle(spark);
        assert!(!world.particle_in_game(spark));
        assert!(world.particle(spark).is_none());
    }
}

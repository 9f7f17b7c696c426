//! Damage types and the damage sink
//!
//! The collision pass decides *whether* and *how hard* a particle hits; the
//! sink decides what that does to the target's life.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::foundation::math::Facing;

use super::character::{Character, DEFAULT_DAMAGE_TIME};
use super::{CharacterRef, TeamId};

/// Kind of damage a particle deals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DamageType {
    /// Edged weapons
    #[default]
    Slash,
    /// Blunt weapons
    Crush,
    /// Piercing weapons
    Poke,
    /// Holy magic
    Holy,
    /// Dark magic
    Evil,
    /// Fire
    Fire,
    /// Cold
    Ice,
    /// Lightning
    Zap,
}

bitflags::bitflags! {
    /// Damage modifiers carried by a particle
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DamageFx: u32 {
        /// Ignores armour
        const ARMO = 1 << 1;
        /// Cannot be blocked
        const NBLOC = 1 << 2;
        /// Only damages the character it is attached to
        const ARRO = 1 << 3;
        /// Turns the target to face the attacker
        const TURN = 1 << 4;
        /// Does not grant invulnerability time
        const TIME = 1 << 5;
    }
}

/// Base damage plus a random extra, both 8.8 fixed point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DamageRange {
    /// Guaranteed part
    pub base: i32,
    /// Random extra, `0..=rand`
    pub rand: i32,
}

impl DamageRange {
    /// Create a damage range
    pub fn new(base: i32, rand: i32) -> Self {
        Self { base, rand }
    }

    /// Largest magnitude this range can produce
    pub fn max_damage(&self) -> i32 {
        self.base.abs() + self.rand.abs()
    }

    /// Scale both parts by a factor
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            base: (self.base as f32 * factor) as i32,
            rand: (self.rand as f32 * factor) as i32,
        }
    }
}

/// A single hit handed to the damage sink
#[derive(Debug, Clone, Copy)]
pub struct DamageHit {
    /// Attack heading relative to the target's facing
    pub direction: Facing,
    /// Amount
    pub damage: DamageRange,
    /// Kind
    pub damage_type: DamageType,
    /// Team of the attacker
    pub team: TeamId,
    /// Character credited with the hit
    pub attacker: Option<CharacterRef>,
    /// Modifiers
    pub effects: DamageFx,
}

/// Applies hits to characters
pub trait DamageSink {
    /// Apply a hit and return the damage actually dealt
    fn apply_damage(&mut self, target: &mut Character, hit: &DamageHit) -> i32;
}

/// Rolls the damage range and subtracts it from life
///
/// Negative damage heals up to `life_max`. A character whose life reaches
/// zero dies.
#[derive(Debug)]
pub struct StandardDamage {
    rng: StdRng,
}

impl StandardDamage {
    /// Create a sink with a fixed seed
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    fn roll(&mut self, range: &DamageRange) -> i32 {
        let spread = range.rand.abs();
        let extra = if spread > 0 { self.rng.gen_range(0..=spread) } else { 0 };
        if range.base < 0 {
            range.base - extra
        } else {
            range.base + extra
        }
    }
}

impl DamageSink for StandardDamage {
    fn apply_damage(&mut self, target: &mut Character, hit: &DamageHit) -> i32 {
        if !target.alive || target.invictus {
            return 0;
        }

        let amount = self.roll(&hit.damage);
        if amount < 0 {
            let healed = (-amount).min(target.life_max - target.life).max(0);
            target.life += healed;
            return -healed;
        }

        let dealt = amount.min(target.life);
        target.life -= dealt;
        if target.life <= 0 {
            target.alive = false;
        }

        if dealt > 0 && !hit.effects.contains(DamageFx::TIME) {
            target.damage_time = DEFAULT_DAMAGE_TIME;
        }

        dealt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::geometry::Bumper;

    fn hit(base: i32, rand: i32) -> DamageHit {
        DamageHit {
            direction: 0,
            damage: DamageRange::new(base, rand),
            damage_type: DamageType::Slash,
            team: TeamId::NULL,
            attacker: None,
            effects: DamageFx::empty(),
        }
    }

    #[test]
    fn test_fixed_damage_is_exact() {
        let mut sink = StandardDamage::new(1);
        let mut target = Character::new(Vec3::zeros(), Bumper::new(10.0, 14.0, 30.0));
        let life = target.life;

        assert_eq!(sink.apply_damage(&mut target, &hit(512, 0)), 512);
        assert_eq!(target.life, life - 512);
        assert_eq!(target.damage_time, DEFAULT_DAMAGE_TIME);
    }

    #[test]
    fn test_lethal_damage_is_capped_and_kills() {
        let mut sink = StandardDamage::new(1);
        let mut target = Character::new(Vec3::zeros(), Bumper::new(10.0, 14.0, 30.0));
        target.life = 100;

        assert_eq!(sink.apply_damage(&mut target, &hit(1000, 50)), 100);
        assert!(!target.alive);
    }

    #[test]
    fn test_negative_damage_heals() {
        let mut sink = StandardDamage::new(1);
        let mut target = Character::new(Vec3::zeros(), Bumper::new(10.0, 14.0, 30.0));
        target.life = target.life_max - 100;

        assert_eq!(sink.apply_damage(&mut target, &hit(-400, 0)), -100);
        assert_eq!(target.life, target.life_max);
    }
}

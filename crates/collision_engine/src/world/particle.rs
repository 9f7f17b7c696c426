//! Particle state read and written by the collision pass

use crate::foundation::math::{Facing, Vec3};
use crate::geometry::{Bumper, OctBB};

use super::character::PhysicsData;
use super::{CharacterRef, DamageFx, DamageRange, DamageType, TeamId};

/// Behaviour shared by every particle spawned from the same template
#[derive(Debug, Clone, Default)]
pub struct ParticleProfile {
    /// Collisions push the particle and its target
    pub allow_push: bool,
    /// Turns to face its velocity
    pub rotate_to_face: bool,
    /// Seeks a target
    pub homing: bool,
    /// Ends on the first character it bumps
    pub end_bump: bool,
    /// Ends when it lands
    pub end_ground: bool,
    /// Coin value, zero for anything that is not money
    pub bump_money: u16,
    /// Number of particles spawned on the target when bumping
    pub bump_spawn_amount: u32,
    /// Only bumps characters its team hates
    pub hate_only: bool,
    /// Only damages its own team
    pub only_damage_friendly: bool,
    /// Can hit allies
    pub friendly_fire: bool,
    /// Owner intelligence scales damage
    pub int_damage_bonus: bool,
    /// Owner wisdom scales damage
    pub wis_damage_bonus: bool,
    /// Damage modifiers
    pub damfx: DamageFx,
    /// Ticks of grog applied on hit
    pub grog_time: u32,
    /// Ticks of daze applied on hit
    pub daze_time: u32,
    /// Squashes whatever it hits
    pub cause_pancake: bool,
    /// Spawns an enchantment on hit
    pub has_enchant: bool,
    /// Bounce damping on platforms
    pub dampen: f32,
    /// Profile of the object that fired it, for vulnerability checks
    pub source_profile: Option<u32>,
}

impl ParticleProfile {
    /// Whether the particle must take part in bump handling
    pub fn needs_bump(&self) -> bool {
        self.end_bump || self.end_ground || self.bump_spawn_amount > 0 || self.bump_money != 0
    }

    /// Whether the particle applies a status effect
    pub fn does_status_effect(&self) -> bool {
        self.grog_time != 0 || self.daze_time != 0
    }
}

/// A particle
#[derive(Debug, Clone)]
pub struct Particle {
    /// Part of the running game
    pub in_game: bool,
    /// Not drawn and not interacting
    pub hidden: bool,

    /// Position of the centre
    pub pos: Vec3,
    /// Position last frame
    pub pos_old: Vec3,
    /// Velocity in units per frame
    pub vel: Vec3,
    /// Heading
    pub facing: Facing,

    /// Footprint used for platform tests
    pub bump_min: Bumper,
    /// Footprint used for hits
    pub bump_padded: Bumper,
    /// Volume derived from `bump_padded`
    pub cv: OctBB,

    /// Team membership
    pub team: TeamId,
    /// Who fired it
    pub owner: Option<CharacterRef>,
    /// Weapon or character it is stuck to
    pub attached_to: Option<CharacterRef>,

    /// Platform it rests on
    pub on_platform: Option<CharacterRef>,
    /// Frame the platform was last confirmed
    pub platform_update: u32,
    /// Best platform found this frame
    pub target_platform: Option<CharacterRef>,
    /// Score of `target_platform`
    pub target_platform_score: f32,

    /// Damage dealt on hit (8.8 fixed point)
    pub damage: DamageRange,
    /// Kind of damage
    pub damage_type: DamageType,
    /// Life stolen per hit (8.8 fixed point)
    pub life_drain: i32,
    /// Mana stolen per hit (8.8 fixed point)
    pub mana_drain: i32,

    /// Accumulators
    pub phys: PhysicsData,
    /// Asked to be removed at the end of the frame
    pub terminate_requested: bool,

    /// Template behaviour
    pub profile: ParticleProfile,
}

impl Particle {
    /// Create a live particle at `pos` moving at `vel`
    pub fn new(pos: Vec3, vel: Vec3, bump: Bumper) -> Self {
        Self {
            in_game: true,
            hidden: false,
            pos,
            pos_old: pos - vel,
            vel,
            facing: 0,
            bump_min: bump,
            bump_padded: bump,
            cv: OctBB::from_bumper(&bump),
            team: TeamId::NULL,
            owner: None,
            attached_to: None,
            on_platform: None,
            platform_update: 0,
            target_platform: None,
            target_platform_score: 0.0,
            damage: DamageRange::default(),
            damage_type: DamageType::default(),
            life_drain: 0,
            mana_drain: 0,
            phys: PhysicsData {
                weight: 1,
                ..PhysicsData::default()
            },
            terminate_requested: false,
            profile: ParticleProfile::default(),
        }
    }

    /// Change the footprint, padding the hit volume to at least `min_padding`
    pub fn set_bump(&mut self, bump: Bumper, min_padding: f32) {
        self.bump_min = bump;
        self.bump_padded = Bumper::new(
            bump.size.max(min_padding),
            bump.size_big.max(min_padding * std::f32::consts::SQRT_2),
            bump.height.max(min_padding),
        );
        self.cv = OctBB::from_bumper(&self.bump_padded);
    }

    /// Whether the particle deals any damage
    pub fn does_damage(&self) -> bool {
        self.damage.max_damage() > 0
    }

    /// Whether the particle needs to be in the broad-phase index
    pub fn is_interesting(&self) -> bool {
        let has_bump_size = self.bump_min.size != 0.0 && self.bump_min.height != 0.0;
        has_bump_size
            || self.profile.needs_bump()
            || self.profile.has_enchant
            || self.does_damage()
            || self.profile.does_status_effect()
            || self.profile.cause_pancake
    }

    /// Whether the particle can be considered for collisions at all
    pub fn is_collidable(&self) -> bool {
        self.in_game && !self.hidden && !self.terminate_requested && self.is_interesting()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uninteresting_particle_is_skipped() {
        let mut prt = Particle::new(Vec3::zeros(), Vec3::zeros(), Bumper::default());
        assert!(!prt.is_collidable());

        prt.profile.bump_money = 5;
        assert!(prt.is_collidable());

        prt.profile.bump_money = 0;
        prt.damage = DamageRange::new(256, 0);
        assert!(prt.is_collidable());

        prt.hidden = true;
        assert!(!prt.is_collidable());
    }

    #[test]
    fn test_padding_only_grows() {
        let mut prt = Particle::new(Vec3::zeros(), Vec3::zeros(), Bumper::default());
        prt.set_bump(Bumper::new(2.0, 3.0, 40.0), 5.0);

        assert_eq!(prt.bump_min.size, 2.0);
        assert_eq!(prt.bump_padded.size, 5.0);
        assert_eq!(prt.bump_padded.height, 40.0);
        assert!(prt.cv.is_valid());
    }
}

//! Character state read and written by the collision pass
//!
//! Life, mana and damage values are 8.8 fixed point: 256 is one point.

use crate::foundation::math::utils::clip;
use crate::foundation::math::{Facing, Vec3};
use crate::geometry::{Bumper, OctAxis, OctBB};

use super::{CharacterRef, DamageType, TeamId};

/// Weight of an immovable object
pub const INFINITE_WEIGHT: u32 = u32::MAX;

/// Largest amount of money a character can carry
pub const MAX_MONEY: u16 = 9999;

/// Frames of invulnerability after taking damage
pub const DEFAULT_DAMAGE_TIME: u32 = 16;

bitflags::bitflags! {
    /// Events the AI script is told about on its next think
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AlertFlags: u32 {
        /// Touched another object
        const BUMPED = 1 << 0;
        /// Under a grog or daze effect
        const CONFUSED = 1 << 1;
        /// One of our particles damaged something
        const SCORED_A_HIT = 1 << 2;
        /// Hit by something we are vulnerable to
        const HIT_VULNERABLE = 1 << 3;
        /// Climbed onto a mount
        const MOUNTED = 1 << 4;
        /// Someone stepped on us
        const STOOD_ON = 1 << 5;
    }
}

/// Grip slots on a holder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Left hand, also a mount's saddle
    Left = 0,
    /// Right hand
    Right = 1,
}

/// How a character treats incoming missiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissileTreatment {
    /// Missiles hit normally
    #[default]
    Normal,
    /// Missiles bounce off the contact normal
    Deflect,
    /// Missiles are sent back to their owner
    Reflect,
}

/// Mass and per-frame accumulators
#[derive(Debug, Clone, Default)]
pub struct PhysicsData {
    /// Mass, [`INFINITE_WEIGHT`] for immovable objects
    pub weight: u32,
    /// Bounce damping when landing on a platform
    pub dampen: f32,
    /// Position correction from platforms
    pub apos_plat: Vec3,
    /// Position correction from collisions
    pub apos_coll: Vec3,
    /// Velocity correction
    pub avel: Vec3,
}

impl PhysicsData {
    /// Add a velocity correction
    pub fn accumulate_avel(&mut self, dv: &Vec3) {
        self.avel += dv;
    }

    /// Add a platform position correction
    pub fn accumulate_apos_plat(&mut self, dp: &Vec3) {
        self.apos_plat += dp;
    }

    /// Add a collision position correction
    pub fn accumulate_apos_coll(&mut self, dp: &Vec3) {
        self.apos_coll += dp;
    }

    /// Whether every accumulator is zero
    pub fn is_settled(&self) -> bool {
        self.apos_plat == Vec3::zeros() && self.apos_coll == Vec3::zeros() && self.avel == Vec3::zeros()
    }

    /// Apply the accumulators to a position and velocity, then zero them
    pub fn flush(&mut self, pos: &mut Vec3, vel: &mut Vec3) {
        *pos += self.apos_plat + self.apos_coll;
        *vel += self.avel;
        self.apos_plat = Vec3::zeros();
        self.apos_coll = Vec3::zeros();
        self.avel = Vec3::zeros();
    }
}

/// What the character is standing on
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// Height of the terrain under the character
    pub floor_level: f32,
    /// Height of whatever the character walks on, terrain or platform
    pub walk_level: f32,
    /// 0 on the terrain, 1 at one platform tolerance or more above it
    pub grid_lerp: f32,
    /// 0 on the walk surface, 1 at one platform tolerance or more above it
    pub walk_lerp: f32,
    /// Standing on something
    pub grounded: bool,
}

/// AI bookkeeping touched by collisions
#[derive(Debug, Clone, Default)]
pub struct AiState {
    /// Pending alerts
    pub alert: AlertFlags,
    /// Last object that bumped us
    pub bump_last: Option<CharacterRef>,
    /// Last object we hit
    pub hit_last: Option<CharacterRef>,
    /// Last item we used
    pub last_item_used: Option<CharacterRef>,
}

impl AiState {
    /// Record a bump from `other`
    pub fn set_bump_last(&mut self, other: CharacterRef) {
        self.bump_last = Some(other);
        self.alert |= AlertFlags::BUMPED;
    }
}

/// Arc of facings, relative to the character, that block attacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockArc {
    /// Centre of the arc
    pub facing: Facing,
    /// Half-width of the arc
    pub angle: Facing,
}

impl BlockArc {
    /// Whether a relative attack direction falls inside the arc
    pub fn covers(&self, direction: Facing) -> bool {
        // signed distance between the two binary angles
        let offset = direction.wrapping_sub(self.facing) as i16;
        i32::from(offset).unsigned_abs() <= u32::from(self.angle)
    }
}

/// A character
#[derive(Debug, Clone)]
pub struct Character {
    /// Has life left
    pub alive: bool,
    /// Part of the running game
    pub in_game: bool,
    /// Not drawn and not interacting
    pub hidden: bool,
    /// Stowed in someone's inventory
    pub packed: bool,
    /// Can be picked up
    pub is_item: bool,
    /// Can be ridden
    pub is_mount: bool,
    /// Others can stand on it
    pub platform: bool,
    /// Can stand on platforms
    pub can_use_platforms: bool,
    /// Flies instead of walking
    pub flying: bool,
    /// Picks up coins
    pub can_grab_money: bool,
    /// Sold in a shop
    pub is_shop_item: bool,
    /// Skin is overridden by a spell effect
    pub spell_effect_skin: bool,
    /// Fired particles count as ranged attacks
    pub is_ranged: bool,
    /// Team membership
    pub team: TeamId,

    /// Position of the feet
    pub pos: Vec3,
    /// Position last frame
    pub pos_old: Vec3,
    /// Velocity in units per frame
    pub vel: Vec3,
    /// Velocity last frame
    pub vel_old: Vec3,
    /// Heading
    pub facing: Facing,
    /// Heading last frame
    pub facing_old: Facing,
    /// Size scale
    pub fat: f32,

    /// Collision footprint
    pub bump: Bumper,
    /// Volume used for hits
    pub min_cv: OctBB,
    /// Volume used for the broad phase, raised for platforms
    pub max_cv: OctBB,
    /// Offset of the saddle from the position, for mounts
    pub grip_offset: Option<Vec3>,

    /// Holder or mount
    pub attached_to: Option<CharacterRef>,
    /// What is held in each slot
    pub holding: [Option<CharacterRef>; 2],
    /// Platform we are standing on
    pub on_platform: Option<CharacterRef>,
    /// Frame the platform was last confirmed
    pub platform_update: u32,
    /// Weight we put on our platform
    pub platform_weight: f32,
    /// Best platform found this frame
    pub target_platform: Option<CharacterRef>,
    /// Score of `target_platform`
    pub target_platform_score: f32,
    /// Best mount found this frame
    pub target_mount: Option<CharacterRef>,
    /// Score of `target_mount`
    pub target_mount_score: f32,
    /// Weight of everything standing on us
    pub holding_weight: f32,

    /// Mass and accumulators
    pub phys: PhysicsData,
    /// Walk surface
    pub enviro: Environment,
    /// AI bookkeeping
    pub ai: AiState,

    /// Transparency, 255 is opaque
    pub alpha: u8,
    /// Ticks left of the post-dismount grace period
    pub dismount_timer: u32,
    /// What we dismounted from
    pub dismount_object: Option<CharacterRef>,
    /// Ticks of invulnerability left
    pub damage_time: u32,
    /// Ticks before the next attack
    pub reload_time: u32,

    /// Life (8.8 fixed point)
    pub life: i32,
    /// Maximum life (8.8 fixed point)
    pub life_max: i32,
    /// Mana (8.8 fixed point)
    pub mana: i32,
    /// Maximum mana (8.8 fixed point)
    pub mana_max: i32,
    /// Coins
    pub money: u16,
    /// Intelligence in points
    pub intelligence: f32,
    /// Wisdom in points
    pub wisdom: f32,
    /// Strength in points
    pub strength: f32,
    /// Block skill rating
    pub block_skill: i32,

    /// Missile defence
    pub missile_treatment: MissileTreatment,
    /// Mana cost of each deflection, in whole points
    pub missile_cost: u8,
    /// Who pays for deflections, `None` for ourselves
    pub missile_handler: Option<CharacterRef>,
    /// Pays mana costs with life when mana runs out
    pub can_channel: bool,

    /// Cannot be touched at all
    pub invictus: bool,
    /// Current animation frame is a blocking frame
    pub frame_blocking: bool,
    /// Current action is a parry
    pub action_is_parry: bool,
    /// Block arc outside blocking frames
    pub normal_arc: BlockArc,
    /// Block arc during blocking frames
    pub blocking_arc: BlockArc,

    /// Grog effects apply
    pub can_be_grogged: bool,
    /// Daze effects apply
    pub can_be_dazed: bool,
    /// Ticks of grog left
    pub grog_time: u32,
    /// Ticks of daze left
    pub daze_time: u32,

    /// Particles of this damage type refresh attached effects
    pub reaffirm_damage_type: Option<DamageType>,
    /// Source profile we take double damage from
    pub vulnerability: Option<u32>,
}

impl Character {
    /// Create a live, opaque character standing at `pos`
    pub fn new(pos: Vec3, bump: Bumper) -> Self {
        let min_cv = OctBB::from_standing_bumper(&bump);
        Self {
            alive: true,
            in_game: true,
            hidden: false,
            packed: false,
            is_item: false,
            is_mount: false,
            platform: false,
            can_use_platforms: true,
            flying: false,
            can_grab_money: false,
            is_shop_item: false,
            spell_effect_skin: false,
            is_ranged: false,
            team: TeamId::NULL,
            pos,
            pos_old: pos,
            vel: Vec3::zeros(),
            vel_old: Vec3::zeros(),
            facing: 0,
            facing_old: 0,
            fat: 1.0,
            bump,
            min_cv,
            max_cv: min_cv,
            grip_offset: None,
            attached_to: None,
            holding: [None, None],
            on_platform: None,
            platform_update: 0,
            platform_weight: 0.0,
            target_platform: None,
            target_platform_score: 0.0,
            target_mount: None,
            target_mount_score: 0.0,
            holding_weight: 0.0,
            phys: PhysicsData {
                weight: 100,
                dampen: 0.5,
                ..PhysicsData::default()
            },
            enviro: Environment::default(),
            ai: AiState::default(),
            alpha: 255,
            dismount_timer: 0,
            dismount_object: None,
            damage_time: 0,
            reload_time: 0,
            life: 20 << 8,
            life_max: 20 << 8,
            mana: 0,
            mana_max: 0,
            money: 0,
            intelligence: 14.0,
            wisdom: 14.0,
            strength: 10.0,
            block_skill: 0,
            missile_treatment: MissileTreatment::Normal,
            missile_cost: 0,
            missile_handler: None,
            can_channel: false,
            invictus: false,
            frame_blocking: false,
            action_is_parry: false,
            normal_arc: BlockArc::default(),
            blocking_arc: BlockArc::default(),
            can_be_grogged: true,
            can_be_dazed: true,
            grog_time: 0,
            daze_time: 0,
            reaffirm_damage_type: None,
            vulnerability: None,
        }
    }

    /// Rebuild `min_cv` and `max_cv` from the bumper
    ///
    /// Platforms get `platform_tolerance` of extra headroom on `max_cv` so
    /// riders hovering just above are still found by the broad phase.
    pub fn update_collision_volumes(&mut self, platform_tolerance: f32) {
        self.min_cv = OctBB::from_standing_bumper(&self.bump);
        self.max_cv = self.min_cv;
        if self.platform && self.max_cv.is_valid() {
            self.max_cv.maxs[OctAxis::Z] += platform_tolerance;
        }
    }

    /// Whether the character can be considered for collisions at all
    pub fn is_collidable(&self) -> bool {
        self.in_game && !self.hidden && !self.packed && self.bump.has_size()
    }

    /// Height of the top of the hit volume in world space
    pub fn top(&self) -> f32 {
        self.pos.z + self.min_cv.maxs[OctAxis::Z]
    }

    /// Recompute the walk surface from the floor and an optional platform top
    pub fn refresh_environment(&mut self, platform_top: Option<f32>, platform_tolerance: f32) {
        let env = &mut self.enviro;
        env.walk_level = platform_top.map_or(env.floor_level, |top| top.max(env.floor_level));

        let tol = platform_tolerance.max(f32::EPSILON);
        env.grid_lerp = clip((self.pos.z - env.floor_level) / tol, 0.0, 1.0);
        env.walk_lerp = clip((self.pos.z - env.walk_level) / tol, 0.0, 1.0);
        env.grounded = !self.flying && env.walk_lerp < 0.25;
    }

    /// Whether the character is immune to attacks from `direction`
    ///
    /// `direction` is the attack heading relative to our facing.
    pub fn blocks_direction(&self, direction: Facing) -> bool {
        let arc = if self.frame_blocking { self.blocking_arc } else { self.normal_arc };
        arc.angle > 0 && arc.covers(direction)
    }

    /// Held item in a slot
    pub fn held(&self, slot: Slot) -> Option<CharacterRef> {
        self.holding[slot as usize]
    }

    /// Interaction weight; infinite weight maps to a negative value
    pub fn signed_weight(&self) -> f32 {
        if self.phys.weight == INFINITE_WEIGHT {
            -1.0
        } else {
            self.phys.weight as f32 + self.holding_weight
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_volume_headroom() {
        let mut chr = Character::new(Vec3::zeros(), Bumper::new(10.0, 14.0, 30.0));
        chr.platform = true;
        chr.update_collision_volumes(50.0);

        assert_eq!(chr.min_cv.maxs[OctAxis::Z], 30.0);
        assert_eq!(chr.max_cv.maxs[OctAxis::Z], 80.0);
        assert_eq!(chr.max_cv.mins[OctAxis::Z], 0.0);
    }

    #[test]
    fn test_environment_prefers_platform_top() {
        let mut chr = Character::new(Vec3::new(0.0, 0.0, 60.0), Bumper::new(10.0, 14.0, 30.0));
        chr.refresh_environment(None, 50.0);
        assert_eq!(chr.enviro.walk_level, 0.0);
        assert_eq!(chr.enviro.walk_lerp, 1.0);
        assert!(!chr.enviro.grounded);

        chr.refresh_environment(Some(55.0), 50.0);
        assert_eq!(chr.enviro.walk_level, 55.0);
        assert!((chr.enviro.walk_lerp - 0.1).abs() < 1e-6);
        assert_eq!(chr.enviro.grid_lerp, 1.0);
        assert!(chr.enviro.grounded);
    }

    #[test]
    fn test_block_arc_wraps() {
        let arc = BlockArc { facing: 0xF000, angle: 0x2000 };
        assert!(arc.covers(0x0800));
        assert!(arc.covers(0xE000));
        assert!(!arc.covers(0x4000));
    }

    #[test]
    fn test_flush_zeroes_accumulators() {
        let mut phys = PhysicsData::default();
        phys.accumulate_avel(&Vec3::new(1.0, 0.0, 0.0));
        phys.accumulate_apos_coll(&Vec3::new(0.0, 2.0, 0.0));

        let mut pos = Vec3::zeros();
        let mut vel = Vec3::zeros();
        phys.flush(&mut pos, &mut vel);

        assert_eq!(pos, Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(vel, Vec3::new(1.0, 0.0, 0.0));
        assert!(phys.is_settled());
    }
}

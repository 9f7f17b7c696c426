//! Character-particle response
//!
//! A particle touching a character goes through a fixed sequence: it may be
//! deflected by a shield or a missile-protection spell, otherwise it may
//! damage the character, then both recoil, and finally the particle's bump
//! behaviour (coins, single-hit missiles) runs. Every step contributes to a
//! shared impulse that the recoil step applies.

use log::trace;
use rand::Rng;

use crate::events::CollisionEvent;
use crate::foundation::math::constants::{ATTACK_BEHIND, INV_SQRT_TWO};
use crate::foundation::math::utils::{clip, try_normalize, vec_to_facing};
use crate::foundation::math::Vec3;
use crate::geometry::{OctAxis, OctBB};
use crate::world::{
    AlertFlags, Character, CharacterRef, DamageFx, DamageHit, DamageRange, DamageSink, DamageType, MissileTreatment,
    Particle, ParticleProfile, ParticleRef, Slot, TeamId, World, INFINITE_WEIGHT, MAX_MONEY,
};

use super::super::candidate::{CollisionCandidate, CollisionEndpoint};
use super::super::context::FrameContext;
use super::super::error::{CollisionError, CollisionResult};
use super::platform::{do_prt_platform_physics, PlatformContact};

/// Scratch state for one character-particle contact
#[derive(Debug, Clone, Copy, Default)]
struct HitData {
    /// Contact normal, pointing from the character to the particle
    nrm: Vec3,
    /// Particle velocity relative to the character
    vdiff: Vec3,
    /// `vdiff · nrm`, negative when approaching
    dot: f32,
    /// Velocity change for the particle
    impulse: Vec3,
    /// Largest damage the particle can do
    max_damage: i32,
    /// Damage actually dealt
    actual_damage: i32,
    /// Mana was spent to deflect the particle
    mana_paid: bool,
    /// The friend/foe rules let the particle touch the character
    bumps: bool,
    /// The particle should be removed
    terminate: bool,
}

/// Handle one character-particle candidate
///
/// Returns whether the contact had any effect.
pub fn do_chr_prt_collision<R: Rng + ?Sized>(
    world: &mut World,
    candidate: &CollisionCandidate,
    ctx: &mut FrameContext<'_>,
    sink: &mut dyn DamageSink,
    rng: &mut R,
) -> CollisionResult<bool> {
    let (rc, rp) = candidate.character_and_particle().ok_or(CollisionError::WrongCandidateKind {
        first: candidate.source,
        second: candidate.destination,
    })?;

    let chr = world
        .character(rc)
        .filter(|c| c.in_game)
        .ok_or(CollisionError::StaleReference(CollisionEndpoint::Character(rc)))?;
    let prt = world
        .particle(rp)
        .filter(|p| p.in_game)
        .ok_or(CollisionError::StaleReference(CollisionEndpoint::Particle(rp)))?;

    if !chr.alive || chr.packed || prt.attached_to == Some(rc) {
        return Ok(false);
    }

    // the padded bumper is the reach of a particle against characters
    let reach = OctBB::from_bumper(&prt.bump_padded).add_vector(&prt.pos);
    let full_collision = chr.min_cv.add_vector(&chr.pos).depth(&reach).is_some();

    let mut hit = HitData {
        max_damage: prt.damage.max_damage(),
        ..HitData::default()
    };

    let try_platform = chr.platform && !world.character_in_game(prt.attached_to);
    let mut plat_collision = false;
    if try_platform {
        if let Some(contact) = do_prt_platform_physics(world, rp, rc, ctx) {
            plat_collision = true;
            hit.terminate |= contact == PlatformContact::Landed { terminate: true };
        }
    }

    if !full_collision && !plat_collision {
        return Ok(false);
    }

    let (Some(chr), Some(prt)) = (world.character(rc), world.particle(rp)) else {
        return Ok(false);
    };
    (hit.nrm, hit.vdiff, hit.dot) = estimate_chr_prt_normal(chr, prt);

    let mut handled = false;

    let deflected = hit.dot < 0.0 && deflect(world, rc, rp, &mut hit, ctx, rng);
    handled |= deflected;

    let vulnerable_now = world.character(rc).is_some_and(|c| c.damage_time == 0);
    if !deflected && vulnerable_now {
        handled |= reaffirm(world, rc, rp, ctx);

        hit.bumps = particle_bumps_character(world, rc, rp);
        if hit.bumps {
            handled |= damage(world, rc, rp, &mut hit, ctx, sink);
        }
    }

    if hit.impulse != Vec3::zeros() {
        handled |= recoil(world, rc, rp, &hit);
    }

    if hit.bumps {
        handled |= handle_bump(world, rc, rp, &mut hit, ctx);
    }

    if hit.terminate {
        if let Some(prt) = world.particle_mut(rp) {
            prt.terminate_requested = true;
        }
        handled = true;
    }

    if handled {
        ctx.stats.chr_prt_collisions += 1;
    }
    Ok(handled)
}

/// Contact normal from the centre-of-mass offset, plus relative velocity and their dot product
///
/// The box is scaled to unit size and the vertical component is cubed so
/// the character acts like a cylinder. A fast particle that may already be
/// past the centre is judged from last frame's positions instead. The
/// normal is zero, and the dot product 0, if the centres coincide.
fn estimate_chr_prt_normal(chr: &Character, prt: &Particle) -> (Vec3, Vec3, f32) {
    let extents = chr.min_cv.extents();
    let size = Vec3::new(
        extents[OctAxis::X].max(2.0 * prt.bump_min.size),
        extents[OctAxis::Y].max(2.0 * prt.bump_min.size),
        extents[OctAxis::Z].max(2.0 * prt.bump_min.height),
    );
    let mid_z = 0.5 * (chr.min_cv.maxs[OctAxis::Z] + chr.min_cv.mins[OctAxis::Z]);

    let offset = |prt_pos: &Vec3, chr_pos: &Vec3| {
        let mut n = (prt_pos - chr_pos - Vec3::new(0.0, 0.0, mid_z)).component_div(&size);
        n.z = n.z * n.z * n.z;
        n
    };

    let vdiff = prt.vel - chr.vel;
    let mut nrm = offset(&prt.pos, &chr.pos);

    if vdiff.dot(&nrm) >= 0.0 && vdiff.component_div(&size).norm_squared() > 0.25 {
        nrm = offset(&prt.pos_old, &chr.pos_old);
    }

    match try_normalize(&nrm) {
        Some(unit) => (unit, vdiff, vdiff.dot(&unit)),
        None => (Vec3::zeros(), vdiff, 0.0),
    }
}

/// Shield block or missile protection
fn deflect<R: Rng + ?Sized>(
    world: &mut World,
    rc: CharacterRef,
    rp: ParticleRef,
    hit: &mut HitData,
    ctx: &mut FrameContext<'_>,
    rng: &mut R,
) -> bool {
    let (Some(chr), Some(prt)) = (world.character(rc), world.particle(rp)) else {
        return false;
    };

    if chr.invictus {
        return true;
    }

    let direction = chr
        .facing
        .wrapping_sub(vec_to_facing(chr.pos.x - prt.pos.x, chr.pos.y - prt.pos.y))
        .wrapping_add(ATTACK_BEHIND);

    let blocked = !prt.profile.damfx.contains(DamageFx::NBLOC) && chr.blocks_direction(direction);
    let wants_deflection =
        chr.missile_treatment != MissileTreatment::Normal && prt.owner != Some(rc) && prt.profile.bump_money == 0;
    let can_deflect = chr.damage_time != 0 && hit.max_damage > 0;

    if !blocked && !(wants_deflection && can_deflect) {
        return false;
    }

    let attacker = prt.owner;
    let (team, parrying, own_treatment) = (chr.team, chr.action_is_parry, chr.missile_treatment);
    let payer = chr.missile_handler.unwrap_or(rc);
    let cost = i32::from(chr.missile_cost) << 8;

    let mut treatment = MissileTreatment::Deflect;
    hit.mana_paid = false;
    if wants_deflection {
        treatment = own_treatment;
        hit.mana_paid = world.cost_mana(payer, cost);
        if !hit.mana_paid {
            return false;
        }
    }

    let Some(prt) = world.particle_mut(rp) else {
        return false;
    };

    match treatment {
        MissileTreatment::Deflect => hit.impulse -= hit.nrm * (2.0 * hit.dot),
        MissileTreatment::Reflect => {
            // send it back at whoever fired it
            hit.impulse -= prt.vel * 2.0;
            prt.team = team;
            prt.owner = Some(rc);
            prt.profile.homing = false;
        }
        MissileTreatment::Normal => {}
    }

    if prt.profile.rotate_to_face {
        prt.facing = vec_to_facing(prt.vel.x, prt.vel.y);
    }

    trace!("{rc} deflected {rp} ({treatment:?})");
    ctx.emit(CollisionEvent::DefensePing { character: rc, attacker });
    ctx.emit(CollisionEvent::TextBillboard { character: rc, text: "Blocked!" });

    if blocked && parrying {
        shield_knockback(world, rc, attacker, ctx, rng);
    }

    true
}

/// Roll whether a shield block staggers the attacker or the defender
fn shield_knockback<R: Rng + ?Sized>(
    world: &mut World,
    rc: CharacterRef,
    attacker: Option<CharacterRef>,
    ctx: &mut FrameContext<'_>,
    rng: &mut R,
) {
    let Some(chr) = world.character(rc) else {
        return;
    };

    let shield = [Slot::Right, Slot::Left]
        .into_iter()
        .filter_map(|slot| chr.held(slot))
        .find(|&item| world.character_in_game(Some(item)) && chr.ai.last_item_used == Some(item));

    let Some(attacker) = attacker.filter(|&a| world.character_in_game(Some(a))) else {
        return;
    };
    let (Some(shield), Some(opponent)) = (shield.and_then(|s| world.character(s)), world.character(attacker)) else {
        return;
    };

    let rating = chr.block_skill + shield.block_skill - 4 * opponent.strength as i32 + 2 * chr.strength as i32;
    let reload = ctx.config.shield_knockback_reload;

    if rng.gen_range(1..=100) <= rating {
        if let Some(opponent) = world.character_mut(attacker) {
            opponent.reload_time += reload;
        }
    } else {
        if let Some(chr) = world.character_mut(rc) {
            chr.reload_time += reload;
        }
        ctx.emit(CollisionEvent::ShieldBreak { character: rc });
    }
}

/// Refresh burn-on-hit effects on shop items that carry a spell skin
fn reaffirm(world: &World, rc: CharacterRef, rp: ParticleRef, ctx: &mut FrameContext<'_>) -> bool {
    let (Some(chr), Some(prt)) = (world.character(rc), world.particle(rp)) else {
        return false;
    };

    let reaffirms = chr.reaffirm_damage_type == Some(prt.damage_type) && chr.is_shop_item && chr.spell_effect_skin;
    if reaffirms {
        ctx.emit(CollisionEvent::ReaffirmParticles { character: rc });
    }
    reaffirms
}

/// Friend/foe rules for whether a particle affects a character
pub fn particle_bumps_character(world: &World, rc: CharacterRef, rp: ParticleRef) -> bool {
    let (Some(chr), Some(prt)) = (world.character(rc), world.particle(rp)) else {
        return false;
    };

    if chr.invictus || prt.attached_to == Some(rc) {
        return false;
    }

    let mut belongs = prt.owner == Some(rc);
    if !belongs {
        // a weapon's particle belongs to whoever wields the weapon
        if let Some(owner) = prt.owner.filter(|&o| world.character_in_game(Some(o))) {
            let chr_wielder = world.lowest_attachment(rc, true).unwrap_or(rc);
            let prt_wielder = world.lowest_attachment(owner, true).unwrap_or(owner);
            belongs = chr_wielder == prt_wielder;
        }
    }

    let profile = &prt.profile;
    let hates = world.team_hates(prt.team, chr.team);

    // neutral particles attack anyone on a team
    let attacks = hates || (chr.team != TeamId::NULL && prt.team == TeamId::NULL);

    let only_friendly = if profile.only_damage_friendly { prt.team == chr.team } else { attacks };
    let friendly_fire = if profile.friendly_fire { !hates && !belongs } else { attacks };

    friendly_fire || only_friendly || (hates && profile.hate_only)
}

/// Apply status effects and damage, and work out the particle's rebound
fn damage(
    world: &mut World,
    rc: CharacterRef,
    rp: ParticleRef,
    hit: &mut HitData,
    ctx: &mut FrameContext<'_>,
    sink: &mut dyn DamageSink,
) -> bool {
    let Some(prt) = world.particle(rp) else {
        return false;
    };
    let profile = prt.profile.clone();
    let (vel, owner, attached_to, team) = (prt.vel, prt.owner, prt.attached_to, prt.team);
    let (mut range, damage_type, life_drain, mana_drain) = (prt.damage, prt.damage_type, prt.life_drain, prt.mana_drain);

    ctx.emit(CollisionEvent::RemoveEnchants { character: rc, particle: rp });

    let Some(chr) = world.character_mut(rc) else {
        return false;
    };

    if profile.grog_time > 0 && chr.can_be_grogged {
        chr.ai.alert |= AlertFlags::CONFUSED;
        if profile.grog_time > chr.grog_time {
            chr.grog_time += profile.grog_time;
        }
    }
    if profile.daze_time > 0 && chr.can_be_dazed {
        chr.ai.alert |= AlertFlags::CONFUSED;
        if profile.daze_time > chr.daze_time {
            chr.daze_time += profile.daze_time;
        }
    }

    if hit.max_damage != 0 {
        let owner = owner.filter(|&o| world.character_in_game(Some(o)));
        let needs_impact = profile.rotate_to_face
            || world.character_in_game(attached_to)
            || owner.and_then(|o| world.character(o)).is_some_and(|o| o.is_ranged);

        // ARRO particles only hurt what they are stuck in
        if !profile.damfx.contains(DamageFx::ARRO) && !(needs_impact && hit.dot >= 0.0) {
            if let Some(owner) = owner {
                range = credit_owner(world, rc, owner, &profile, range, life_drain, mana_drain);
            }

            let Some(chr) = world.character_mut(rc) else {
                return false;
            };

            if chr.vulnerability.is_some() && chr.vulnerability == profile.source_profile {
                range.base <<= 1;
                range.rand = (range.rand << 1) | 1;
                chr.ai.alert |= AlertFlags::HIT_VULNERABLE;
            }

            let direction = chr.facing.wrapping_sub(vec_to_facing(vel.x, vel.y)).wrapping_add(ATTACK_BEHIND);
            let blow = DamageHit {
                direction,
                damage: range,
                damage_type,
                team,
                attacker: owner,
                effects: profile.damfx,
            };
            hit.actual_damage = sink.apply_damage(chr, &blow);
            trace!("{rp} hit {rc} for {}", hit.actual_damage);
        }
    }

    if hit.dot < 0.0 {
        let max = hit.max_damage.abs();
        let remaining = max - hit.actual_damage.abs();

        if max == 0 || remaining == 0 {
            // everything was absorbed, the particle stops dead
            hit.impulse -= vel;
        } else {
            // damage behaves like kinetic energy, so velocity scales with its square root
            let recoil = remaining.abs() as f32 / max as f32;
            let vfinal = (vel - hit.nrm * (2.0 * hit.dot)) * (recoil * recoil);
            hit.impulse += vfinal - vel;
        }
    }

    true
}

/// Stat bonuses, drains and hit bookkeeping for the particle's owner
fn credit_owner(
    world: &mut World,
    rc: CharacterRef,
    owner: CharacterRef,
    profile: &ParticleProfile,
    mut range: DamageRange,
    life_drain: i32,
    mana_drain: i32,
) -> DamageRange {
    let (mut stolen_life, mut stolen_mana) = (0, 0);
    if let Some(chr) = world.character_mut(rc) {
        if life_drain > 0 {
            let before = chr.life;
            chr.life = (chr.life - life_drain).max(1).min(before);
            stolen_life = before - chr.life;
        }
        if mana_drain > 0 {
            let before = chr.mana;
            chr.mana = (chr.mana - mana_drain).max(0).min(before);
            stolen_mana = before - chr.mana;
        }
    }

    let Some(attacker) = world.character_mut(owner) else {
        return range;
    };

    // +2% per point of intelligence or wisdom above 14, -2% per point below
    let bonus = |stat: f32| 1.0 + ((stat as i32 - 14) * 2) as f32 / 100.0;
    if profile.int_damage_bonus {
        range = range.scaled(bonus(attacker.intelligence));
    }
    if profile.wis_damage_bonus {
        range = range.scaled(bonus(attacker.wisdom));
    }

    attacker.life = (attacker.life + stolen_life).min(attacker.life_max);
    attacker.mana = (attacker.mana + stolen_mana).min(attacker.mana_max);
    attacker.ai.alert |= AlertFlags::SCORED_A_HIT;
    attacker.ai.hit_last = Some(rc);

    let weapons = attacker.holding;
    for item in weapons.into_iter().flatten() {
        if let Some(weapon) = world.character_mut(item).filter(|w| w.in_game) {
            weapon.ai.hit_last = Some(rc);
        }
    }

    range
}

/// Push the character, the weapon holder and the particle apart
fn recoil(world: &mut World, rc: CharacterRef, rp: ParticleRef, hit: &HitData) -> bool {
    let Some(prt) = world.particle(rp) else {
        return false;
    };
    if !prt.profile.allow_push {
        return false;
    }

    let attack_factor = match prt.damage_type {
        DamageType::Crush => 1.0,
        DamageType::Poke => 0.5,
        _ => INV_SQRT_TWO,
    };
    let (attached_to, owner) = (prt.attached_to, prt.owner);

    let Some(chr_weight) = world.character(rc).map(|c| c.phys.weight) else {
        return false;
    };

    let prt_mass = if hit.max_damage == 0 {
        // wind and other harmless pushers act the same on everything
        chr_weight as f32 / 10.0
    } else {
        // damage stands in for kinetic energy, with a floor on the speed
        let vel2 = hit.vdiff.norm_squared().max(100.0);
        3.0 * hit.max_damage as f32 / (0.5 * vel2)
    };

    let felt = |weight: u32| {
        let mut factor = attack_factor;
        if weight > 0 {
            let w = weight as f32;
            factor *= clip(prt_mass, 1.0, 2.0 * w) / w;
        }
        clip(factor, 0.0, 3.0)
    };

    // a paid deflection leaves the target standing
    if chr_weight != INFINITE_WEIGHT && !hit.mana_paid {
        if let Some(chr) = world.character_mut(rc) {
            chr.phys.accumulate_avel(&(hit.impulse * -felt(chr_weight)));
        }
    }

    if world.character_in_game(attached_to) {
        let holder = attached_to
            .and_then(|weapon| world.lowest_attachment(weapon, false))
            .or_else(|| owner.and_then(|o| world.lowest_attachment(o, false)));

        if let Some(holder) = holder.and_then(|h| world.character_mut(h)) {
            if holder.phys.weight != INFINITE_WEIGHT {
                let factor = felt(holder.phys.weight);
                holder.phys.accumulate_avel(&(hit.impulse * factor));
            }
        }
    }

    if let Some(prt) = world.particle_mut(rp) {
        prt.phys.accumulate_avel(&hit.impulse);
    }
    true
}

/// Bump particles, coin pickup and single-hit termination
fn handle_bump(world: &mut World, rc: CharacterRef, rp: ParticleRef, hit: &mut HitData, ctx: &mut FrameContext<'_>) -> bool {
    ctx.emit(CollisionEvent::BumpParticles { character: rc, particle: rp });

    let Some(profile) = world.particle(rp).map(|p| (p.profile.end_bump, p.profile.bump_money)) else {
        return false;
    };
    let (end_bump, bump_money) = profile;

    if !end_bump {
        return true;
    }

    if bump_money == 0 {
        hit.terminate = true;
        return true;
    }

    let Some(chr) = world.character(rc) else {
        return false;
    };

    // mounts collect for their riders
    let mut collector = rc;
    if chr.is_mount {
        if let Some(rider) = chr.held(Slot::Left) {
            if world.character(rider).is_some_and(|r| r.in_game && r.can_grab_money) {
                collector = rider;
            }
        }
    }

    if let Some(c) = world.character_mut(collector) {
        if c.can_grab_money && c.alive && c.damage_time == 0 && c.money < MAX_MONEY {
            c.money = c.money.saturating_add(bump_money).min(MAX_MONEY);
            hit.terminate = true;
        }
    }

    true
}

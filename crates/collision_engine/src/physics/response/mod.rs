//! Collision responders
//!
//! Run once per candidate, in tmin order, after the attachment passes. Each
//! responder revalidates its endpoints, then adds its corrections to the
//! accumulators of the entities involved. Nothing is integrated here.

mod chr_chr;
mod chr_prt;
mod platform;

pub use chr_chr::do_chr_chr_collision;
pub use chr_prt::{do_chr_prt_collision, particle_bumps_character};
pub use platform::{do_chr_platform_physics, do_prt_platform_physics, PlatformContact};

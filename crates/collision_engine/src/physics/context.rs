//! Per-frame state shared by the resolvers and responders

use std::fmt;

use crate::config::CollisionConfig;
use crate::events::{CollisionEvent, EventSystem};

/// Counters for one collision frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frame these counters belong to
    pub frame: u32,
    /// Candidates stored in the table
    pub candidates: usize,
    /// Candidates rejected as already present
    pub duplicates: usize,
    /// Candidates dropped because a pool was full
    pub dropped: usize,
    /// Riders that climbed onto a mount
    pub mounts: usize,
    /// Platform attachments made or confirmed
    pub platforms_attached: usize,
    /// Platform attachments removed
    pub platforms_detached: usize,
    /// Character pairs that exchanged impulse or pressure
    pub chr_chr_collisions: usize,
    /// Character pairs resolved by platform physics
    pub platform_contacts: usize,
    /// Character-particle contacts handled
    pub chr_prt_collisions: usize,
    /// Particles removed at the end of the frame
    pub particles_terminated: usize,
}

impl fmt::Display for FrameStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frame {}: {} candidates ({} dup, {} dropped), {} mounts, platforms +{}/-{}, \
             {} chr-chr, {} platform, {} chr-prt, {} terminated",
            self.frame,
            self.candidates,
            self.duplicates,
            self.dropped,
            self.mounts,
            self.platforms_attached,
            self.platforms_detached,
            self.chr_chr_collisions,
            self.platform_contacts,
            self.chr_prt_collisions,
            self.particles_terminated,
        )
    }
}

/// Borrowed state threaded through one frame of collision handling
pub struct FrameContext<'a> {
    /// Tuning constants
    pub config: &'a CollisionConfig,
    /// Event queue for side effects
    pub events: &'a mut EventSystem,
    /// Counters
    pub stats: &'a mut FrameStats,
    /// Current frame number
    pub frame: u32,
}

impl<'a> FrameContext<'a> {
    /// Bundle the per-frame state
    pub fn new(config: &'a CollisionConfig, events: &'a mut EventSystem, stats: &'a mut FrameStats, frame: u32) -> Self {
        Self { config, events, stats, frame }
    }

    /// Queue an event
    pub fn emit(&mut self, event: CollisionEvent) {
        self.events.send(event);
    }

    /// Platform tolerance shorthand
    pub fn platform_tolerance(&self) -> f32 {
        self.config.platform_tolerance
    }
}

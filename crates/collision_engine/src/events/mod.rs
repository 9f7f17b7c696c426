//! Collision events
//!
//! Side effects of a collision that belong to other subsystems (spawning
//! particles, sounds, text, enchantment bookkeeping) are not performed by the
//! collision pass. They are queued here as typed events and dispatched once
//! at the end of the frame.
//!
//! Handlers subscribe per [`EventType`]. Each event walks its subscribers in
//! registration order until one of them consumes it.

use std::collections::HashMap;

use crate::world::{CharacterRef, ParticleRef};

/// Event type identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// A particle bumped a character and wants to spawn its bump particles
    BumpParticles,
    /// A character blocked a particle
    DefensePing,
    /// Floating text above a character
    TextBillboard,
    /// A shield block was broken
    ShieldBreak,
    /// A particle hit may strip enchantments
    RemoveEnchants,
    /// Burn-on-hit effects should be refreshed
    ReaffirmParticles,
    /// A particle left the world
    ParticleTerminated,
    /// A rider climbed onto a mount
    Mounted,
    /// Something landed on a platform
    PlatformAttached,
    /// Something left a platform
    PlatformDetached,
}

/// Payload of a collision event
#[derive(Debug, Clone, PartialEq)]
pub enum CollisionEvent {
    /// Spawn the particle's bump particles on the character
    BumpParticles {
        /// Character that was bumped
        character: CharacterRef,
        /// Particle that bumped it
        particle: ParticleRef,
    },
    /// Ping the attacker that its shot was blocked
    DefensePing {
        /// Defender
        character: CharacterRef,
        /// Owner of the blocked particle
        attacker: Option<CharacterRef>,
    },
    /// Show text above a character
    TextBillboard {
        /// Character to label
        character: CharacterRef,
        /// Text to show
        text: &'static str,
    },
    /// Play the shield-break sound
    ShieldBreak {
        /// Defender whose block failed
        character: CharacterRef,
    },
    /// Remove enchantments on the character that this particle's profile cancels
    RemoveEnchants {
        /// Character that was hit
        character: CharacterRef,
        /// Particle that hit it
        particle: ParticleRef,
    },
    /// Refresh particles attached to a character
    ReaffirmParticles {
        /// Character whose attached particles are refreshed
        character: CharacterRef,
    },
    /// A particle was removed at the end of the frame
    ParticleTerminated {
        /// Slot the particle occupied
        particle: ParticleRef,
    },
    /// A rider climbed onto a mount
    Mounted {
        /// Rider
        rider: CharacterRef,
        /// Mount
        mount: CharacterRef,
    },
    /// Something landed on a platform
    PlatformAttached {
        /// Platform
        platform: CharacterRef,
        /// What landed, a character or a particle
        object: PlatformObject,
    },
    /// Something left a platform
    PlatformDetached {
        /// Platform
        platform: CharacterRef,
        /// What left
        object: PlatformObject,
    },
}

/// Anything that can stand on a platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformObject {
    /// A character
    Character(CharacterRef),
    /// A particle
    Particle(ParticleRef),
}

impl CollisionEvent {
    /// Type of this event
    pub fn event_type(&self) -> EventType {
        match self {
            CollisionEvent::BumpParticles { .. } => EventType::BumpParticles,
            CollisionEvent::DefensePing { .. } => EventType::DefensePing,
            CollisionEvent::TextBillboard { .. } => EventType::TextBillboard,
            CollisionEvent::ShieldBreak { .. } => EventType::ShieldBreak,
            CollisionEvent::RemoveEnchants { .. } => EventType::RemoveEnchants,
            CollisionEvent::ReaffirmParticles { .. } => EventType::ReaffirmParticles,
            CollisionEvent::ParticleTerminated { .. } => EventType::ParticleTerminated,
            CollisionEvent::Mounted { .. } => EventType::Mounted,
            CollisionEvent::PlatformAttached { .. } => EventType::PlatformAttached,
            CollisionEvent::PlatformDetached { .. } => EventType::PlatformDetached,
        }
    }
}

/// Event with the frame it was raised on
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Frame the event was raised on
    pub frame: u32,
    /// What happened
    pub payload: CollisionEvent,
}

impl Event {
    /// Create a new event
    pub fn new(frame: u32, payload: CollisionEvent) -> Self {
        Self { frame, payload }
    }

    /// Type of this event
    pub fn event_type(&self) -> EventType {
        self.payload.event_type()
    }
}

/// Subscriber to collision events
pub trait EventHandler {
    /// Returning true consumes the event so later subscribers never see it
    fn on_event(&mut self, event: &Event) -> bool;
}

/// Per-frame event queue plus its subscribers
pub struct EventSystem {
    queue: Vec<Event>,
    handlers: HashMap<EventType, Vec<Box<dyn EventHandler>>>,
    current_frame: u32,
}

impl EventSystem {
    /// No queued events and no subscribers
    pub fn new() -> Self {
        Self {
            queue: Vec::new(),
            handlers: HashMap::new(),
            current_frame: 0,
        }
    }

    /// Stamp subsequent events with this frame
    pub fn update_frame(&mut self, frame: u32) {
        self.current_frame = frame;
    }

    /// Subscribe `handler` to one kind of event
    pub fn register_handler(&mut self, event_type: EventType, handler: Box<dyn EventHandler>) {
        self.handlers.entry(event_type).or_default().push(handler);
    }

    /// Queue an event for this frame's dispatch
    pub fn send(&mut self, payload: CollisionEvent) {
        self.queue.push(Event::new(self.current_frame, payload));
    }

    /// Number of queued events
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Dispatch all pending events, returning them in the order raised
    pub fn dispatch(&mut self) -> Vec<Event> {
        let events = std::mem::take(&mut self.queue);
        for event in &events {
            self.dispatch_event(event);
        }
        events
    }

    fn dispatch_event(&mut self, event: &Event) {
        if let Some(subscribers) = self.handlers.get_mut(&event.event_type()) {
            let consumed = subscribers.iter_mut().any(|handler| handler.on_event(event));
            if consumed {
                log::trace!("{:?} consumed", event.event_type());
            }
        }
    }
}

impl Default for EventSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct TestHandler {
        received: Rc<RefCell<Vec<EventType>>>,
        consume: bool,
    }

    impl EventHandler for TestHandler {
        fn on_event(&mut self, event: &Event) -> bool {
            self.received.borrow_mut().push(event.event_type());
            self.consume
        }
    }

    #[test]
    fn test_dispatch_stamps_frame_and_drains() {
        let mut system = EventSystem::new();
        system.update_frame(12);
        system.send(CollisionEvent::ShieldBreak { character: CharacterRef(3) });
        assert_eq!(system.pending(), 1);

        let events = system.dispatch();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].frame, 12);
        assert_eq!(events[0].event_type(), EventType::ShieldBreak);
        assert_eq!(system.pending(), 0);
    }

    #[test]
    fn test_event_consumption() {
        let mut system = EventSystem::new();
        let first = Rc::new(RefCell::new(Vec::new()));
        let second = Rc::new(RefCell::new(Vec::new()));

        system.register_handler(
            EventType::DefensePing,
            Box::new(TestHandler { received: first.clone(), consume: true }),
        );
        system.register_handler(
            EventType::DefensePing,
            Box::new(TestHandler { received: second.clone(), consume: false }),
        );

        system.send(CollisionEvent::DefensePing { character: CharacterRef(0), attacker: None });
        system.send(CollisionEvent::ShieldBreak { character: CharacterRef(0) });
        system.dispatch();

        // first handler consumed it, and nobody listens for shield breaks
        assert_eq!(first.borrow().as_slice(), &[EventType::DefensePing]);
        assert!(second.borrow().is_empty());
    }
}

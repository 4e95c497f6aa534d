//! The event contract: a payload plus a propagation flag.

use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

/// An event that can be dispatched.
///
/// The only thing the dispatcher needs from an event is its propagation
/// flag. A handler clears it to stop delivery to the remaining subscribers
/// of the current dispatch call.
pub trait Event {
    /// Whether delivery should continue after the current handler.
    fn propagates(&self) -> bool;

    /// Set the propagation flag.
    fn set_propagation(&mut self, propagate: bool);

    /// Stop delivery to the remaining subscribers of this dispatch call.
    fn stop_propagation(&mut self) {
        self.set_propagation(false);
    }
}

/// An event that carries its own name.
///
/// Lets publishers hand over a single value and have the dispatcher route it
/// by the name it carries (see [`Dispatcher::dispatch_named`]).
///
/// [`Dispatcher::dispatch_named`]: crate::Dispatcher::dispatch_named
pub trait NamedEvent<N>: Event {
    /// The name to route this event under.
    fn event_name(&self) -> N;
}

/// A generic event: an application payload plus the propagation flag.
///
/// ```rust
/// use herald_events::{Envelope, Event};
///
/// let mut event = Envelope::new(42_u32);
/// assert!(event.propagates());
/// assert_eq!(*event, 42);
///
/// event.stop_propagation();
/// assert!(!event.propagates());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<P> {
    payload: P,
    #[serde(default = "default_propagate")]
    propagate: bool,
}

fn default_propagate() -> bool {
    true
}

impl<P> Envelope<P> {
    /// Wrap a payload. Propagation starts enabled.
    #[must_use]
    pub fn new(payload: P) -> Self {
        Self {
            payload,
            propagate: true,
        }
    }

    /// Borrow the payload.
    #[must_use]
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Mutably borrow the payload.
    pub fn payload_mut(&mut self) -> &mut P {
        &mut self.payload
    }

    /// Unwrap the payload, discarding the propagation flag.
    #[must_use]
    pub fn into_payload(self) -> P {
        self.payload
    }
}

impl<P: Default> Default for Envelope<P> {
    fn default() -> Self {
        Self::new(P::default())
    }
}

impl<P> From<P> for Envelope<P> {
    fn from(payload: P) -> Self {
        Self::new(payload)
    }
}

impl<P> Event for Envelope<P> {
    fn propagates(&self) -> bool {
        self.propagate
    }

    fn set_propagation(&mut self, propagate: bool) {
        self.propagate = propagate;
    }
}

impl<P> Deref for Envelope<P> {
    type Target = P;

    fn deref(&self) -> &P {
        &self.payload
    }
}

impl<P> DerefMut for Envelope<P> {
    fn deref_mut(&mut self) -> &mut P {
        &mut self.payload
    }
}

pub mod bus;
pub mod channel;
pub mod client;
mod error;
pub mod queue;
pub mod registry;
pub mod tts;
pub mod verb;
mod voice;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use voice_verbs_types as types;
pub use voice_verbs_utils as utils;

pub use bus::EventBus;
pub use channel::CommandChannel;
pub use client::{connect, connect_with_config, Client};
pub use error::{CorrelationError, TransportError, VerbError};
pub use registry::{CancelHandle, CorrelationRegistry, PendingOperation};
pub use verb::{Verb, VerbInvocation, VerbKind, VerbState, DEFAULT_VERB_TIMEOUT};
pub use voice::Voice;

// Listener panics never happen under these locks, but a poisoned map is still usable.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

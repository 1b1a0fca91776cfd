mod auth;
mod host;
mod inflight;
mod navigation;
mod queue;
mod route;
mod screen;
mod session;
#[cfg(test)]
pub mod testing;

pub use auth::AuthState;
pub use host::{BackButton, HostChrome};
pub use inflight::{RequestSlot, Ticket};
pub use queue::EventQueue;
pub use route::{ROOT, Route};
pub use screen::{Action, Button, Screen};
pub use session::{Session, SessionEvent, SessionSettings};

#[cfg(test)]
pub use route::parse_route;

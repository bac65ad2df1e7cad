//! Client-side state synchronization for the ICON experiment-control dashboard.
//!
//! - [`wire`]: the tagged serialization format the backend speaks.
//! - [`decode()`]: projection of wire nodes into plain values.
//! - [`set_at_path`] / [`get_at_path`]: copy-on-write patches of a cached wire tree.
//! - [`ObservableStore`]: per-key parameter cache with isolated subscribers.
//! - [`Session`]: one explicitly owned instance of all of the above, fed by a [`Transport`]
//!   and by [`PushEvent`]s.

mod config;
mod decode;
mod event;
mod patch;
mod path;
mod session;
mod store;
mod subscription;
mod transport;
pub mod wire;

pub use config::*;
pub use decode::*;
pub use event::*;
pub use patch::*;
pub use path::*;
pub use session::*;
pub use store::*;
pub use subscription::*;
pub use transport::*;
pub use wire::{ServiceKind, WireKind, WireMap, WireTag, WireValue};

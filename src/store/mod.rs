//! # Memory Store
//!
//! An actor-backed model store implementing [`Loader`](crate::framework::Loader) and
//! [`Mutator`](crate::framework::Mutator) over [`Record`](crate::framework::Record).
//!
//! ```text
//! Controller ──► StoreClient ──mpsc──► StoreActor (tables, schema)
//!                     ▲                     │
//!                     └──────oneshot────────┘
//! ```
//!
//! Relations are declared up front in a [`Schema`]; ids are assigned sequentially across
//! all tables. Presence validations reject a save by attaching errors to the record.

pub mod actor;
pub mod client;
pub mod schema;

pub use actor::{Persisted, StoreActor, StoreRequest};
pub use client::StoreClient;
pub use schema::{Relation, Schema};

/// Channel capacity used by [`new`].
pub const DEFAULT_BUFFER: usize = 32;

/// Creates a store actor and its client. Spawn `actor.run()` to start serving.
pub fn new(schema: Schema) -> (StoreActor, StoreClient) {
    StoreActor::new(DEFAULT_BUFFER, schema)
}

//! # Resource Recipe
//!
//! > **Declarative resource controllers in Rust.**
//!
//! Declare which parents a resource is nested under, and get the seven standard actions
//! (index, show, new, edit, create, update, destroy) with the parent resolved, the resource
//! scoped through it, and both exposed to the caller.
//!
//! ## 🚀 Core Concepts
//!
//! ### Association chains
//! A chain lists the parents of a resource, outermost first. Parents are normal
//! (`store_id`), polymorphic (`factory_id` *or* `company_id`), singleton (reached through the
//! parent outside it, no id) or shallow (may be addressed without its outer parents).
//!
//! ### Generics: The Power of `S`
//! You'll see `Controller<S: Mutator>` everywhere. The engine never touches a database; it
//! drives whatever store implements [`Loader`](framework::Loader) and
//! [`Mutator`](framework::Mutator). This crate ships two: an in-memory actor
//! ([`store`]) and a scripted mock ([`framework::mock`]).
//!
//! ### Overrides
//! Any single step (parent, scope, member lookup, collection, or a whole action) can be
//! replaced per controller through an [`OverrideRegistry`](framework::OverrideRegistry),
//! while the rest of the pipeline still runs around it.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! - **Role**: Chain declaration, parent resolution, scoping and actions.
//! - **Key items**: [`AssociationChain`](framework::AssociationChain),
//!   [`Controller`](framework::Controller), [`ExecutionResult`](framework::ExecutionResult).
//!
//! ### 2. The Store ([`store`])
//! - **Role**: A `tokio` actor holding tables in memory, reached through a cloneable client.
//! - **Key items**: [`StoreClient`](store::StoreClient), [`Schema`](store::Schema).
//!
//! ### 3. The Controllers ([`controllers`])
//! - **Role**: Sample declarations: polymorphic employees and photos, a singleton manager,
//!   tasks declared from JSON, shallow comments.
//!
//! ### 4. The Orchestrator ([`lifecycle`])
//! - **Role**: Spawns the store, builds the controllers, shuts everything down.
//! - **Key items**: [`AppSystem`](lifecycle::AppSystem), [`setup_tracing`](lifecycle::setup_tracing).
//!
//! ### Running the Demo
//!
//! ```bash
//! RUST_LOG=info cargo run
//! ```
//!
//! ### Running Tests
//!
//! ```bash
//! cargo test
//! ```

pub mod controllers;
pub mod framework;
pub mod lifecycle;
pub mod store;

//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a `tracing-subscriber` formatter filtered by `RUST_LOG`.
//!
//! ## Configuration
//!
//! The compact format hides the crate/module prefix (`with_target(false)`). Spans are shown
//! inline, so every log line carries the controller and store call it belongs to.
//!
//! ## What Gets Traced
//!
//! - **Dispatch**: one `dispatch` span per request with the resource and action
//! - **Resolution**: the chosen parent type, not-found parents, missing parameters
//! - **Store calls**: one span per [`StoreClient`](crate::store::StoreClient) call, plus the
//!   actor's own `Created`/`Updated`/`Deleted` lines
//! - **Outcomes**: whether an action completed or was rejected by validation
//!
//! ## Usage Examples
//!
//! ```bash
//! # Outcomes only
//! RUST_LOG=info cargo run
//!
//! # Request params, payloads and every store message
//! RUST_LOG=debug cargo run
//!
//! # Only the engine
//! RUST_LOG=resource_recipe::framework=debug cargo run
//! ```
//!
//! ## Request Trace Example
//!
//! **With `RUST_LOG=info`**:
//!
//! ```text
//! INFO employees:dispatch: Parent resolved binding="factory" parent_type=Some("factory") action=Index resource="employee"
//! INFO employees:dispatch: Action finished success=true action=Index resource="employee"
//! ```
//!
//! **With `RUST_LOG=debug`**:
//!
//! ```text
//! DEBUG employees:dispatch: Dispatch params={"factory_id": "1"} action=Index resource="employee"
//! DEBUG employees:dispatch:resolve: Loading parent association="parent" parent_type="factory" id="1"
//! DEBUG employees:dispatch:resolve:load_by_id: Sending request model="factory" id="1"
//! DEBUG Find model="factory" id="1" found=true
//! ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}

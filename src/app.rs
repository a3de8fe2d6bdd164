//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the script, the cursor,
//! the focused track and a handle on the published session snapshot.

mod model;

pub use model::*;

//! Application module: exposes the browser model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the visible sample list,
//! the selection and the filter state.

mod model;

pub use model::*;

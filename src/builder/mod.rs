//! Landing page builder core.
//!
//! ARCHITECTURE
//! ============
//! Pure, I/O-free model of the page builder:
//! - `schema`: static block type registry (the component library)
//! - `block` / `page`: block content values and the stored page document
//! - `canvas`: ordered block list plus selection
//! - `properties`: properties panel descriptors and field edits
//! - `render`: block → HTML node tree
//! - `session`: editing session state machine wrapping all of the above
//!
//! Services drive these types from HTTP handlers and own persistence.

pub mod block;
pub mod canvas;
pub mod page;
pub mod properties;
pub mod render;
pub mod schema;
pub mod session;

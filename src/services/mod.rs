//! Domain services used by HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business logic and persistence concerns so route
//! handlers can stay focused on protocol translation and auth plumbing.
//! The builder itself (`crate::builder`) does no I/O; `editor` is where it
//! meets the page store.

pub mod analytics;
pub mod editor;
pub mod email_auth;
pub mod lead;
pub mod page;
pub mod session;
pub mod widget;
pub mod workflow;

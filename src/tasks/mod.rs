//! Background Tasks Module
//!
//! Contains background tasks that run periodically during gateway operation.
//!
//! # Tasks
//! - Size Governor: Bounds the dynamic store by evicting its oldest writes

mod trim;

pub use trim::{spawn_trim_task, trim_store};

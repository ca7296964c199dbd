//! Background Tasks Module
//!
//! Contains background tasks that run during server operation.
//!
//! # Tasks
//! - Warm-up: Resolves every route at startup, retrying failed routes at an interval

mod warmup;

pub use warmup::spawn_warmup_task;

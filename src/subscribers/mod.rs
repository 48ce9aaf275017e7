//! Built-in event subscribers.
//!
//! Currently only the demo/reference [`LogWriter`], enabled with the
//! `logging` feature. Applications that need structured logging or metrics
//! should subscribe their own callbacks on the [`Bus`](crate::Bus) instead.

mod log;

pub use log::LogWriter;

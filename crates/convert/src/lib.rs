//! Batch conversion of legacy office documents.
//!
//! [`Converter`] walks an input directory, copies documents that are
//! already in a modern format (`.docx`, `.xlsx`) and hands legacy ones
//! (`.doc`, `.xls`) to an [`Engine`](engine::Engine), one at a time, mirroring
//! the directory structure into the output directory. The result of a batch
//! is a [`Summary`].

mod batch;
mod dispatch;
pub mod engine;
pub mod error;
mod format;
mod summary;
mod task;
pub mod text;

pub use crate::batch::Converter;
pub use crate::dispatch::dispatch;
pub use crate::format::{Format, Legacy, Rule, classify};
pub use crate::summary::Summary;
pub use crate::task::{FileTask, Outcome};

//! Interceptor pipeline engine.
//!
//! An interceptor is a named pair of optional `enter` and `leave` hooks over
//! a mutable context. [`execute`] runs the enter hooks in order until the
//! context carries a response (or an error), then unwinds the leave hooks of
//! every interceptor that was entered, in reverse order.
//!
//! The engine knows nothing about HTTP; the context type only has to report
//! whether it is finished and hold the error being unwound.

pub mod chain;
mod engine;
mod error;
mod interceptor;

pub use chain::{inject, remove, Position};
pub use engine::execute;
pub use error::InjectError;
pub use interceptor::{Hook, Interceptor, PipelineContext};

//! Chain execution.
//!
//! Enter hooks run in list order and leave hooks in reverse order, onion
//! style: an interceptor's leave runs after the leaves of everything entered
//! after it. A response or an error stops the enter phase; the leave phase
//! always unwinds every interceptor that was entered.

use crate::interceptor::{Interceptor, PipelineContext};

/// Run `interceptors` over `ctx` and return the final context.
///
/// An error returned by an enter hook is stored in the context's error slot,
/// so leave hooks observe it while the stack unwinds; a leave hook may clear
/// it to recover. An error returned by a leave hook replaces the stored one
/// and unwinding continues. Whatever error remains once the stack is empty is
/// returned.
pub fn execute<'a, C, I>(mut ctx: C, interceptors: I) -> Result<C, C::Error>
where
    C: PipelineContext + 'a,
    I: IntoIterator<Item = &'a Interceptor<C>>,
{
    let mut executed: Vec<&Interceptor<C>> = Vec::new();

    for interceptor in interceptors {
        if ctx.has_response() {
            tracing::trace!(
                next = interceptor.name(),
                "response set, skipping remaining enter hooks"
            );
            break;
        }
        if ctx.error_slot().is_some() {
            break;
        }

        executed.push(interceptor);
        tracing::trace!(interceptor = interceptor.name(), "enter");
        if let Err(e) = interceptor.run_enter(&mut ctx) {
            tracing::trace!(interceptor = interceptor.name(), "enter failed");
            *ctx.error_slot() = Some(e);
        }
    }

    while let Some(interceptor) = executed.pop() {
        tracing::trace!(interceptor = interceptor.name(), "leave");
        if let Err(e) = interceptor.run_leave(&mut ctx) {
            tracing::trace!(interceptor = interceptor.name(), "leave failed");
            *ctx.error_slot() = Some(e);
        }
    }

    match ctx.error_slot().take() {
        Some(e) => Err(e),
        None => Ok(ctx),
    }
}

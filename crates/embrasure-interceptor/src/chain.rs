//! Building new chains from existing ones.
//!
//! Chains are plain `Vec<Interceptor<C>>`; these helpers return a new list
//! and leave the source untouched, so a shared default chain can be
//! customised per registry.

use crate::error::InjectError;
use crate::interceptor::{Interceptor, PipelineContext};

/// Where [`inject`] places an interceptor relative to a named one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position<'a> {
    Before(&'a str),
    After(&'a str),
    Replace(&'a str),
}

impl Position<'_> {
    fn anchor(&self) -> &str {
        match self {
            Position::Before(name) | Position::After(name) | Position::Replace(name) => name,
        }
    }
}

/// Return a copy of `chain` with `interceptor` placed at `position`.
///
/// The anchor is the first interceptor with the given name.
pub fn inject<C: PipelineContext>(
    chain: &[Interceptor<C>],
    interceptor: Interceptor<C>,
    position: Position<'_>,
) -> Result<Vec<Interceptor<C>>, InjectError> {
    let anchor = position.anchor();
    let index = chain
        .iter()
        .position(|i| i.name() == anchor)
        .ok_or_else(|| InjectError::UnknownAnchor(anchor.to_string()))?;

    let mut out = chain.to_vec();
    match position {
        Position::Before(_) => out.insert(index, interceptor),
        Position::After(_) => out.insert(index + 1, interceptor),
        Position::Replace(_) => out[index] = interceptor,
    }
    Ok(out)
}

/// Return a copy of `chain` without any interceptor named `name`.
pub fn remove<C: PipelineContext>(chain: &[Interceptor<C>], name: &str) -> Vec<Interceptor<C>> {
    chain.iter().filter(|i| i.name() != name).cloned().collect()
}

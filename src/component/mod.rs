//! # Component abstractions.
//!
//! This module provides the capability set the supervisor consumes:
//! - [`Component`] - trait with `name` / `start` / `stop`
//! - [`ComponentFn`] - closure-backed component implementation
//! - [`ComponentRef`] - shared reference to a component (`Arc<dyn Component>`)
//! - [`StopContext`] - deadline-bound context passed to `stop`

mod component;
mod component_fn;
mod stop;

pub use component::{Component, ComponentRef};
pub use component_fn::ComponentFn;
pub use stop::StopContext;

//! Flutter-facing bindings for LazyTodo core.

pub mod api;

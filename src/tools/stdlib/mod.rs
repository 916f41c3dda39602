//! Standard library tools for Schemelet

pub mod io_basic;
pub mod numeric;
pub mod sequences;
pub mod strings;
pub mod type_predicates;

use crate::tools::ToolRegistry;

/// Register all standard library tools
pub fn register_all(registry: &mut ToolRegistry) {
    numeric::register(registry);
    sequences::register(registry);
    type_predicates::register(registry);
    strings::register(registry);
    io_basic::register(registry);
}

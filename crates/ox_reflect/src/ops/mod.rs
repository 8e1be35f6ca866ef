//! Generic operations over objects: cloning, comparison, display,
//! child enumeration and textual argument parsing.

mod arguments;
mod children;
mod clone;
mod compare;
mod display;

pub use arguments::{load_arguments, parse_list_with_parenthesis};
pub use children::all_child_objects;
pub use clone::{clone_object, deep_clone};
pub use compare::compare;
pub use display::{object_to_string, variables_to_string};

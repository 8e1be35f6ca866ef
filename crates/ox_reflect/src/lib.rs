#![doc = include_str!("../README.md")]

pub mod info;
pub mod ops;
pub mod registry;
pub mod value;
pub mod xml;

mod object;

pub use object::{
    DynamicObject, Object, ObjectId, ObjectRef, ObjectVector, Pair, TypeObject, new_object,
    object_id, same_object,
};
pub use value::Variant;

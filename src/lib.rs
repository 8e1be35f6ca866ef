#![doc = include_str!("../README.md")]

pub use ox_reflect as reflect;

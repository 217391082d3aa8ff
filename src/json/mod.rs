//! Property naming policies and key-renaming JSON serialization

pub mod naming;
pub mod serializer;

pub use naming::{convert, to_snake_case, NamingError, NamingPolicy, SnakeCase};
pub use serializer::{to_json_string_with, to_snake_case_json, to_value_with, SerializationError};

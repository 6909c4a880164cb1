//! Value codec for lake-sync.
//!
//! This crate provides bidirectional conversion between lake-core's engine
//! [`Value`](lake_core::Value)s and the table store's native representation.
//!
//! # Architecture
//!
//! ```text
//! Forward (sink):    Value → NativeValue → Arrow array (one per column)
//! Reverse (source):  Arrow array → NativeValue → Value
//! ```
//!
//! # Modules
//!
//! - [`forward`] - Value → NativeValue encoding and the semantic → column type mapping
//! - [`reverse`] - NativeValue → Value decoding
//! - [`columnar`] - NativeValue ⇄ Arrow arrays, table schema → Arrow schema
//! - [`codec`] - [`ValueCodec`], which carries the registered object serializer
//!
//! # Example
//!
//! ```rust
//! use lake_core::{SemanticType, Value};
//! use lake_types::ValueCodec;
//!
//! let codec = ValueCodec::new();
//! let native = codec.encode(&Value::Int(42), SemanticType::Int).unwrap();
//! assert_eq!(codec.decode(&native, SemanticType::Int).unwrap(), Value::Int(42));
//! ```

pub mod codec;
pub mod columnar;
pub mod forward;
pub mod native;
pub mod reverse;

// Re-export main types for convenient access
pub use codec::ValueCodec;
pub use columnar::{
    arrow_data_type, arrow_field, arrow_schema, build_array, field_id, native_value_at, FIELD_ID_KEY,
};
pub use forward::{column_type_for, encode_value};
pub use native::NativeValue;
pub use reverse::decode_value;

use std::sync::Arc;

use lake_core::{ColumnType, ObjectSerializer, Result, SemanticType, Value};

use crate::forward::{column_type_for, encode_value};
use crate::native::NativeValue;
use crate::reverse::decode_value;

/// Converts values between the engine and the table store.
///
/// Encoding objects uses the serializer attached to each value. Decoding
/// objects uses the serializer registered with
/// [`with_object_serializer`](Self::with_object_serializer).
#[derive(Clone, Default)]
pub struct ValueCodec {
    object_serializer: Option<Arc<dyn ObjectSerializer>>,
}

impl ValueCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object_serializer(mut self, serializer: Arc<dyn ObjectSerializer>) -> Self {
        self.object_serializer = Some(serializer);
        self
    }

    pub fn object_serializer(&self) -> Option<&Arc<dyn ObjectSerializer>> {
        self.object_serializer.as_ref()
    }

    pub fn column_type(&self, ty: SemanticType) -> ColumnType {
        column_type_for(ty)
    }

    pub fn encode(&self, value: &Value, ty: SemanticType) -> Result<NativeValue> {
        encode_value(value, ty)
    }

    pub fn decode(&self, native: &NativeValue, ty: SemanticType) -> Result<Value> {
        decode_value(native, ty, self.object_serializer.as_ref())
    }
}

impl std::fmt::Debug for ValueCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueCodec")
            .field(
                "object_serializer",
                &self.object_serializer.as_ref().map(|s| s.name().to_string()),
            )
            .finish()
    }
}

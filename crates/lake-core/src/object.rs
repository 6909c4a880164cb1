//! Wrapped objects with caller-supplied serialization.
//!
//! An [`ObjectValue`] pairs an arbitrary payload with the
//! [`ObjectSerializer`] that knows how to turn it into bytes and back. The
//! connector never looks inside the bytes; it only stores and returns them.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ConnectorError, Result};

/// Shared, type-erased object payload.
pub type ObjectPayload = Arc<dyn Any + Send + Sync>;

/// Serialization capability for wrapped objects.
pub trait ObjectSerializer: Send + Sync {
    /// Name used in diagnostics and for equality of serialized objects.
    fn name(&self) -> &str;

    fn serialize(&self, payload: &(dyn Any + Send + Sync)) -> Result<Vec<u8>>;

    fn deserialize(&self, bytes: &[u8]) -> Result<ObjectPayload>;
}

/// A payload together with the serializer that owns its byte format.
#[derive(Clone)]
pub struct ObjectValue {
    payload: ObjectPayload,
    serializer: Arc<dyn ObjectSerializer>,
}

impl ObjectValue {
    pub fn new<T: Any + Send + Sync>(value: T, serializer: Arc<dyn ObjectSerializer>) -> Self {
        Self {
            payload: Arc::new(value),
            serializer,
        }
    }

    pub fn from_payload(payload: ObjectPayload, serializer: Arc<dyn ObjectSerializer>) -> Self {
        Self {
            payload,
            serializer,
        }
    }

    /// Decode an object from its stored bytes.
    pub fn from_bytes(bytes: &[u8], serializer: Arc<dyn ObjectSerializer>) -> Result<Self> {
        let payload = serializer.deserialize(bytes)?;
        Ok(Self::from_payload(payload, serializer))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.serializer.serialize(self.payload.as_ref())
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    /// Invoke `f` against the payload.
    ///
    /// Fails with `TypeMismatch` if the payload is not a `T`.
    pub fn apply<T: Any, R>(&self, f: impl FnOnce(&T) -> R) -> Result<R> {
        self.downcast_ref::<T>()
            .map(f)
            .ok_or_else(|| ConnectorError::type_mismatch(std::any::type_name::<T>(), "object payload"))
    }

    pub fn serializer(&self) -> &Arc<dyn ObjectSerializer> {
        &self.serializer
    }
}

impl PartialEq for ObjectValue {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.payload, &other.payload) {
            return true;
        }
        if self.serializer.name() != other.serializer.name() {
            return false;
        }
        match (self.to_bytes(), other.to_bytes()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl std::fmt::Debug for ObjectValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectValue")
            .field("serializer", &self.serializer.name())
            .finish_non_exhaustive()
    }
}

/// Serializer for any serde type, storing the payload as JSON bytes.
pub struct JsonObjectSerializer<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonObjectSerializer<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    pub fn shared() -> Arc<dyn ObjectSerializer> {
        Arc::new(Self::new())
    }
}

impl<T> Default for JsonObjectSerializer<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ObjectSerializer for JsonObjectSerializer<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        std::any::type_name::<T>()
    }

    fn serialize(&self, payload: &(dyn Any + Send + Sync)) -> Result<Vec<u8>> {
        let value = payload.downcast_ref::<T>().ok_or_else(|| {
            ConnectorError::ObjectSerialization(format!(
                "payload is not a {}",
                std::any::type_name::<T>()
            ))
        })?;
        serde_json::to_vec(value).map_err(|e| ConnectorError::ObjectSerialization(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<ObjectPayload> {
        let value: T = serde_json::from_slice(bytes)
            .map_err(|e| ConnectorError::ObjectSerialization(e.to_string()))?;
        Ok(Arc::new(value))
    }
}

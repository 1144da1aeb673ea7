// Copyright 2026 foyer Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{fmt::Debug, hash::Hash, marker::PhantomData};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

/// Key trait for the cache.
pub trait Key: Send + Sync + 'static + Hash + Eq + Clone + Debug {}
impl<T: Send + Sync + 'static + Hash + Eq + Clone + Debug> Key for T {}

/// Value trait for the cache.
pub trait Value: Send + Sync + 'static + Clone {}
impl<T: Send + Sync + 'static + Clone> Value for T {}

/// Converts values of `T` to and from byte payloads.
///
/// Implementations must round-trip exactly: `deserialize(&serialize(v)?)? == v`.
pub trait Serializer<T>: Send + Sync + 'static {
    /// Encode the value into a new payload.
    fn serialize(&self, value: &T) -> Result<Vec<u8>>;

    /// Decode a value from the payload.
    fn deserialize(&self, payload: &[u8]) -> Result<T>;
}

/// [`Serializer`] backed by `serde` and `bincode`.
pub struct BincodeSerializer<T>(PhantomData<fn() -> T>);

impl<T> Debug for BincodeSerializer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BincodeSerializer").finish()
    }
}

impl<T> Default for BincodeSerializer<T> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<T> Clone for BincodeSerializer<T> {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl<T> Serializer<T> for BincodeSerializer<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    fn serialize(&self, value: &T) -> Result<Vec<u8>> {
        let payload = bincode::serialize(value)?;
        Ok(payload)
    }

    fn deserialize(&self, payload: &[u8]) -> Result<T> {
        let value = bincode::deserialize(payload)?;
        Ok(value)
    }
}

/// Identity [`Serializer`] for raw byte values.
#[derive(Debug, Default, Clone, Copy)]
pub struct BytesSerializer;

impl Serializer<Vec<u8>> for BytesSerializer {
    fn serialize(&self, value: &Vec<u8>) -> Result<Vec<u8>> {
        Ok(value.clone())
    }

    fn deserialize(&self, payload: &[u8]) -> Result<Vec<u8>> {
        Ok(payload.to_vec())
    }
}

impl<T, S> Serializer<T> for std::sync::Arc<S>
where
    S: Serializer<T> + ?Sized,
{
    fn serialize(&self, value: &T) -> Result<Vec<u8>> {
        self.as_ref().serialize(value)
    }

    fn deserialize(&self, payload: &[u8]) -> Result<T> {
        self.as_ref().deserialize(payload)
    }
}

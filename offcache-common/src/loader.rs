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

/// Trait for the customized loader that fills the cache on a miss.
pub trait CacheLoader: Send + Sync + 'static {
    /// Associated key type.
    type Key;
    /// Associated value type.
    type Value;

    /// Load the value of `key` from the source of truth.
    ///
    /// `Ok(None)` means the source has no value for the key; nothing is cached then.
    fn load(&self, key: &Self::Key) -> anyhow::Result<Option<Self::Value>>;
}

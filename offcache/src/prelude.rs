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

pub use crate::{
    common::{
        code::{BincodeSerializer, BytesSerializer, Key, Serializer, Value},
        error::{Error, ErrorKind, Result, StaleItemError},
        event::{Event, EvictionListener},
        loader::CacheLoader,
        stats::{CacheStats, StatsSnapshot},
    },
    offheap::{
        builder::OffHeapCacheBuilder,
        cache::OffHeapCache,
        config::OffHeapCacheConfig,
        eviction::{EvictionConfig, FifoConfig, LruConfig},
    },
    remote::{ConnectionError, RemoteCache, RemoteClient},
    search::{
        accessor, Accessor, AttributeValue, CacheIndexHandler, Criteria, Filter, IndexHandler, IndexType,
        NoopIndexHandler, Predicate, Query,
    },
    storage::{BufferUsage, ByteStore, ByteStoreConfig, Pointer},
    traits::{Cache, SearchableCache},
    versioned::{
        VersionedEvictionListener, VersionedItem, VersionedLoader, VersionedOffHeapCache, VersionedSerializer,
    },
};

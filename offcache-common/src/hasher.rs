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

use std::hash::{BuildHasher, Hash, Hasher};

use twox_hash::XxHash64;

/// Seed shared by every stripe hasher, so a key maps to the same stripe in every cache instance.
const STRIPE_HASH_SEED: u64 = 0;

/// A deterministic [`BuildHasher`] used to pick lock stripes.
#[derive(Debug, Default, Clone, Copy)]
pub struct StripeHasher;

impl BuildHasher for StripeHasher {
    type Hasher = XxHash64;

    fn build_hasher(&self) -> Self::Hasher {
        XxHash64::with_seed(STRIPE_HASH_SEED)
    }
}

/// Hash a key with [`StripeHasher`].
pub fn hash_key<Q>(key: &Q) -> u64
where
    Q: Hash + ?Sized,
{
    let mut hasher = StripeHasher.build_hasher();
    key.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stripe_hasher_deterministic() {
        for i in 0..1024u64 {
            assert_eq!(hash_key(&i), hash_key(&i));
            assert_eq!(hash_key(&i), StripeHasher.hash_one(i));
        }
        assert_eq!(hash_key("key"), hash_key(&"key".to_string()));
    }
}

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

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Deterministic payload of `len` bytes for `seed`, so readers can verify what they read.
pub fn text(seed: u64, len: usize) -> Vec<u8> {
    let start = (seed % ALPHABET.len() as u64) as usize;
    (0..len).map(|i| ALPHABET[(start + i) % ALPHABET.len()]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_deterministic() {
        assert_eq!(text(0, 4), b"abcd");
        assert_eq!(text(37, 3), b"bcd");
        assert_eq!(text(35, 3), b"9ab");
        assert!(text(7, 0).is_empty());
    }
}

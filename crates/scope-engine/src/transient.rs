// Copyright 2025 Chris Custine
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

//! A map whose entries expire after a fixed lifetime.

use std::collections::HashMap;
use std::hash::Hash;

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires: DateTime<Utc>,
}

/// Key/value map with per-entry expiry, evaluated against caller-supplied
/// time so it stays deterministic under test.
#[derive(Debug, Clone)]
pub struct TransientMap<K, V> {
    entries: HashMap<K, Entry<V>>,
}

impl<K, V> Default for TransientMap<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V> TransientMap<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` for `key`, replacing any previous entry; it lives until
    /// `now + lifetime`.
    pub fn add(&mut self, key: K, value: V, now: DateTime<Utc>, lifetime: Duration) {
        self.entries.insert(
            key,
            Entry {
                value,
                expires: now + lifetime,
            },
        );
    }

    /// Value for `key` if it has not expired at `now`.
    #[must_use]
    pub fn get(&self, key: &K, now: DateTime<Utc>) -> Option<&V> {
        self.entries
            .get(key)
            .filter(|e| now < e.expires)
            .map(|e| &e.value)
    }

    /// Drop expired entries, returning the keys that were removed.
    pub fn expire(&mut self, now: DateTime<Utc>) -> Vec<K>
    where
        K: Clone,
    {
        let expired: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, e)| now >= e.expires)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            self.entries.remove(key);
        }
        expired
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|e| e.value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Client-side query cache.
//!
//! Queries move `Idle -> Loading -> Success | Error`. A stale entry keeps
//! its last good payload until the refetch lands; mutations mark related
//! keys stale only when they succeed.

use std::collections::HashMap;
use std::fmt::{self, Display};
use std::time::{Duration, Instant};

use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        QueryKey(parts.into_iter().map(Into::into).collect())
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<T> {
    Idle,
    Loading,
    Success(T),
    Error(String),
}

impl<T> QueryState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            QueryState::Success(v) => Some(v),
            _ => None,
        }
    }
}

struct Entry<T> {
    state: QueryState<T>,
    /// Last successful payload, kept while a refetch is in flight or failed.
    last_good: Option<T>,
    fetched_at: Option<Instant>,
    invalidated: bool,
}

pub struct QueryCache<T> {
    entries: HashMap<QueryKey, Entry<T>>,
    stale_after: Duration,
}

impl<T: Clone> QueryCache<T> {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            stale_after,
        }
    }

    pub fn state(&self, key: &QueryKey) -> QueryState<T> {
        self.entries
            .get(key)
            .map_or(QueryState::Idle, |e| e.state.clone())
    }

    /// The freshest payload available, even if stale or being refetched.
    pub fn data(&self, key: &QueryKey) -> Option<&T> {
        self.entries.get(key).and_then(|e| e.last_good.as_ref())
    }

    pub fn is_stale(&self, key: &QueryKey) -> bool {
        match self.entries.get(key) {
            Some(e) => {
                e.invalidated
                    || e.fetched_at
                        .is_none_or(|t| t.elapsed() >= self.stale_after)
            }
            None => true,
        }
    }

    pub fn begin(&mut self, key: &QueryKey) {
        let entry = self.entries.entry(key.clone()).or_insert_with(|| Entry {
            state: QueryState::Idle,
            last_good: None,
            fetched_at: None,
            invalidated: false,
        });
        entry.state = QueryState::Loading;
    }

    pub fn resolve<E: Display>(&mut self, key: &QueryKey, result: &Result<T, E>) {
        self.begin_if_absent(key);
        if let Some(entry) = self.entries.get_mut(key) {
            match result {
                Ok(v) => {
                    entry.state = QueryState::Success(v.clone());
                    entry.last_good = Some(v.clone());
                    entry.fetched_at = Some(Instant::now());
                    entry.invalidated = false;
                }
                Err(e) => entry.state = QueryState::Error(e.to_string()),
            }
        }
    }

    fn begin_if_absent(&mut self, key: &QueryKey) {
        if !self.entries.contains_key(key) {
            self.begin(key);
        }
    }

    /// Serve a fresh cached payload, otherwise run `fetcher` and record the outcome.
    pub fn fetch<E: Display>(
        &mut self,
        key: &QueryKey,
        fetcher: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        if !self.is_stale(key) {
            if let Some(v) = self.entries.get(key).and_then(|e| e.state.data()) {
                debug!(%key, "cache hit");
                return Ok(v.clone());
            }
        }
        self.begin(key);
        let result = fetcher();
        self.resolve(key, &result);
        result
    }

    /// Mark every key under `prefix` stale; returns how many were touched.
    pub fn invalidate(&mut self, prefix: &QueryKey) -> usize {
        let mut n = 0;
        for (key, entry) in self.entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.invalidated = true;
                n += 1;
            }
        }
        debug!(%prefix, invalidated = n, "cache invalidate");
        n
    }

    /// Run a mutation; on success invalidate `prefixes`, on failure leave the cache alone.
    pub fn mutate<R, E>(
        &mut self,
        prefixes: &[QueryKey],
        op: impl FnOnce() -> Result<R, E>,
    ) -> Result<R, E> {
        let out = op()?;
        for p in prefixes {
            self.invalidate(p);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn cache() -> QueryCache<Value> {
        QueryCache::new(Duration::from_secs(300))
    }

    #[test]
    fn fetch_moves_through_loading_to_success_with_payload_unchanged() {
        let mut c = cache();
        let key = QueryKey::new(["tanks"]);
        assert_eq!(c.state(&key), QueryState::Idle);

        c.begin(&key);
        assert!(c.state(&key).is_loading());

        let payload = json!([{"id": 1, "name": "T1", "capacity_liters": "20000"}]);
        c.resolve::<String>(&key, &Ok(payload.clone()));
        assert_eq!(c.state(&key), QueryState::Success(payload.clone()));
        assert_eq!(c.data(&key), Some(&payload));
    }

    #[test]
    fn failed_fetch_records_error_and_keeps_last_good_payload() {
        let mut c = cache();
        let key = QueryKey::new(["tanks"]);
        c.fetch(&key, || Ok::<_, String>(json!([1]))).unwrap();
        c.invalidate(&key);

        let err = c.fetch(&key, || Err::<Value, _>("503 upstream".to_string()));
        assert_eq!(err.unwrap_err(), "503 upstream");
        assert_eq!(c.state(&key), QueryState::Error("503 upstream".into()));
        assert_eq!(c.data(&key), Some(&json!([1])));
    }

    #[test]
    fn fresh_entries_are_served_without_refetch() {
        let mut c = cache();
        let key = QueryKey::new(["providers"]);
        let mut calls = 0;
        for _ in 0..3 {
            c.fetch(&key, || {
                calls += 1;
                Ok::<_, String>(json!({"n": 1}))
            })
            .unwrap();
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn zero_ttl_always_refetches() {
        let mut c: QueryCache<Value> = QueryCache::new(Duration::ZERO);
        let key = QueryKey::new(["providers"]);
        c.fetch(&key, || Ok::<_, String>(json!(1))).unwrap();
        assert!(c.is_stale(&key));
    }

    #[test]
    fn successful_mutation_invalidates_only_matching_keys() {
        let mut c = cache();
        let list = QueryKey::new(["tanks"]);
        let one = QueryKey::new(["tanks", "3"]);
        let other = QueryKey::new(["providers"]);
        for k in [&list, &one, &other] {
            c.fetch(k, || Ok::<_, String>(json!(null))).unwrap();
        }

        c.mutate(&[QueryKey::new(["tanks"])], || Ok::<_, String>(()))
            .unwrap();
        assert!(c.is_stale(&list));
        assert!(c.is_stale(&one));
        assert!(!c.is_stale(&other));
    }

    #[test]
    fn failed_mutation_leaves_cache_untouched() {
        let mut c = cache();
        let list = QueryKey::new(["tanks"]);
        c.fetch(&list, || Ok::<_, String>(json!([]))).unwrap();

        let res = c.mutate(&[list.clone()], || Err::<(), _>("422".to_string()));
        assert!(res.is_err());
        assert!(!c.is_stale(&list));
    }
}

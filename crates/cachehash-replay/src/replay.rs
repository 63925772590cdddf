//! Trace replay through a CacheHash

use std::io::BufRead;

use anyhow::{Context, Result};
use cachehash::CacheHash;
use tracing::{debug, info};

/// How each request looks up its key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// `get`: hits move to the head of the recency list
    Promote,
    /// `has`: hits leave recency untouched (insertion-order eviction)
    Peek,
}

/// Replay counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub requests: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl Summary {
    /// Calculate hit ratio (0.0 to 1.0)
    pub fn hit_ratio(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.hits as f64 / self.requests as f64
        }
    }
}

/// Feeds keys to a cache, inserting on every miss
pub struct Replayer {
    /// Values are the trace line that inserted the key
    cache: CacheHash<u64>,
    mode: Mode,
    summary: Summary,
}

impl Replayer {
    /// Create a replayer over a fresh cache
    pub fn new(capacity: usize, mode: Mode) -> Result<Self> {
        let cache = CacheHash::try_new(capacity).context("invalid cache capacity")?;
        Ok(Self {
            cache,
            mode,
            summary: Summary::default(),
        })
    }

    /// Replay one request; returns whether it hit
    pub fn request(&mut self, key: &[u8], line: u64) -> bool {
        let hit = match self.mode {
            Mode::Promote => self.cache.get(key).is_some(),
            Mode::Peek => self.cache.has(key).is_some(),
        };

        self.summary.requests += 1;
        if hit {
            self.summary.hits += 1;
        } else {
            self.summary.misses += 1;
            self.cache.put(key, line);
        }
        hit
    }

    /// Replay a newline-separated trace; blank lines are skipped
    pub fn run<R: BufRead>(&mut self, reader: R) -> Result<Summary> {
        for (n, line) in reader.split(b'\n').enumerate() {
            let mut key = line.with_context(|| format!("failed to read trace line {}", n + 1))?;
            if key.last() == Some(&b'\r') {
                key.pop();
            }
            if key.is_empty() {
                continue;
            }
            self.request(&key, n as u64 + 1);
        }

        let summary = self.summary();
        info!(
            requests = summary.requests,
            hits = summary.hits,
            evictions = summary.evictions,
            "trace replayed"
        );
        Ok(summary)
    }

    /// Counters so far
    pub fn summary(&self) -> Summary {
        Summary {
            evictions: self.cache.stats().evictions(),
            ..self.summary
        }
    }

    /// Tear down the cache and return the final counters
    pub fn finish(self) -> Summary {
        let summary = self.summary();
        let mut resident = 0usize;
        self.cache.free_with(|_| resident += 1);
        debug!(resident, "cache released");
        summary
    }
}

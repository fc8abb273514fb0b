/*
    FluxFox
    https://github.com/dbalsom/fluxfox

    Copyright 2024 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------
*/

//! [`DemandDisk`]: a [`crate::disk::Disk`]-shaped view over a
//! [`crate::transport::Transport`] that loads each track lazily, on first
//! access, and retries noisy physical reads up to a configurable budget.

use crate::chs::CylHead;
use crate::error::Result;
use crate::format::Format;
use crate::range::Range;
use crate::trackdata::TrackData;
use crate::transport::Transport;
use crate::worker_pool::WorkerPool;
use log::{debug, trace};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

/// Revolutions requested on a track's first read.
pub const FIRST_READ_REVS: u32 = 2;
/// Revolutions requested on each subsequent retry read.
pub const REMAIN_READ_REVS: u32 = 5;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub first_read_revs: u32,
    pub remain_read_revs: u32,
    pub max_retries: u32,
    pub min_rescans: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { first_read_revs: FIRST_READ_REVS, remain_read_revs: REMAIN_READ_REVS, max_retries: 5, min_rescans: 1 }
    }
}

struct Shared {
    loaded: Mutex<HashSet<CylHead>>,
    tracks: Mutex<HashMap<CylHead, TrackData>>,
}

pub struct DemandDisk {
    format: Mutex<Format>,
    transport: Arc<dyn Transport>,
    retry_policy: RetryPolicy,
    shared: Arc<Shared>,
    pool: WorkerPool,
}

impl DemandDisk {
    pub fn new(format: Format, transport: Arc<dyn Transport>) -> Self {
        Self::with_retry_policy(format, transport, RetryPolicy::default())
    }

    pub fn with_retry_policy(format: Format, transport: Arc<dyn Transport>, retry_policy: RetryPolicy) -> Self {
        Self {
            format: Mutex::new(format),
            transport,
            retry_policy,
            shared: Arc::new(Shared { loaded: Mutex::new(HashSet::new()), tracks: Mutex::new(HashMap::new()) }),
            pool: WorkerPool::new(),
        }
    }

    /// A snapshot of the stored geometry. After [`DemandDisk::write`],
    /// `sectors_per_track` reads back as `0` until re-probed.
    pub fn format(&self) -> Format {
        *self.format.lock().expect("format poisoned")
    }

    /// Read a track, loading and caching it on first access. `uncached`
    /// forces a fresh load even if a cached copy exists.
    pub fn read(&self, cylhead: CylHead, uncached: bool) -> Result<TrackData> {
        let already_loaded = self.shared.loaded.lock().expect("loaded set poisoned").contains(&cylhead);
        if already_loaded && !uncached {
            let tracks = self.shared.tracks.lock().expect("track map poisoned");
            return Ok(tracks.get(&cylhead).cloned().unwrap_or_default());
        }

        let data = if self.transport.supports_retries() {
            self.load_with_retries(cylhead, !already_loaded)?
        }
        else {
            self.transport.load(cylhead, !already_loaded)?
        };

        let mut tracks = self.shared.tracks.lock().expect("track map poisoned");
        tracks.insert(cylhead, data.clone());
        self.shared.loaded.lock().expect("loaded set poisoned").insert(cylhead);
        Ok(data)
    }

    fn load_with_retries(&self, cylhead: CylHead, first_read: bool) -> Result<TrackData> {
        let sectors_per_track = self.format.lock().expect("format poisoned").sectors_per_track as usize;
        let mut accumulated = self.transport.load(cylhead, first_read)?;
        let mut rescans = 0u32;
        for attempt in 0..self.retry_policy.max_retries {
            let (sector_count, has_errors) = match &accumulated {
                TrackData::Decoded(track) => (track.len(), track.sectors().iter().any(|s| s.bad_data_crc)),
                _ => (0, true),
            };
            // (a): every sector present and none carry a bad data CRC.
            if sector_count >= sectors_per_track && !has_errors {
                break;
            }
            rescans += 1;
            // (c): we've rescanned enough times and no errors remain, even
            // if the sector count never reached the format's full count
            // (e.g. a disk with deliberately unformatted/weak sectors).
            if rescans >= self.retry_policy.min_rescans && !has_errors {
                break;
            }
            trace!("retrying track {cylhead} (attempt {attempt})");
            let retry = self.transport.load(cylhead, false)?;
            accumulated = merge_track_data(accumulated, retry);
        }
        debug!("track {cylhead} loaded after {rescans} rescan(s)");
        Ok(accumulated)
    }

    /// Enqueue a `load` for every `CylHead` in `range` on the worker pool
    /// and block until all complete, or until [`DemandDisk::abort`] is
    /// observed between submissions.
    pub fn preload(&self, range: Range) {
        for cylhead in range.iter() {
            if self.pool.is_aborted() {
                break;
            }
            let transport = Arc::clone(&self.transport);
            let shared = Arc::clone(&self.shared);
            self.pool.submit(move |pool_abort| {
                if pool_abort.load(Ordering::SeqCst) {
                    return;
                }
                if let Ok(data) = transport.load(cylhead, true) {
                    shared.tracks.lock().expect("track map poisoned").insert(cylhead, data);
                    shared.loaded.lock().expect("loaded set poisoned").insert(cylhead);
                }
            });
        }
        self.pool.wait_idle();
    }

    pub fn abort(&self) {
        self.pool.abort();
    }

    /// Replace the cached data for a track and invalidate the stored
    /// `Format.sectors_per_track`: a write means the caller knows the
    /// track's true contents better than this disk's nominal geometry, so
    /// that geometry can no longer be trusted until re-probed.
    pub fn write(&self, cylhead: CylHead, data: TrackData) -> Result<()> {
        if self.transport.supports_retries() {
            self.transport.save(cylhead, &data)?;
        }
        self.format.lock().expect("format poisoned").sectors_per_track = 0;
        self.shared.tracks.lock().expect("track map poisoned").insert(cylhead, data);
        self.shared.loaded.lock().expect("loaded set poisoned").insert(cylhead);
        Ok(())
    }
}

fn merge_track_data(base: TrackData, incoming: TrackData) -> TrackData {
    match (base, incoming) {
        (TrackData::Decoded(mut base_track), TrackData::Decoded(incoming_track)) => {
            for sector in incoming_track.sectors().iter().cloned() {
                let _ = base_track.add(sector);
            }
            TrackData::Decoded(base_track)
        }
        (_, incoming) => incoming,
    }
}

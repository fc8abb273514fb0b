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

//! A small fixed-size worker pool for fanning reads/writes out across
//! multiple physical tracks concurrently, with a process-wide abort flag so
//! a cancelled operation stops promptly instead of draining its whole queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

type Job = Box<dyn FnOnce(&AtomicBool) + Send + 'static>;

pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    abort: Arc<AtomicBool>,
    pending: Arc<(Mutex<usize>, Condvar)>,
}

impl WorkerPool {
    /// Spawn a pool sized to the machine's available parallelism (falling
    /// back to 1 if it cannot be determined).
    pub fn new() -> Self {
        let size = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self::with_size(size)
    }

    pub fn with_size(size: usize) -> Self {
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));
        let abort = Arc::new(AtomicBool::new(false));
        let mut workers = Vec::with_capacity(size.max(1));
        for _ in 0..size.max(1) {
            let receiver: Arc<Mutex<Receiver<Job>>> = Arc::clone(&receiver);
            let abort = Arc::clone(&abort);
            workers.push(std::thread::spawn(move || loop {
                let job = {
                    let guard = receiver.lock().expect("worker pool receiver poisoned");
                    guard.recv()
                };
                match job {
                    Ok(job) => job(&abort),
                    Err(_) => break,
                }
            }));
        }
        Self { sender: Some(sender), workers, abort, pending: Arc::new((Mutex::new(0), Condvar::new())) }
    }

    /// Queue a job. `job` receives the pool's abort flag and should check it
    /// periodically during long-running work.
    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce(&AtomicBool) + Send + 'static,
    {
        if let Some(sender) = &self.sender {
            *self.pending.0.lock().expect("pending counter poisoned") += 1;
            let pending = Arc::clone(&self.pending);
            let wrapped: Job = Box::new(move |abort| {
                job(abort);
                let (lock, cvar) = &*pending;
                let mut count = lock.lock().expect("pending counter poisoned");
                *count -= 1;
                if *count == 0 {
                    cvar.notify_all();
                }
            });
            let _ = sender.send(wrapped);
        }
    }

    /// Block until every job submitted so far has run to completion.
    pub fn wait_idle(&self) {
        let (lock, cvar) = &*self.pending;
        let mut count = lock.lock().expect("pending counter poisoned");
        while *count > 0 {
            count = cvar.wait(count).expect("pending counter poisoned");
        }
    }

    /// Request that in-flight and queued jobs stop as soon as they next
    /// check the abort flag.
    pub fn abort(&self) {
        self.abort.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.load(Ordering::SeqCst)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Barrier;
    use std::time::Duration;

    #[test]
    fn jobs_run_across_multiple_workers() {
        let pool = WorkerPool::with_size(4);
        let counter = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(5));
        for _ in 0..4 {
            let counter = Arc::clone(&counter);
            let barrier = Arc::clone(&barrier);
            pool.submit(move |_abort| {
                counter.fetch_add(1, Ordering::SeqCst);
                barrier.wait();
            });
        }
        barrier.wait();
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn wait_idle_blocks_until_all_submitted_jobs_finish() {
        let pool = WorkerPool::with_size(2);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..8 {
            let counter = Arc::clone(&counter);
            pool.submit(move |_abort| {
                std::thread::sleep(Duration::from_millis(5));
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        pool.wait_idle();
        assert_eq!(counter.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn abort_flag_is_observable_by_queued_jobs() {
        let pool = WorkerPool::with_size(1);
        let observed = Arc::new(AtomicBool::new(false));
        let observed2 = Arc::clone(&observed);
        pool.abort();
        pool.submit(move |abort| {
            observed2.store(abort.load(Ordering::SeqCst), Ordering::SeqCst);
        });
        std::thread::sleep(Duration::from_millis(20));
        assert!(observed.load(Ordering::SeqCst));
    }
}

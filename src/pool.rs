use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

struct PoolShared {
    queue: Mutex<VecDeque<Job>>,
    work_available: Condvar,
    all_done: Condvar,
    active_jobs: AtomicUsize,
    stop: AtomicBool,
}

/// Fixed pool of worker threads draining a FIFO queue.
///
/// `active_jobs` counts queued plus running jobs; `wait_all` is the phase
/// barrier the renderer uses between clear, binning and rasterization. The
/// counter and the stop flag are updated under the queue mutex because both
/// condition variables wait on it.
pub struct ThreadPool {
    shared: Arc<PoolShared>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    pub fn new(thread_count: usize) -> ThreadPool {
        let shared = Arc::new(PoolShared {
            queue: Mutex::new(VecDeque::new()),
            work_available: Condvar::new(),
            all_done: Condvar::new(),
            active_jobs: AtomicUsize::new(0),
            stop: AtomicBool::new(false),
        });

        let workers = (0..thread_count.max(1))
            .map(|_| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || worker_loop(&shared))
            })
            .collect();

        ThreadPool { shared, workers }
    }

    pub fn execute<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut queue = self
                .shared
                .queue
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            queue.push_back(Box::new(job));
            self.shared.active_jobs.fetch_add(1, Ordering::SeqCst);
        }
        self.shared.work_available.notify_one();
    }

    /// Block until every enqueued job has finished.
    pub fn wait_all(&self) {
        let mut queue = self
            .shared
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while self.shared.active_jobs.load(Ordering::SeqCst) != 0 || !queue.is_empty() {
            queue = self
                .shared
                .all_done
                .wait(queue)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        {
            let _queue = self
                .shared
                .queue
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            self.shared.stop.store(true, Ordering::SeqCst);
        }
        self.shared.work_available.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn worker_loop(shared: &PoolShared) {
    loop {
        let job = {
            let mut queue = shared.queue.lock().unwrap_or_else(PoisonError::into_inner);
            loop {
                if shared.stop.load(Ordering::SeqCst) && queue.is_empty() {
                    return;
                }
                match queue.pop_front() {
                    Some(job) => break job,
                    None => {
                        queue = shared
                            .work_available
                            .wait(queue)
                            .unwrap_or_else(PoisonError::into_inner);
                    }
                }
            }
        };

        // a panicking job must not wedge wait_all
        let _ = catch_unwind(AssertUnwindSafe(job));

        {
            let _queue = shared.queue.lock().unwrap_or_else(PoisonError::into_inner);
            shared.active_jobs.fetch_sub(1, Ordering::SeqCst);
        }
        shared.all_done.notify_all();
    }
}

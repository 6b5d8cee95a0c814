use tokio::runtime::{Builder, Runtime};

/// Worker threads are I/O bound, a small fixed pool is enough for any
/// segment count.
const WORKER_THREADS: usize = 4;

pub fn build() -> std::io::Result<Runtime> {
    Builder::new_multi_thread()
        .worker_threads(WORKER_THREADS)
        .thread_name("segfetch-worker")
        .enable_io()
        .enable_time()
        .build()
}

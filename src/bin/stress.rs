use shmqueue::queue::{QueueError, SharedQueue};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

const PRODUCERS: usize = 2;
const CONSUMERS: usize = 2;
const CAPACITY: usize = 1024;
const ITEM_SIZE: usize = 8;
const RUN_SECS: u64 = 5;
const POLL: Duration = Duration::from_millis(10);

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "shmqueue stress: {} producers / {} consumers, capacity {}\n",
        PRODUCERS, CONSUMERS, CAPACITY
    );

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .map_err(|e| format!("Failed to set Ctrl+C handler: {}", e))?;

    let queue = SharedQueue::with_item_size(CAPACITY, ITEM_SIZE)?;
    let produced = AtomicU64::new(0);
    let consumed = AtomicU64::new(0);

    std::thread::scope(|scope| {
        for worker in 0..PRODUCERS {
            let q = &queue;
            let running = &running;
            let produced = &produced;
            scope.spawn(move || {
                let mut next = worker as i64;
                while running.load(Ordering::Relaxed) {
                    match q.enqueue_timeout(next, POLL) {
                        Ok(()) => {
                            produced.fetch_add(1, Ordering::Relaxed);
                            next += PRODUCERS as i64;
                        }
                        Err(QueueError::Timeout { .. }) => {}
                        Err(_) => break,
                    }
                }
            });
        }

        for _ in 0..CONSUMERS {
            let q = &queue;
            let running = &running;
            let consumed = &consumed;
            scope.spawn(move || {
                loop {
                    match q.dequeue_timeout(POLL) {
                        Ok(_) => {
                            consumed.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(QueueError::Timeout { .. }) => {
                            if !running.load(Ordering::Relaxed) && q.is_empty() {
                                break;
                            }
                        }
                        Err(_) => break,
                    }
                }
            });
        }

        println!("Running for {} seconds...", RUN_SECS);
        std::thread::sleep(Duration::from_secs(RUN_SECS));
        running.store(false, Ordering::SeqCst);
    });

    let produced = produced.load(Ordering::Relaxed);
    let consumed = consumed.load(Ordering::Relaxed);

    println!("\nResults:");
    println!("  Enqueued: {} items", produced);
    println!("  Dequeued: {} items", consumed);
    println!(
        "  Throughput: {:.2}M items/sec",
        produced as f64 / RUN_SECS as f64 / 1_000_000.0
    );

    queue.close();
    Ok(())
}

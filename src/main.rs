use shmqueue::queue::SharedQueue;
use std::thread;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("shmqueue v0.1.0\n");

    let queue = SharedQueue::new(5)?;
    let items: Vec<i64> = (1..=10).collect();
    let count = items.len();

    thread::scope(|scope| {
        let q = &queue;

        let producer = scope.spawn(move || {
            for &item in &items {
                println!("Producing: {}", item);
                q.enqueue(item).expect("enqueue failed");
            }
        });

        let consumer = scope.spawn(move || {
            for _ in 0..count {
                let item = q.dequeue().expect("dequeue failed");
                println!("Consumed: {}", item);
            }
        });

        producer.join().unwrap();
        consumer.join().unwrap();
    });

    queue.close();
    Ok(())
}

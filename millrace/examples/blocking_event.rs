//! A worker that checkpoints through a blocking event, released by a
//! framework-synthesized monitor process reading its `events` port.

use millrace::prelude::*;
use serde_json::json;

fn main() -> millrace::Result<()> {
    millrace::dev_tracing::init_tracing();

    let (events_tx, monitor_in) = connection();

    let mut scheduler = Scheduler::new()?;

    scheduler.spawn(
        Process::builder("worker")
            .output(EVENTS_PORT, events_tx)
            .metadata(json!({ "config": { "blocking": { "Checkpoint": true } } }))
            .build(),
        |p| {
            println!("worker: requesting checkpoint");
            p.emit("Checkpoint");
            println!("worker: released, continuing");
            Ok(())
        },
    )?;

    scheduler.spawn(
        Process::builder("*monitor*").input("in", monitor_in).build(),
        |p| loop {
            match p.get_data("in") {
                Ok(packet) => {
                    let event = packet.downcast::<Event>().expect("events port carries events");
                    println!("monitor: {event}");
                    event.release();
                }
                Err(err) if err.is_end_of_stream() => return Ok(()),
                Err(err) => return Err(err),
            }
        },
    )?;

    for (name, result) in scheduler.join() {
        result?;
        println!("{name} done");
    }
    Ok(())
}

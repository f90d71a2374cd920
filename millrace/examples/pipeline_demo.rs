//! A three-stage pipeline: a pump, a doubler, and a printer.
//!
//! Run with lifecycle logging:
//! ```sh
//! RUST_LOG=millrace_core=debug cargo run --example pipeline_demo
//! ```

use millrace::prelude::*;

fn main() -> millrace::Result<()> {
    millrace::dev_tracing::init_tracing();

    let (pump_out, doubler_in) = connection();
    let (doubler_out, printer_in) = connection();

    let mut scheduler = Scheduler::new()?;

    scheduler.spawn(
        Process::builder("pump").output("out", pump_out).build(),
        |p| {
            for i in 1..=5u64 {
                p.set_data("out", Packet::new(i));
            }
            Ok(())
        },
    )?;

    scheduler.spawn(
        Process::builder("doubler")
            .input("in", doubler_in)
            .output("out", doubler_out)
            .build(),
        |p| loop {
            match p.get_data("in") {
                Ok(packet) => {
                    let n = packet.downcast::<u64>().expect("pump sends u64");
                    p.set_data("out", Packet::new(n * 2));
                }
                Err(err) if err.is_end_of_stream() => return Ok(()),
                Err(err) => return Err(err),
            }
        },
    )?;

    scheduler.spawn(
        Process::builder("printer").input("in", printer_in).build(),
        |p| loop {
            match p.get_data("in") {
                Ok(packet) => println!("{}", packet.downcast::<u64>().expect("doubler sends u64")),
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

//! Input fan-in: several connections on one port stay separate and are
//! addressed by index; nothing merges them.

use millrace::prelude::*;

#[test]
fn fan_in_endpoints_are_addressed_by_index() {
    millrace::dev_tracing::init_tracing();

    let (a_out, c_in0) = connection();
    let (b_out, c_in1) = connection();

    let mut scheduler = Scheduler::new().unwrap();
    scheduler
        .spawn(Process::builder("A").output("out", a_out).build(), |p| {
            p.set_data("out", Packet::new("a"));
            Ok(())
        })
        .unwrap();
    scheduler
        .spawn(Process::builder("B").output("out", b_out).build(), |p| {
            p.set_data("out", Packet::new("b"));
            Ok(())
        })
        .unwrap();
    scheduler
        .spawn(
            Process::builder("C")
                .input("in", c_in0)
                .input("in", c_in1)
                .build(),
            |p| {
                assert_eq!(p.in_count("in")?, 2);
                // Index 0 is A's connection, index 1 is B's; no merge.
                assert_eq!(p.get_data_at(0, "in")?.downcast::<&str>().unwrap(), "a");
                assert_eq!(p.get_data_at(1, "in")?.downcast::<&str>().unwrap(), "b");
                Ok(())
            },
        )
        .unwrap();

    for (name, result) in scheduler.join() {
        assert!(result.is_ok(), "{name} failed: {result:?}");
    }
}

#[test]
fn get_data_reads_only_the_first_connection() {
    millrace::dev_tracing::init_tracing();

    let (mut first_tx, c_in0) = connection();
    let (mut second_tx, c_in1) = connection();
    first_tx.send(Packet::new("first")).unwrap();
    second_tx.send(Packet::new("second")).unwrap();
    first_tx.close();
    second_tx.close();

    let mut scheduler = Scheduler::new().unwrap();
    scheduler
        .spawn(
            Process::builder("C")
                .input("in", c_in0)
                .input("in", c_in1)
                .build(),
            |p| {
                // The single-connection convenience warns on fan-in but still
                // reads index 0 only.
                assert_eq!(p.get_data("in")?.downcast::<&str>().unwrap(), "first");
                assert_eq!(p.get_data_at(1, "in")?.downcast::<&str>().unwrap(), "second");
                Ok(())
            },
        )
        .unwrap();

    for (name, result) in scheduler.join() {
        assert!(result.is_ok(), "{name} failed: {result:?}");
    }
}

//! The per-process execution harness.
//!
//! [`Process`] wraps a user logic function with the canonical lifecycle:
//!
//! 1. initialize round-robin counters and event state
//! 2. emit `ReceivedAllInputs` up front when there are no input ports
//! 3. run the user logic, handing it the I/O API as `&mut Process`
//! 4. drain every input connection until end-of-stream, discarding packets
//! 5. close every connection (inputs, outputs, and `events`) and exit
//!
//! The drain in step 4 guarantees that no upstream packet is silently dropped
//! at the network level: the only path from a connection to oblivion is an
//! input endpoint that has been explicitly read, either by user logic or by
//! the shutdown drain.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use hashbrown::{HashMap, HashSet};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::connection::{Receiver, Sender};
use crate::error::{Error, Result};
use crate::event::{Event, RECEIVED_ALL_INPUTS};
use crate::latch::Latch;
use crate::packet::Packet;
use crate::port::{PortTable, EVENTS_PORT};

/// A process: a graph node with a name, port tables, metadata, and the
/// runtime state the harness keeps on its behalf.
///
/// User logic receives `&mut Process` and talks to the graph exclusively
/// through the methods below. The harness itself is [`Process::run`].
pub struct Process {
    name: String,
    metadata: Value,
    inports: PortTable<Receiver>,
    outports: PortTable<Sender>,
    /// Per-output-port round-robin send counters. Private to this process.
    round_robin: HashMap<String, usize>,
    /// Input port names that have delivered at least one packet.
    received: HashSet<String>,
    has_all_inputs: bool,
}

impl Process {
    /// Start assembling a process. The builder guarantees the implicit
    /// `events` output port exists before the process runs.
    pub fn builder(name: impl Into<String>) -> ProcessBuilder {
        ProcessBuilder {
            name: name.into(),
            metadata: Value::Null,
            inports: PortTable::new(),
            outports: PortTable::new(),
        }
    }

    /// The process name, as declared in the graph.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The opaque metadata blob supplied by the launcher.
    #[must_use]
    pub fn metadata(&self) -> &Value {
        &self.metadata
    }

    /// The `config` sub-blob of the metadata, or `None` when absent.
    #[must_use]
    pub fn config(&self) -> Option<&Value> {
        self.metadata.get("config")
    }

    /// Number of connections on the named input port.
    pub fn in_count(&self, port: &str) -> Result<usize> {
        self.inports
            .len_at(port)
            .ok_or_else(|| Error::unknown_port(&self.name, port))
    }

    /// Number of connections on the named output port.
    pub fn out_count(&self, port: &str) -> Result<usize> {
        self.outports
            .len_at(port)
            .ok_or_else(|| Error::unknown_port(&self.name, port))
    }

    /// Receive the next packet from input `port`'s `index`-th connection,
    /// suspending until one arrives or the upstream sender closes.
    ///
    /// Fails with [`Error::UnknownPort`] when the name is absent from the
    /// table or `index` is past the port's endpoint list.
    pub fn get_data_at(&mut self, index: usize, port: &str) -> Result<Packet> {
        self.recv_indexed(index, port, true)
    }

    /// Non-blocking variant of [`get_data_at`](Self::get_data_at): fails with
    /// [`Error::NotReady`] when no packet is buffered.
    pub fn try_get_data_at(&mut self, index: usize, port: &str) -> Result<Packet> {
        self.recv_indexed(index, port, false)
    }

    /// Receive from the named input port's first connection.
    ///
    /// Convenience for single-connection ports; it does not merge across
    /// endpoints, and logs a warning when the port has more than one.
    pub fn get_data(&mut self, port: &str) -> Result<Packet> {
        self.warn_on_fan_in(port);
        self.recv_indexed(0, port, true)
    }

    /// Non-blocking variant of [`get_data`](Self::get_data).
    pub fn try_get_data(&mut self, port: &str) -> Result<Packet> {
        self.warn_on_fan_in(port);
        self.recv_indexed(0, port, false)
    }

    /// Send a packet on the named output port.
    ///
    /// With several connections on the port the packet goes to exactly one of
    /// them, round-robin in call order; nothing is duplicated. A send on an
    /// unknown, unconnected, or closed port drops the packet with a warning
    /// rather than failing: output pressure is never the user logic's fault.
    pub fn set_data(&mut self, port: &str, packet: Packet) {
        debug!(process = %self.name, port, "SEND");
        let Some(endpoints) = self.outports.get(port) else {
            warn!(process = %self.name, port, "packet sent to unknown out-port, dropping");
            return;
        };
        if endpoints.is_empty() {
            warn!(process = %self.name, port, "packet sent to unconnected out-port, dropping");
            return;
        }
        let counter = self.round_robin.entry(port.to_string()).or_insert(0);
        let index = *counter % endpoints.len();
        *counter += 1;
        if endpoints[index].send(packet).is_err() {
            warn!(process = %self.name, port, index, "send on closed connection, dropping packet");
        }
    }

    /// Emit a framework event of the given kind on the `events` port.
    ///
    /// When the process config marks the kind as blocking
    /// (`config.blocking[kind] == true`), a fresh [`Latch`] is attached and
    /// this call suspends until a receiver releases it. An absent or
    /// malformed `blocking` map means non-blocking.
    pub fn emit(&mut self, kind: &str) {
        let event = Event::new(&self.name, kind);
        if self.is_blocking_event(kind) {
            let latch = Latch::new();
            self.set_data(EVENTS_PORT, Packet::new(event.with_blocker(latch.clone())));
            latch.wait();
        } else {
            self.set_data(EVENTS_PORT, Packet::new(event));
        }
    }

    /// Run the canonical lifecycle around `logic`.
    ///
    /// The harness always drains the inputs and closes every connection,
    /// even when the logic returns an error or panics; downstream processes
    /// rely on the closes for their own end-of-stream shutdown.
    pub fn run<F>(mut self, logic: F) -> Result<()>
    where
        F: FnOnce(&mut Process) -> Result<()>,
    {
        debug!(process = %self.name, "BGIN");
        let outport_names: Vec<String> = self.outports.names().map(String::from).collect();
        for port in outport_names {
            self.round_robin.insert(port, 0);
        }
        // A process with no in-ports is ready immediately.
        self.check_inputs();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| logic(&mut self)));
        let result = match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => {
                error!(process = %self.name, %err, "user logic failed");
                Err(Error::UserLogic(err.to_string()))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(process = %self.name, message = %message, "user logic panicked");
                Err(Error::UserLogic(message))
            }
        };

        self.drain_inputs();
        self.close_all();
        debug!(process = %self.name, "END");
        result
    }

    /// Receive from one indexed endpoint, shared by the user API and the
    /// shutdown drain so event accounting behaves identically in both.
    fn recv_indexed(&mut self, index: usize, port: &str, block: bool) -> Result<Packet> {
        let packet = {
            let Some(endpoints) = self.inports.get(port) else {
                warn!(process = %self.name, port, "data requested from unknown in-port");
                return Err(Error::unknown_port(&self.name, port));
            };
            let Some(conn) = endpoints.get(index) else {
                // An index past the endpoint list is the same programmer
                // error as a missing name: the address does not resolve to
                // a connection.
                warn!(process = %self.name, port, index, "data requested from unconnected in-port index");
                return Err(Error::unknown_port(&self.name, port));
            };
            if block {
                conn.recv()?
            } else {
                conn.try_recv()?
            }
        };
        debug!(process = %self.name, port, index, "RECV");
        if !self.received.contains(port) {
            self.received.insert(port.to_string());
        }
        self.check_inputs();
        Ok(packet)
    }

    /// Emit `ReceivedAllInputs` the first time every input port has
    /// delivered at least one packet.
    ///
    /// A port with several connections counts as received as soon as any one
    /// of its endpoints delivers; a merge-style component may therefore see
    /// this event earlier than a per-endpoint accounting would fire it.
    fn check_inputs(&mut self) {
        let ready = self
            .inports
            .names()
            .all(|port| self.received.contains(port));
        if !self.has_all_inputs && ready {
            self.emit(RECEIVED_ALL_INPUTS);
            self.has_all_inputs = true;
        }
    }

    fn is_blocking_event(&self, kind: &str) -> bool {
        self.config()
            .and_then(|config| config.get("blocking"))
            .and_then(|blocking| blocking.get(kind))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    fn warn_on_fan_in(&self, port: &str) {
        if let Some(count) = self.inports.len_at(port) {
            if count > 1 {
                warn!(
                    process = %self.name,
                    port,
                    count,
                    "in-port has several connections, but only the first was requested"
                );
            }
        }
    }

    /// Block until every input endpoint reports end-of-stream, discarding
    /// any packet that still arrives.
    fn drain_inputs(&mut self) {
        debug!(process = %self.name, "WAIT");
        let ports: Vec<String> = self.inports.names().map(String::from).collect();
        loop {
            let mut all_closed = true;
            for port in &ports {
                let count = self.inports.len_at(port).unwrap_or(0);
                for index in 0..count {
                    match self.recv_indexed(index, port, true) {
                        Ok(_discarded) => all_closed = false,
                        Err(_end_of_stream) => {}
                    }
                }
            }
            if all_closed {
                break;
            }
        }
        debug!(process = %self.name, "WAIT done, all in-ports closed");
    }

    /// Close every connection half this process owns.
    fn close_all(&mut self) {
        for (port, endpoints) in self.inports.iter_mut() {
            for conn in endpoints.iter_mut() {
                conn.close();
                debug!(process = %self.name, port, "CONN closed on exit");
            }
        }
        for (port, endpoints) in self.outports.iter_mut() {
            for conn in endpoints.iter_mut() {
                conn.close();
                debug!(process = %self.name, port, "CONN closed on exit");
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("user logic panicked")
    }
}

/// Assembles a [`Process`] from its launcher-supplied parts.
pub struct ProcessBuilder {
    name: String,
    metadata: Value,
    inports: PortTable<Receiver>,
    outports: PortTable<Sender>,
}

impl ProcessBuilder {
    /// Attach a connection's receiving half to the named input port.
    /// Endpoint indices follow attachment order.
    #[must_use]
    pub fn input(mut self, port: impl Into<String>, conn: Receiver) -> Self {
        self.inports.attach(port, conn);
        self
    }

    /// Attach a connection's sending half to the named output port.
    #[must_use]
    pub fn output(mut self, port: impl Into<String>, conn: Sender) -> Self {
        self.outports.attach(port, conn);
        self
    }

    /// Declare an input port with no connections (a never-ready source).
    #[must_use]
    pub fn empty_input(mut self, port: impl Into<String>) -> Self {
        self.inports.ensure(port);
        self
    }

    /// Declare an output port with no connections (a no-op sink).
    #[must_use]
    pub fn empty_output(mut self, port: impl Into<String>) -> Self {
        self.outports.ensure(port);
        self
    }

    /// Supply the metadata blob (`config`, `blocking`, ...).
    #[must_use]
    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Finish assembly. Ensures the implicit `events` output port exists,
    /// since the harness uses it unconditionally.
    #[must_use]
    pub fn build(mut self) -> Process {
        self.outports.ensure(EVENTS_PORT);
        Process {
            name: self.name,
            metadata: self.metadata,
            inports: self.inports,
            outports: self.outports,
            round_robin: HashMap::new(),
            received: HashSet::new(),
            has_all_inputs: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connection;
    use serde_json::json;

    fn drain_events(events: &crate::connection::Receiver) -> Vec<Event> {
        let mut kinds = Vec::new();
        while let Ok(packet) = events.try_recv() {
            kinds.push(packet.downcast::<Event>().unwrap());
        }
        kinds
    }

    #[test]
    fn round_robin_alternates_across_out_connections() {
        let (tx0, rx0) = connection();
        let (tx1, rx1) = connection();
        let process = Process::builder("spray")
            .output("out", tx0)
            .output("out", tx1)
            .build();

        process
            .run(|p| {
                for i in 0..4 {
                    p.set_data("out", Packet::new(i));
                }
                Ok(())
            })
            .unwrap();

        let first: Vec<i32> = std::iter::from_fn(|| rx0.try_recv().ok())
            .map(|p| p.downcast().unwrap())
            .collect();
        let second: Vec<i32> = std::iter::from_fn(|| rx1.try_recv().ok())
            .map(|p| p.downcast().unwrap())
            .collect();
        assert_eq!(first, vec![0, 2]);
        assert_eq!(second, vec![1, 3]);
    }

    #[test]
    fn input_less_process_reports_ready_before_logic_runs() {
        let (events_tx, events_rx) = connection();
        let process = Process::builder("source").output(EVENTS_PORT, events_tx).build();

        process
            .run(|p| {
                // The readiness event must already be on the wire here.
                assert!(p.out_count(EVENTS_PORT).unwrap() == 1);
                Ok(())
            })
            .unwrap();

        let events = drain_events(&events_rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, RECEIVED_ALL_INPUTS);
        assert_eq!(events[0].sender, "source");
    }

    #[test]
    fn received_all_inputs_fires_exactly_once() {
        let (mut x_tx, x_rx) = connection();
        let (mut y_tx, y_rx) = connection();
        let (events_tx, events_rx) = connection();

        x_tx.send(Packet::new("x1")).unwrap();
        x_tx.send(Packet::new("x2")).unwrap();
        y_tx.send(Packet::new("y1")).unwrap();
        x_tx.close();
        y_tx.close();

        let process = Process::builder("join")
            .input("x", x_rx)
            .input("y", y_rx)
            .output(EVENTS_PORT, events_tx)
            .build();

        process
            .run(|p| {
                p.get_data("x")?;
                p.get_data("y")?;
                p.get_data("x")?;
                Ok(())
            })
            .unwrap();

        let events = drain_events(&events_rx);
        let ready: Vec<_> = events
            .iter()
            .filter(|e| e.kind == RECEIVED_ALL_INPUTS)
            .collect();
        assert_eq!(ready.len(), 1);
    }

    #[test]
    fn unknown_port_surfaces_to_user_logic() {
        let process = Process::builder("lonely").build();
        let result = process.run(|p| p.get_data("nope").map(|_| ()));
        match result.unwrap_err() {
            Error::UserLogic(message) => assert!(message.contains("lonely.nope")),
            other => panic!("expected UserLogic, got {other:?}"),
        }
    }

    #[test]
    fn out_of_range_connection_index_is_an_unknown_port() {
        let (mut tx, rx) = connection();
        tx.send(Packet::new(1)).unwrap();
        tx.close();

        let process = Process::builder("tap").input("in", rx).build();
        process
            .run(|p| {
                assert!(matches!(
                    p.get_data_at(1, "in"),
                    Err(Error::UnknownPort { .. })
                ));
                // Index 0 is untouched by the failed lookup.
                assert_eq!(p.get_data_at(0, "in")?.downcast::<i32>().unwrap(), 1);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn try_get_data_reports_not_ready_then_delivers() {
        let (tx, rx) = connection();
        let process = Process::builder("poller").input("in", rx).build();

        process
            .run(move |p| {
                assert!(p.try_get_data("in").unwrap_err().is_not_ready());
                tx.send(Packet::new(5u8)).unwrap();
                assert_eq!(p.try_get_data("in")?.downcast::<u8>().unwrap(), 5);
                // Release the drain before returning.
                let mut tx = tx;
                tx.close();
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn set_data_without_connections_is_a_logged_noop() {
        let process = Process::builder("mute").empty_output("out").build();
        process
            .run(|p| {
                p.set_data("out", Packet::new(1));
                p.set_data("missing", Packet::new(2));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn failing_logic_still_closes_outputs() {
        let (tx, rx) = connection();
        let process = Process::builder("crash").output("out", tx).build();

        let result = process.run(|p| {
            p.set_data("out", Packet::new("last words"));
            Err(Error::UserLogic(String::from("boom")))
        });
        assert!(matches!(result, Err(Error::UserLogic(_))));

        // The buffered packet survives, then end-of-stream proves the close.
        assert_eq!(rx.recv().unwrap().downcast::<&str>().unwrap(), "last words");
        assert!(rx.recv().unwrap_err().is_end_of_stream());
    }

    #[test]
    fn panicking_logic_still_closes_outputs() {
        let (tx, rx) = connection();
        let process = Process::builder("panicky").output("out", tx).build();

        let result = process.run(|_| panic!("torn apart"));
        match result.unwrap_err() {
            Error::UserLogic(message) => assert!(message.contains("torn apart")),
            other => panic!("expected UserLogic, got {other:?}"),
        }
        assert!(rx.recv().unwrap_err().is_end_of_stream());
    }

    #[test]
    fn drain_discards_packets_left_on_inputs() {
        let (mut tx, rx) = connection();
        tx.send(Packet::new(1)).unwrap();
        tx.send(Packet::new(2)).unwrap();
        tx.close();

        let process = Process::builder("sink").input("in", rx).build();
        // Logic reads nothing; the drain must still observe both packets and
        // terminate on end-of-stream.
        process.run(|_| Ok(())).unwrap();
    }

    #[test]
    fn blocking_config_attaches_a_latch() {
        let (events_tx, events_rx) = connection();
        let process = Process::builder("guard")
            .output(EVENTS_PORT, events_tx)
            .metadata(json!({ "config": { "blocking": { "Halt": true } } }))
            .build();

        let releaser = std::thread::spawn(move || {
            let packet = events_rx.recv().unwrap();
            let event = packet.downcast::<Event>().unwrap();
            assert!(event.is_blocking());
            event.release();
            // Swallow the rest of the stream so the harness close is clean.
            while events_rx.recv().is_ok() {}
        });

        process.run(|p| {
            p.emit("Halt");
            Ok(())
        })
        .unwrap();
        releaser.join().unwrap();
    }

    #[test]
    fn malformed_blocking_config_degrades_to_non_blocking() {
        let (events_tx, events_rx) = connection();
        let process = Process::builder("guard")
            .output(EVENTS_PORT, events_tx)
            .metadata(json!({ "config": { "blocking": "not a map" } }))
            .build();

        // Nobody releases anything; the emit must not suspend.
        process.run(|p| {
            p.emit("Halt");
            Ok(())
        })
        .unwrap();

        let events = drain_events(&events_rx);
        assert_eq!(events.len(), 1);
        assert!(!events[0].is_blocking());
    }
}

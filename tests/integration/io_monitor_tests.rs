//! Edge monitoring loop scenarios: polled debounce and interrupt drain
//! behaviour as seen through `BoardIo::service`, stepped at the 10 ms
//! monitoring period.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use presa::adapters::hardware::SimLine;
use presa::io::edge::{EdgeEvent, EdgeKind, EdgeTriggeredPin};
use presa::io::line::{Pull, SharedLine};
use presa::io::pin::LogicalPin;
use presa::io::registry::{BoardIo, BoardPin, INPUT_GROUP};

const MONITOR_MS: u64 = 10;

fn button_pin(sim: &Arc<SimLine>, debounce_ms: u32, interrupt: bool) -> EdgeTriggeredPin {
    // Active-low button on a pull-up, like the real operator panel.
    let line: SharedLine = sim.clone();
    let pin = LogicalPin::input(line, Pull::Up, true).unwrap();
    if interrupt {
        EdgeTriggeredPin::interrupt(pin, debounce_ms).unwrap()
    } else {
        EdgeTriggeredPin::polled(pin, debounce_ms).unwrap()
    }
}

#[test]
fn polled_button_chatter_within_debounce_dispatches_once() {
    static PRESSES: AtomicUsize = AtomicUsize::new(0);
    fn on_press(_e: &EdgeEvent) {
        PRESSES.fetch_add(1, Ordering::SeqCst);
    }

    let mut io = BoardIo::new();
    let sim = Arc::new(SimLine::new(18));
    sim.set_raw_level(true); // released
    io.add_pin(INPUT_GROUP, "start_btn", BoardPin::Edge(button_pin(&sim, 50, false)))
        .unwrap();
    io.edge_pin_mut(INPUT_GROUP, "start_btn")
        .unwrap()
        .add_callback(EdgeKind::Rising, on_press);

    let mut now = 1_000;

    // Contact bounce: press, release, press within one 50 ms window.
    sim.set_raw_level(false); // press -> rising, accepted
    now += MONITOR_MS;
    io.service(now);
    assert_eq!(PRESSES.load(Ordering::SeqCst), 1);

    sim.set_raw_level(true); // bounce -> falling, suppressed
    now += MONITOR_MS;
    io.service(now);

    sim.set_raw_level(false); // settles back; baseline is still "pressed"
    now += MONITOR_MS;
    io.service(now);
    assert_eq!(PRESSES.load(Ordering::SeqCst), 1);

    // A release well past the window, then a clean second press.
    sim.set_raw_level(true);
    now += 100;
    io.service(now);
    sim.set_raw_level(false);
    now += 100;
    io.service(now);
    assert_eq!(PRESSES.load(Ordering::SeqCst), 2);
}

#[test]
fn interrupt_pin_drains_on_next_service_pass() {
    static EDGES: AtomicUsize = AtomicUsize::new(0);
    fn on_edge(_e: &EdgeEvent) {
        EDGES.fetch_add(1, Ordering::SeqCst);
    }

    let mut io = BoardIo::new();
    let sim = Arc::new(SimLine::new(22));
    sim.set_raw_level(true); // e-stop released
    io.add_pin(
        INPUT_GROUP,
        "emergency_stop_btn",
        BoardPin::Edge(button_pin(&sim, 0, true)),
    )
    .unwrap();
    io.edge_pin_mut(INPUT_GROUP, "emergency_stop_btn")
        .unwrap()
        .add_callback(EdgeKind::Both, on_edge);
    let handle = io
        .edge_pin(INPUT_GROUP, "emergency_stop_btn")
        .unwrap()
        .irq_handle()
        .unwrap();

    // Interrupt fires between monitoring cycles.
    sim.set_raw_level(false); // engaged
    handle.fire();
    assert_eq!(EDGES.load(Ordering::SeqCst), 0, "no dispatch from ISR context");

    io.service(10);
    assert_eq!(EDGES.load(Ordering::SeqCst), 1);

    // Quiet cycles do not re-dispatch.
    io.service(20);
    io.service(30);
    assert_eq!(EDGES.load(Ordering::SeqCst), 1);
}

#[test]
fn interrupt_burst_before_drain_collapses_to_one_dispatch() {
    static EDGES: AtomicUsize = AtomicUsize::new(0);
    fn on_edge(_e: &EdgeEvent) {
        EDGES.fetch_add(1, Ordering::SeqCst);
    }

    let mut io = BoardIo::new();
    let sim = Arc::new(SimLine::new(22));
    sim.set_raw_level(true);
    io.add_pin(INPUT_GROUP, "estop", BoardPin::Edge(button_pin(&sim, 0, true)))
        .unwrap();
    io.edge_pin_mut(INPUT_GROUP, "estop")
        .unwrap()
        .add_callback(EdgeKind::Both, on_edge);
    let handle = io.edge_pin(INPUT_GROUP, "estop").unwrap().irq_handle().unwrap();

    sim.set_raw_level(false);
    handle.fire();
    handle.fire();
    handle.fire();

    io.service(10);
    assert_eq!(EDGES.load(Ordering::SeqCst), 1);
}

#[test]
fn stale_interrupt_edge_is_rejected_at_drain() {
    static EDGES: AtomicUsize = AtomicUsize::new(0);
    fn on_edge(_e: &EdgeEvent) {
        EDGES.fetch_add(1, Ordering::SeqCst);
    }

    let mut io = BoardIo::new();
    let sim = Arc::new(SimLine::new(22));
    sim.set_raw_level(true);
    io.add_pin(INPUT_GROUP, "estop", BoardPin::Edge(button_pin(&sim, 0, true)))
        .unwrap();
    io.edge_pin_mut(INPUT_GROUP, "estop")
        .unwrap()
        .add_callback(EdgeKind::Both, on_edge);
    let handle = io.edge_pin(INPUT_GROUP, "estop").unwrap().irq_handle().unwrap();

    // Glitch: engaged and released again before the drain runs.
    sim.set_raw_level(false);
    handle.fire();
    sim.set_raw_level(true);

    io.service(10);
    assert_eq!(EDGES.load(Ordering::SeqCst), 0);
}

#[test]
fn mixed_registry_serves_interrupt_and_polled_pins_in_one_pass() {
    static IRQ_EDGES: AtomicUsize = AtomicUsize::new(0);
    static POLL_EDGES: AtomicUsize = AtomicUsize::new(0);
    fn on_irq(_e: &EdgeEvent) {
        IRQ_EDGES.fetch_add(1, Ordering::SeqCst);
    }
    fn on_poll(_e: &EdgeEvent) {
        POLL_EDGES.fetch_add(1, Ordering::SeqCst);
    }

    let mut io = BoardIo::new();
    let estop = Arc::new(SimLine::new(22));
    let start = Arc::new(SimLine::new(18));
    estop.set_raw_level(true);
    start.set_raw_level(true);
    io.add_pin(INPUT_GROUP, "estop", BoardPin::Edge(button_pin(&estop, 0, true)))
        .unwrap();
    io.add_pin(INPUT_GROUP, "start", BoardPin::Edge(button_pin(&start, 0, false)))
        .unwrap();
    io.edge_pin_mut(INPUT_GROUP, "estop")
        .unwrap()
        .add_callback(EdgeKind::Both, on_irq);
    io.edge_pin_mut(INPUT_GROUP, "start")
        .unwrap()
        .add_callback(EdgeKind::Both, on_poll);
    let handle = io.edge_pin(INPUT_GROUP, "estop").unwrap().irq_handle().unwrap();

    assert_eq!(io.polled_len(), 1);
    assert_eq!(io.irq_len(), 1);

    // Both change in the same monitoring window.
    estop.set_raw_level(false);
    handle.fire();
    start.set_raw_level(false);

    io.service(10);
    assert_eq!(IRQ_EDGES.load(Ordering::SeqCst), 1);
    assert_eq!(POLL_EDGES.load(Ordering::SeqCst), 1);
}

//! Presa Firmware — Main Entry Point
//!
//! Hexagonal architecture on a cooperative single-core executor:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  RelayBank      InputBank      SignalDisplaySink   LogEventSink│
//! │  (RelayPort)    (InputPort)    (DisplaySink)       (EventSink) │
//! │  WifiAdapter    EspLine/hw_init                                │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              PressService (pure logic)                 │    │
//! │  │  FSM · Interlocks                                      │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Tasks: monitor loop (10 ms) · control loop (100 ms)           │
//! │         display refresh · [external web server]                │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The only preemptive context is the e-stop GPIO interrupt; every task
//! above yields cooperatively at its timer await.
#![deny(unused_must_use)]

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    espidf_main::run()
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!("presa: this binary targets ESP-IDF; run the test suite on the host instead");
}

#[cfg(target_os = "espidf")]
mod espidf_main {
    use std::sync::Arc;

    use anyhow::{Context, Result};
    use edge_executor::LocalExecutor;
    use embassy_time::Timer;
    use log::info;

    use presa::adapters::hardware::{RelayBank, board_line};
    use presa::adapters::log_sink::LogEventSink;
    use presa::adapters::time::MonotonicClock;
    use presa::adapters::wifi;
    use presa::app::service::PressService;
    use presa::config::PressConfig;
    use presa::drivers::display::{
        DisplaySignal, SevenSegDisplay, SignalDisplaySink, display_loop,
    };
    use presa::drivers::hw_init;
    use presa::fsm::StateId;
    use presa::io::edge::{EdgeEvent, EdgeKind, EdgeTriggeredPin};
    use presa::io::inputs::{self, InputBank};
    use presa::io::line::Pull;
    use presa::io::pin::LogicalPin;
    use presa::io::registry::{BoardIo, BoardPin, INPUT_GROUP, OUTPUT_GROUP};
    use presa::pins;

    /// State transitions flow to the display task through this signal.
    static DISPLAY_SIGNAL: DisplaySignal = DisplaySignal::new();

    fn log_estop_edge(event: &EdgeEvent) {
        log::warn!("e-stop edge ({:?}) at {} ms", event.edge, event.at_ms);
    }

    fn log_start_edge(event: &EdgeEvent) {
        log::info!("start button edge ({:?})", event.edge);
    }

    pub fn run() -> Result<()> {
        // ── 1. ESP-IDF bootstrap ──────────────────────────────
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;

        info!("╔══════════════════════════════════════╗");
        info!("║  Presa v{}                          ║", env!("CARGO_PKG_VERSION"));
        info!("╚══════════════════════════════════════╝");

        let config = PressConfig::default();

        // ── 2. Peripheral init ────────────────────────────────
        if let Err(e) = hw_init::init_peripherals() {
            // Peripheral init failure is critical — log and halt.
            log::error!("HAL init failed: {} — halting", e);
            #[allow(clippy::empty_loop)]
            loop {}
        }

        // ── 3. Relay bank ─────────────────────────────────────
        let relays = RelayBank {
            motor: LogicalPin::output(board_line(pins::RELAY_MOTOR_GPIO))?,
            door: LogicalPin::output(board_line(pins::RELAY_DOOR_GPIO))?,
            down_fast: LogicalPin::output(board_line(pins::RELAY_DOWN_FAST_GPIO))?,
            up_main: LogicalPin::output(board_line(pins::RELAY_UP_MAIN_GPIO))?,
            high_force: LogicalPin::output(board_line(pins::RELAY_HIGH_FORCE_GPIO))?,
            up_aux: LogicalPin::output(board_line(pins::RELAY_UP_AUX_GPIO))?,
            status_led: LogicalPin::output(board_line(pins::STATUS_LED_GPIO))?,
        };

        // ── 4. Input bank + edge monitoring ───────────────────
        //
        // The control loop samples levels through the bank; the registry
        // additionally watches the operator buttons for edges.  Both views
        // share the same physical lines.
        let start_line = board_line(pins::START_BTN_GPIO);
        let manual_up_line = board_line(pins::MANUAL_UP_BTN_GPIO);
        let manual_down_line = board_line(pins::MANUAL_DOWN_BTN_GPIO);
        let estop_line = board_line(pins::EMERGENCY_STOP_GPIO);

        let mut bank = InputBank::new();
        bank.add(inputs::START_BTN, Arc::clone(&start_line), Pull::Up)?;
        bank.add(inputs::MANUAL_UP_BTN, Arc::clone(&manual_up_line), Pull::Up)?;
        bank.add(inputs::MANUAL_DOWN_BTN, Arc::clone(&manual_down_line), Pull::Up)?;
        bank.add(inputs::EMERGENCY_STOP_BTN, Arc::clone(&estop_line), Pull::Up)?;
        bank.add(inputs::PRESS_TOP_SENSOR, board_line(pins::PRESS_TOP_SENSOR_GPIO), Pull::Up)?;
        bank.add(
            inputs::PRESS_BOTTOM_SENSOR,
            board_line(pins::PRESS_BOTTOM_SENSOR_GPIO),
            Pull::Up,
        )?;
        bank.add(inputs::DOOR_OPEN_SENSOR, board_line(pins::DOOR_OPEN_SENSOR_GPIO), Pull::Up)?;

        let mut board_io = BoardIo::new();
        board_io.add_pin(
            OUTPUT_GROUP,
            "status_led",
            BoardPin::Plain(relays.status_led.clone()),
        )?;

        // E-stop is interrupt-driven; the operator buttons are polled.
        // All are active-low with pull-ups.
        let debounce = config.button_debounce_ms;
        board_io.add_pin(
            INPUT_GROUP,
            inputs::EMERGENCY_STOP_BTN,
            BoardPin::Edge(EdgeTriggeredPin::interrupt(
                LogicalPin::input(estop_line, Pull::Up, true)?,
                debounce,
            )?),
        )?;
        board_io.add_pin(
            INPUT_GROUP,
            inputs::START_BTN,
            BoardPin::Edge(EdgeTriggeredPin::polled(
                LogicalPin::input(start_line, Pull::Up, true)?,
                debounce,
            )?),
        )?;
        board_io.add_pin(
            INPUT_GROUP,
            inputs::MANUAL_UP_BTN,
            BoardPin::Edge(EdgeTriggeredPin::polled(
                LogicalPin::input(manual_up_line, Pull::Up, true)?,
                debounce,
            )?),
        )?;
        board_io.add_pin(
            INPUT_GROUP,
            inputs::MANUAL_DOWN_BTN,
            BoardPin::Edge(EdgeTriggeredPin::polled(
                LogicalPin::input(manual_down_line, Pull::Up, true)?,
                debounce,
            )?),
        )?;

        board_io
            .edge_pin_mut(INPUT_GROUP, inputs::EMERGENCY_STOP_BTN)?
            .add_callback(EdgeKind::Both, log_estop_edge);
        board_io
            .edge_pin_mut(INPUT_GROUP, inputs::START_BTN)?
            .add_callback(EdgeKind::Rising, log_start_edge);

        // ── 5. E-stop interrupt ───────────────────────────────
        let estop_handle = board_io
            .edge_pin(INPUT_GROUP, inputs::EMERGENCY_STOP_BTN)?
            .irq_handle()
            .expect("interrupt-mode pin always has an IRQ handle");
        if let Err(e) = hw_init::init_isr_service(estop_handle) {
            log::error!("ISR service init failed: {} — continuing with polling only", e);
        }

        // ── 6. Wi-Fi SoftAP ───────────────────────────────────
        let sysloop = esp_idf_svc::eventloop::EspSystemEventLoop::take()?;
        let nvs = esp_idf_svc::nvs::EspDefaultNvsPartition::take()?;
        let peripherals =
            esp_idf_svc::hal::peripherals::Peripherals::take().context("peripherals")?;
        let _wifi = wifi::start_access_point(peripherals.modem, sysloop, nvs, &config)?;
        // The external web server attaches here: it serves the snapshot from
        // `app::status::status_snapshot` and posts polarity batches through
        // `app::status::apply_pull_config`.

        // ── 7. Display ────────────────────────────────────────
        let display = SevenSegDisplay::new(
            LogicalPin::output(board_line(pins::DISPLAY_DATA_GPIO))?,
            LogicalPin::output(board_line(pins::DISPLAY_CLOCK_GPIO))?,
            LogicalPin::output(board_line(pins::DISPLAY_LATCH_GPIO))?,
        )?;

        // ── 8. Cooperative task wiring ────────────────────────
        let clock = Arc::new(MonotonicClock::new());
        let monitor_period = config.monitor_interval_ms;
        let control_period = config.control_loop_interval_ms;

        let mut service = PressService::new(config);
        let mut sink = LogEventSink::new();
        let mut display_sink = SignalDisplaySink::new(&DISPLAY_SIGNAL);
        DISPLAY_SIGNAL.signal(StateId::Init);

        let executor: LocalExecutor = LocalExecutor::new();

        let monitor_clock = Arc::clone(&clock);
        let monitor_task = executor.spawn(async move {
            board_io
                .monitor_loop(monitor_period, move || monitor_clock.now_ms())
                .await
        });

        let control_task = executor.spawn(async move {
            let mut relays = relays;
            let mut bank = bank;
            service.start(&mut sink);
            loop {
                service.tick(
                    &mut bank,
                    &mut relays,
                    &mut display_sink,
                    &mut sink,
                    clock.now_ms(),
                );
                Timer::after_millis(u64::from(control_period)).await;
            }
        });

        let display_task = executor.spawn(display_loop(&DISPLAY_SIGNAL, display));

        info!("presa: all tasks spawned, entering executor");
        futures_lite::future::block_on(executor.run(async {
            // None of the core tasks ever completes; reaching here is a bug.
            let _ = (monitor_task.await, control_task.await, display_task.await);
        }));
        unreachable!("executor returned");
    }
}

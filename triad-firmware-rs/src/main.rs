//! triad-firmware
//!
//! Real-time firmware for the triad three-voice keyboard module on the
//! Raspberry Pi Pico 2. Five periodic activities plus one hardware timer
//! interrupt cooperate through the statics in [`state`]:
//!
//! 1. The PWM wrap interrupt drains the audio double buffer into the PWM
//!    "DAC" at 22 kHz.
//! 2. The sample producer refills whichever buffer the interrupt releases.
//! 3. The key scanner walks the 7×4 switch matrix every 50 ms, feeding the
//!    voice table, mode flags, knobs and joystick limits.
//! 4. The serial ingester applies `Pxy`/`Rxy` note events from peer
//!    modules.
//! 5. The outbox drainer forwards locally generated note events.
//!
//! The producer and ingester run on an interrupt executor so the scanner
//! can never delay a buffer fill; the display collaborator is represented
//! by a 1 Hz snapshot log at the bottom of `main`.

#![no_std]
#![no_main]

use defmt::info;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::adc::{self, Adc};
use embassy_rp::block::ImageDef;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::peripherals::UART0;
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::uart::{self, BufferedInterruptHandler, BufferedUart};
use embassy_rp::bind_interrupts;
use embassy_time::{Duration, Timer};
use static_cell::ConstStaticCell;
use {defmt_rtt as _, panic_probe as _};

use triad::reverb::Reverb;
use triad::tables::SineTable;

mod audio;
mod input;
mod serial;
mod state;

/// Tell the RP2350 Boot ROM about our application.
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = ImageDef::secure_exe();

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    ADC_IRQ_FIFO => adc::InterruptHandler;
});

// ── Static storage ───────────────────────────────────────────────────

/// 5 KB sine cycle, filled once at boot.
static SINE_TABLE: ConstStaticCell<SineTable> =
    ConstStaticCell::new(SineTable::empty());

/// ~30 KB of reverb delay lines; const-built so they live in .bss and are
/// never copied through a stack.
static REVERB: ConstStaticCell<Reverb> = ConstStaticCell::new(Reverb::new());

static UART_TX_BUF: ConstStaticCell<[u8; 64]> = ConstStaticCell::new([0; 64]);
static UART_RX_BUF: ConstStaticCell<[u8; 64]> = ConstStaticCell::new([0; 64]);

/// High-priority executor for the sample producer and serial ingester.
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_0() {
    EXECUTOR_HIGH.on_interrupt()
}

// ── Main ─────────────────────────────────────────────────────────────

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("triad keyboard module starting");

    let sine_table: &'static mut SineTable = SINE_TABLE.take();
    sine_table.fill();
    let sine_table: &'static SineTable = sine_table;
    let reverb = REVERB.take();

    // ── Serial link, 115200 8N1 ──────────────────────────────────────
    let mut uart_config = uart::Config::default();
    uart_config.baudrate = 115_200;
    let uart = BufferedUart::new(
        p.UART0,
        p.PIN_0,
        p.PIN_1,
        Irqs,
        UART_TX_BUF.take(),
        UART_RX_BUF.take(),
        uart_config,
    );
    let (uart_tx, uart_rx) = uart.split();

    // ── Switch matrix ────────────────────────────────────────────────
    // Row selects idle high; the scanner pulls one low at a time.
    // Columns read high until a contact pulls them to the active row.
    let rows = [
        Output::new(p.PIN_2, Level::High),
        Output::new(p.PIN_3, Level::High),
        Output::new(p.PIN_4, Level::High),
        Output::new(p.PIN_5, Level::High),
        Output::new(p.PIN_6, Level::High),
        Output::new(p.PIN_7, Level::High),
        Output::new(p.PIN_8, Level::High),
    ];
    let cols = [
        Input::new(p.PIN_10, Pull::Up),
        Input::new(p.PIN_11, Pull::Up),
        Input::new(p.PIN_12, Pull::Up),
        Input::new(p.PIN_13, Pull::Up),
    ];

    // ── Joystick ─────────────────────────────────────────────────────
    let adc = Adc::new(p.ADC, Irqs, adc::Config::default());
    let joy_x = adc::Channel::new_pin(p.PIN_26, Pull::None);
    let joy_y = adc::Channel::new_pin(p.PIN_27, Pull::None);

    // ── Audio PWM "DAC" on GPIO 16 ───────────────────────────────────
    // The slice wraps at PWM_TOP (≈22 kHz); the wrap interrupt in `audio`
    // writes each sample into the compare register.
    let mut pwm_config = PwmConfig::default();
    pwm_config.top = audio::PWM_TOP;
    let _audio_pwm = Pwm::new_output_a(p.PWM_SLICE0, p.PIN_16, pwm_config);

    // ── Tasks ────────────────────────────────────────────────────────
    // Producer and ingester preempt the scanner and drainer; the sample
    // interrupt preempts everything.
    interrupt::SWI_IRQ_0.set_priority(Priority::P2);
    let high = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_0);
    high.spawn(serial::serial_ingest_task(uart_rx)).unwrap();
    high.spawn(audio::producer_task(sine_table, reverb)).unwrap();

    spawner
        .spawn(input::key_scan_task(rows, cols, adc, joy_x, joy_y))
        .unwrap();
    spawner.spawn(serial::outbox_drain_task(uart_tx)).unwrap();

    audio::start_sample_clock();
    info!("all tasks running");

    // Stand-in for the display collaborator: read the published snapshot
    // once a second. This loop also keeps `_audio_pwm` alive — dropping
    // it would disable the slice.
    loop {
        Timer::after(Duration::from_secs(1)).await;
        let snapshot = state::display_snapshot().await;
        info!("status: {}", snapshot);
    }
}

use std::io;
use std::time::Duration;

use clap::Parser;

use chord_overlay::config::{ConfigError, OverlayConfig};
use chord_overlay::constants::{
    CHECK_INTERVAL, EVICT_INTERVAL, MAX_LIVE_TIME, STACK_MAX_SIZE, TERMINAL_GAP, TERMINAL_MARGIN,
};
use chord_overlay::drivers::OutputDriver;
use chord_overlay::drivers::console::{ConsoleInputDriver, ConsoleOutputDriver};
use chord_overlay::runner::run_overlay;
use chord_overlay::tracing_sub::{LogMode, OverlayLogging};

#[derive(Parser, Debug)]
#[command(
    name = "chord-overlay",
    version = env!("CARGO_PKG_VERSION"),
    about = "Show live key and mouse chords as cards in the corner of the terminal",
    after_help = indoc::indoc! {"
        Hotkeys:
          Ctrl+Alt+H  hide or show the cards
          Ctrl+C      quit
    "}
)]
struct Cli {
    /// Idle time before a card disappears.
    #[arg(long, value_name = "MS", default_value_t = MAX_LIVE_TIME.as_millis() as u64)]
    max_live_ms: u64,

    /// Number of cards kept on screen.
    #[arg(long, value_name = "N", default_value_t = STACK_MAX_SIZE)]
    stack_size: usize,

    /// Distance from the right and bottom edges, in cells.
    #[arg(long, value_name = "CELLS", default_value_t = TERMINAL_MARGIN)]
    margin: u32,

    /// Rows between stacked cards.
    #[arg(long, value_name = "CELLS", default_value_t = TERMINAL_GAP)]
    gap: u32,

    /// Period of the refresh timer.
    #[arg(long, value_name = "MS", default_value_t = CHECK_INTERVAL.as_millis() as u64)]
    refresh_ms: u64,

    /// Period of the eviction timer.
    #[arg(long, value_name = "MS", default_value_t = EVICT_INTERVAL.as_millis() as u64)]
    evict_ms: u64,

    /// Labels that keep the newest card alive while held. Repeatable.
    #[arg(long = "sticky", value_name = "LABEL")]
    sticky: Vec<String>,

    /// Draw tracing output in a strip at the top of the screen.
    #[arg(long)]
    debug_log: bool,
}

impl TryFrom<&Cli> for OverlayConfig {
    type Error = ConfigError;

    fn try_from(cli: &Cli) -> Result<Self, Self::Error> {
        let mut config = OverlayConfig {
            stack_max_size: cli.stack_size,
            max_live_time: Duration::from_millis(cli.max_live_ms),
            refresh_interval: Duration::from_millis(cli.refresh_ms),
            evict_interval: Duration::from_millis(cli.evict_ms),
            margin: cli.margin,
            gap: cli.gap,
            ..OverlayConfig::for_terminal()
        };
        if !cli.sticky.is_empty() {
            config.sticky_labels = cli.sticky.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let config = OverlayConfig::try_from(&cli)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;

    // Raw mode owns the terminal, so tracing is captured in memory until the
    // terminal is restored.
    let logging = OverlayLogging::init(LogMode::from_flag(cli.debug_log));

    let mut output = ConsoleOutputDriver::new()?;
    output.enter()?;
    let mut driver = ConsoleInputDriver::detect();
    if driver.is_enhanced() {
        output.enable_key_releases()?;
    }

    let result = run_overlay(&mut driver, &mut output, config, logging.live_log());
    output.exit()?;
    logging.replay(&mut io::stderr())?;
    result.map(|_| ())
}

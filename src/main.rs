//! Homenode firmware entry point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │   EspHardware (Pin/Clock/Servo/Delay)     LogBus (BusPort)     │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  Scheduler (cooperative loop)                          │    │
//! │  │  lights ×2 · PIRs ×3 · servos ×2 · touch · door        │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::Result;
use log::{info, warn};

use homenode::adapters::hardware::EspHardware;
use homenode::adapters::log_bus::LogBus;
use homenode::config::NodeConfig;
use homenode::drivers::hw_init;
use homenode::scheduler::Scheduler;

/// Optional JSON configuration baked in at build time.
const EMBEDDED_CONFIG: Option<&str> = option_env!("HOMENODE_CONFIG");

fn load_config() -> NodeConfig {
    let Some(json) = EMBEDDED_CONFIG else {
        info!("Config: using defaults");
        return NodeConfig::default();
    };
    match NodeConfig::from_json(json) {
        Ok(config) => {
            info!("Config: loaded embedded JSON");
            config
        }
        Err(e) => {
            warn!("Config: embedded JSON rejected ({}), using defaults", e);
            NodeConfig::default()
        }
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Homenode v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Peripherals ────────────────────────────────────────
    hw_init::init_peripherals()?;

    // ── 3. Configuration ──────────────────────────────────────
    let config = load_config();

    // ── 4. Components + bus registration ──────────────────────
    let mut hw = EspHardware::new();
    let mut bus = LogBus::new();
    let mut scheduler = Scheduler::new(&config, &mut hw, &mut bus)?;

    // ── 5. Go ─────────────────────────────────────────────────
    scheduler.start(&mut hw, &mut bus);
    scheduler.run(&mut hw, &mut bus)
}

//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter    | Implements                          | Connects to            |
//! |------------|-------------------------------------|------------------------|
//! | `hardware` | PinPort, ClockPort, ServoPort, Delay | ESP32 GPIO, ADC, LEDC  |
//! | `log_bus`  | BusPort, EventSink                  | Serial log output      |
//! | `sim`      | PinPort, ClockPort, ServoPort, Delay | Simulated board (host) |

#[cfg(target_os = "espidf")]
pub mod hardware;
pub mod log_bus;
#[cfg(not(target_os = "espidf"))]
pub mod sim;

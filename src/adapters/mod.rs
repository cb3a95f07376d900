//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements     | Connects to               |
//! |--------------|----------------|---------------------------|
//! | `hardware`   | SensorPort     | float switches, ADC1      |
//! |              | ActuatorPort   | pump gate, LEDs, modem rail |
//! | `log_sink`   | EventSink      | Serial log output         |
//! | `nvs`        | ConfigPort     | NVS / in-memory store     |
//! |              | StoragePort    |                           |
//! | `uart_modem` | ModemPort      | Modem UART                |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod uart_modem;

//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements             | Connects to               |
//! |-------------|------------------------|---------------------------|
//! | `fs_store`  | FileStore              | SPIFFS / host filesystem  |
//! | `hardware`  | ClimatePort            | DHT22 single-wire GPIO    |
//! |             | MotionPort             | PIR GPIO level            |
//! | `http`      | (query gateway)        | esp-idf httpd / TCP (host)|
//! | `log_sink`  | EventSink              | Serial log output         |
//! | `mem_store` | FileStore              | In-memory buffer (tests)  |
//! | `nvs`       | ConfigPort             | NVS / in-memory store     |
//! | `time`      | TimePort               | ESP32 system timer + SNTP |
//! | `wifi`      | ConnectivityPort       | ESP-IDF WiFi STA          |

pub mod fs_store;
pub mod hardware;
pub mod http;
pub mod log_sink;
pub mod mem_store;
pub mod nvs;
pub mod time;
pub mod wifi;

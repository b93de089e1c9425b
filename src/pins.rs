//! GPIO pin assignments for the RoomLogger board.
//!
//! Single source of truth for the compiled-in defaults.  The runtime
//! config can override them (see [`LoggerConfig`](crate::config::LoggerConfig)).

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// DHT22 single-wire data line (open-drain with 10 kOhm pull-up).
pub const DHT_GPIO: i32 = 4;

/// HC-SR501 PIR output.  HIGH = motion present.
pub const PIR_GPIO: i32 = 13;

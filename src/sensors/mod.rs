//! Sensor subsystem: hardware drivers and the sampling logic built on them.
//!
//! | Module    | Role                                                    |
//! |-----------|---------------------------------------------------------|
//! | `dht22`   | Single-wire temperature / humidity driver               |
//! | `pir`     | Motion detector GPIO level                              |
//! | `climate` | [`SensorSampler`](climate::SensorSampler): retry + sentinel |
//! | `motion`  | [`MotionAggregator`](motion::MotionAggregator): edges + interval latch |

pub mod climate;
pub mod dht22;
pub mod motion;
pub mod pir;

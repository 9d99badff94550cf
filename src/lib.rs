//! Parking Engine library crate.
//!
//! This crate exposes the core parking-fee calculation, PIX payload
//! generation and revenue-report components as reusable modules.
//! External applications may depend on the `parking_engine` crate and
//! call into `fee::compute_fee` or `pix::encode_payload` directly, or
//! embed the API via `api::build_router`.

pub mod models;
pub mod fee;
pub mod pix;
pub mod report;
pub mod api;

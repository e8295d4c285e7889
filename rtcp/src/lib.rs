#![warn(rust_2018_idioms)]
#![allow(dead_code)]

pub mod error;
pub mod header;
pub mod packet;
pub mod raw_packet;
pub mod receiver_report;
pub mod reception_report;
pub mod transport_layer_nack;

pub use error::{Error, Result};

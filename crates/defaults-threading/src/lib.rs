#![doc = include_str!("../README.md")]

mod serial_runner;

pub use serial_runner::{CallError, SerialRunner};

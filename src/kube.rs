pub mod apis;
mod client;

pub use client::*;

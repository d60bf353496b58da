//! In-process client for the academics service

mod client;

pub use client::NativeClient;

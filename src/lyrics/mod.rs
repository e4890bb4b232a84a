//! Synchronized lyrics
//!
//! The catalog either points at a finished LRC file or hands back word-level
//! timing, which is rendered here into LRC text for the device.

pub mod lrc;

pub use lrc::render;

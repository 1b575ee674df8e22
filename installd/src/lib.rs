//! installd keeps track of the installer's Live OS payload and of the
//! subscription service, and exposes both on D-Bus.
//!
//! The binary is run as a systemd service during installation, the same
//! binary doubles as a small client for the daemon.

pub mod config;
pub mod control;
pub mod daemon;
pub mod dbus;
pub mod payload;
pub mod shutdown;
pub mod subscription;
pub mod task;
pub mod utils;

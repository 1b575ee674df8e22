//! Payload backends.
//!
//! Only the Live OS payload lives here: the installation source is a
//! mounted live image and the installer needs to know which kernels it
//! ships.

pub mod live_os;

pub use live_os::LiveOsHandle;

//! Utility modules.

pub mod chinese;
pub mod fs;
pub mod hash;
pub mod logging;

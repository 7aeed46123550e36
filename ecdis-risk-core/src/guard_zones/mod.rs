//! Guard Zones
//!
//! Geographic areas own ship should not sail into. Active zones that are not
//! attached to own ship are checked against the predicted own-ship track.

mod zone;

pub use zone::{GuardZone, ZoneShape};

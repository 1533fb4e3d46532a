//! Driver-wide constants.

use crate::pool::PoolTag;

/// Pool tag stamped on the registry-path allocation so it shows up in
/// pool-tracking tools.
pub const DRIVER_TAG: PoolTag = PoolTag::new(b"hwdb");

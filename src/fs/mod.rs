//! Filesystem utilities for fsmutex.
//!
//! This module provides the small set of filesystem operations the lock
//! protocols are built on: exclusive publication of a complete file,
//! whole-file reads, tolerant and compare-before deletes, and checks that a
//! lock location is usable.

mod primitives;

pub use primitives::{
    check_lock_location, parent_dir, publish_exclusive, read_contents, remove_if_exists,
    remove_if_unchanged,
};

//! Quad-tree tile addressing.
//!
//! Catalog layers partitioned by tile use a quad-tree spatial index. A tile
//! is addressed by a [`QuadKey`] (row, column, level), by its Morton code (a
//! single integer, used as the tile's partition id on the wire), or by a
//! base-4 digit string. This module provides the pure arithmetic between
//! those representations plus parent/child navigation.

mod quadkey;

pub use quadkey::{QuadKey, MAX_QUADKEY_LEVEL};

//! Property test suite entry point.

mod checksum_tests;
mod diff_roundtrip_tests;
mod merge_tests;

/// Unit test harness
///
/// Exercises the public API of the crate without touching the database.

mod basic_tests;
mod normalize_props;

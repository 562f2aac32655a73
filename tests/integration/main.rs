//! PostgreSQL integration tests.
//!
//! Each test connects to `DOCHUB_TEST_DATABASE_URL` and returns early when
//! it is not set. Tests isolate themselves by working in a fresh tenant.

mod association_test;
mod helpers;
mod version_test;

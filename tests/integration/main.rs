//! End-to-end tests of the delivery engine over the in-memory store.

mod delivery_test;
mod helpers;
mod preference_test;
mod sweep_test;

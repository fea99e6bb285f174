// Test modules for upnp-forward
// Unit tests that need fixtures shared across modules live here

mod config_tests;
mod helpers;

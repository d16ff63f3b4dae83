//! Integration tests driving a mounted backdrop through simulated time

mod lifecycle_integration;

//! Integration test suite for devtask.
//!
//! These tests run real tasks against scratch project trees. The external
//! tools (test runner, documentation dispatcher) are small shell scripts
//! that record how they were invoked, so no Python toolchain is needed.
//!
//! # Test Categories
//!
//! - `tasks`: step ordering, exit-code propagation, task isolation
//! - `coverage`: artifact cleanup around coverage runs
//! - `bindings`: PYTHON / PYTEST override handling
//! - `cli`: the `devtask` binary end to end

#![cfg(unix)]


mod tasks;

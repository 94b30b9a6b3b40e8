//! Unit tests for the entity lifecycle.

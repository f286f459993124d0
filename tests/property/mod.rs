// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! - `undo_law`: apply/compensate round trips and checksum guards
//! - `checksum_laws`: order (in)dependence of structural checksums

mod checksum_laws;
mod undo_law;

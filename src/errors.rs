// ABOUTME: Re-exports the unified error system from the core crate
// ABOUTME: Keeps `crate::errors` as the single import path inside the server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling System
//!
//! Error codes, the `AppError` type and the HTTP error body live in
//! `companion_core::errors`; this module re-exports them for the server.

pub use companion_core::errors::{AppError, AppResult, ErrorCode, ErrorResponse, ErrorResponseDetails};

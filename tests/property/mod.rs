// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module

mod log_ordering;
mod pagination_completeness;
mod saga_hydration;

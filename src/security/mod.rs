// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Input hardening: outbound URL guard, text sanitizer and response headers.

pub mod headers;
pub mod sanitize;
pub mod ssrf;

pub use headers::with_security_headers;
pub use sanitize::sanitize_rich_text;
pub use ssrf::ensure_safe_endpoint;

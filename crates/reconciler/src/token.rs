// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Identity-token codec.
//!
//! Managed resources carry a `<marker>:<key>` token in their backend
//! idempotency field. The marker namespaces this tool's resources away from
//! anything else sharing the account; the key is the user-chosen logical
//! name. Resources whose token does not decode are unmanaged and invisible
//! to every operation.

/// Marker for file system creation tokens.
pub const FS_TOKEN_MARKER: &str = "fsman/managed-fs";

/// Marker for access point client tokens.
pub const AP_TOKEN_MARKER: &str = "fsman/managed-ap";

/// Build the identity token stored in a resource's creation-token field.
pub fn encode(marker: &str, key: &str) -> String {
    format!("{marker}:{key}")
}

/// Recover the logical key from a token, or `None` when the token is not
/// exactly two colon-delimited segments with the expected marker first.
pub fn decode<'a>(marker: &str, token: &'a str) -> Option<&'a str> {
    let chunks: Vec<&str> = token.split(':').collect();
    if chunks.len() != 2 || chunks[0] != marker {
        return None;
    }
    Some(chunks[1])
}

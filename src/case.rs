//! Key casing at the HTTP boundary: camelCase on the wire, snake_case in storage.

use crate::model::Record;

/// `created_at` -> `createdAt`.
pub fn to_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut upper_next = false;
    for c in s.chars() {
        if c == '_' && !out.is_empty() {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// `createdAt` -> `created_at`. Already snake_case input is unchanged.
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Rename top-level keys for storage. Nested JSON values are left as sent.
pub fn record_to_snake_case(record: Record) -> Record {
    record.into_iter().map(|(k, v)| (to_snake_case(&k), v)).collect()
}

/// Rename top-level keys for the client.
pub fn record_to_camel_case(record: Record) -> Record {
    record.into_iter().map(|(k, v)| (to_camel_case(&k), v)).collect()
}

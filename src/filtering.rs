//! Client-side filtering and aggregation over fetched secret lists

use regex::Regex;
use std::collections::BTreeMap;

use crate::error::{Result, SecretsError};
use crate::models::{SecretMetadataList, SecretsFilter, SecretsStats};

/// Case-sensitive shell glob: `*`, `?`, `[...]` and `[!...]`
///
/// The whole name must match. A `[` without a closing `]` is literal.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    regex: Regex,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(&translate(pattern)).map_err(|e| {
            SecretsError::InvalidRequest(format!("invalid secret name pattern [{pattern}]: {e}"))
        })?;
        Ok(Self { regex })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

pub fn glob_match(pattern: &str, name: &str) -> Result<bool> {
    Ok(GlobPattern::new(pattern)?.matches(name))
}

/// Quote glob metacharacters so the result only matches `name` itself
pub fn glob_escape(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '*' | '?' | '[' => {
                escaped.push('[');
                escaped.push(c);
                escaped.push(']');
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

fn translate(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("^(?s:");
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        i += 1;
        match c {
            '*' => {
                while i < chars.len() && chars[i] == '*' {
                    i += 1;
                }
                out.push_str(".*");
            }
            '?' => out.push('.'),
            '[' => {
                let mut j = i;
                if j < chars.len() && chars[j] == '!' {
                    j += 1;
                }
                if j < chars.len() && chars[j] == ']' {
                    j += 1;
                }
                while j < chars.len() && chars[j] != ']' {
                    j += 1;
                }
                if j >= chars.len() {
                    out.push_str("\\[");
                    continue;
                }
                out.push_str(&translate_class(&chars[i..j]));
                i = j + 1;
            }
            _ => {
                let mut buf = [0u8; 4];
                out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
            }
        }
    }

    out.push_str(")$");
    out
}

/// Bracket body to a regex class. Reversed ranges match nothing and a `-`
/// that cannot start a range is literal.
fn translate_class(body: &[char]) -> String {
    let (negated, body) = match body.split_first() {
        Some((&'!', rest)) => (true, rest),
        _ => (false, body),
    };

    // Split at range dashes. A dash following a complete range is literal.
    let mut chunks: Vec<Vec<char>> = Vec::new();
    let mut start = 0;
    let mut k = 1;
    while let Some(pos) = body.get(k..).and_then(|rest| rest.iter().position(|&c| c == '-')) {
        let pos = k + pos;
        chunks.push(body[start..pos].to_vec());
        start = pos + 1;
        k = pos + 3;
    }
    let last = &body[start.min(body.len())..];
    match chunks.last_mut() {
        Some(prev) if last.is_empty() => prev.push('-'),
        _ => chunks.push(last.to_vec()),
    }

    for k in (1..chunks.len()).rev() {
        let reversed = match (chunks[k - 1].last(), chunks[k].first()) {
            (Some(end), Some(next)) => end > next,
            _ => false,
        };
        if reversed {
            let tail = chunks.remove(k);
            let prev = &mut chunks[k - 1];
            prev.pop();
            prev.extend_from_slice(&tail[1..]);
        }
    }

    let mut class = String::new();
    for (n, chunk) in chunks.iter().enumerate() {
        if n > 0 {
            class.push('-');
        }
        for &ch in chunk {
            if matches!(ch, '\\' | '[' | ']' | '^' | '-' | '&' | '~') {
                class.push('\\');
            }
            class.push(ch);
        }
    }

    match (class.is_empty(), negated) {
        (true, true) => ".".to_string(),
        (true, false) => r"[^\x00-\x{10FFFF}]".to_string(),
        (false, true) => format!("[^{class}]"),
        (false, false) => format!("[{class}]"),
    }
}

/// Apply the criteria the server does not evaluate, in order: store type,
/// name pattern, activity. `total_count` becomes the filtered length.
pub fn apply_local_filters(
    mut list: SecretMetadataList,
    filter: &SecretsFilter,
) -> Result<SecretMetadataList> {
    if let Some(store_type) = filter.store_type {
        list.secrets
            .retain(|secret| secret.store_type() == Some(store_type));
    }

    if let Some(pattern) = filter.secret_name.as_deref().filter(|p| !p.is_empty()) {
        let glob = GlobPattern::new(pattern)?;
        list.secrets.retain(|secret| {
            secret
                .secret_name
                .as_deref()
                .is_some_and(|name| glob.matches(name))
        });
    }

    if let Some(is_active) = filter.is_active {
        list.secrets.retain(|secret| secret.is_active == is_active);
    }

    list.total_count = list.secrets.len();
    Ok(list)
}

/// Counts over a full listing. Untyped entries are left out of the groupings.
pub fn compute_stats(list: &SecretMetadataList) -> SecretsStats {
    let active = list.secrets.iter().filter(|s| s.is_active).count();

    let mut by_secret_type = BTreeMap::new();
    let mut by_store_type = BTreeMap::new();
    for secret in &list.secrets {
        if let Some(secret_type) = secret.secret_type {
            *by_secret_type.entry(secret_type).or_insert(0) += 1;
        }
        if let Some(store_type) = secret.store_type() {
            *by_store_type.entry(store_type).or_insert(0) += 1;
        }
    }

    SecretsStats {
        secrets_count: list.secrets.len(),
        active_secrets_count: active,
        inactive_secrets_count: list.secrets.len() - active,
        secrets_count_by_secret_type: by_secret_type,
        secrets_count_by_store_type: by_store_type,
    }
}

//! Hostname normalization.
//!
//! Mesh devices advertise free-form display names; DNS labels tolerate a much
//! smaller alphabet. Every name that reaches the zone goes through
//! [`normalize`] first, and configured affixes are sanitized the same way via
//! [`HostnamePolicy::apply`].

/// Reduce a display name to a DNS-label-safe hostname.
///
/// Trims whitespace, lowercases, maps spaces and underscores to hyphens,
/// strips everything outside `[a-z0-9.-]`, collapses runs of hyphens or dots,
/// and trims leading/trailing hyphens and dots. The result may be empty;
/// callers treat an empty hostname as unusable and skip the device.
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev = '\0';
    for ch in raw.trim().chars() {
        let ch = match ch {
            ' ' | '_' => '-',
            other => other.to_ascii_lowercase(),
        };
        if !is_hostname_char(ch) {
            continue;
        }
        // collapse "--" and ".." runs
        if (ch == '-' || ch == '.') && ch == prev {
            continue;
        }
        out.push(ch);
        prev = ch;
    }
    out.trim_matches(['-', '.']).to_string()
}

/// Prefix/postfix applied to every normalized hostname.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostnamePolicy {
    pub prefix: String,
    pub postfix: String,
}

impl HostnamePolicy {
    pub fn new(prefix: impl Into<String>, postfix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            postfix: postfix.into(),
        }
    }

    /// Normalize `raw`, attach the affixes, and normalize again so that
    /// invalid characters inside the affixes are sanitized too.
    pub fn apply(&self, raw: &str) -> String {
        let base = normalize(raw);
        normalize(&format!("{}{}{}", self.prefix, base, self.postfix))
    }
}

/// A hostname is usable only if it is non-empty and consists solely of
/// characters in `[a-z0-9.-]`. Normalized output always satisfies the
/// character rule; this is the last gate before a create call.
pub fn is_valid_hostname(hostname: &str) -> bool {
    !hostname.is_empty() && hostname.chars().all(is_hostname_char)
}

/// Left-most dot-separated label of a display name, so a fully qualified
/// source name becomes a short hostname.
pub fn short_name(raw: &str) -> &str {
    match raw.split_once('.') {
        Some((label, _)) => label,
        None => raw,
    }
}

fn is_hostname_char(ch: char) -> bool {
    ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' || ch == '.'
}

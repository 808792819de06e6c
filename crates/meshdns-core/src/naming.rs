//! FQDN derivation and reverse classification.
//!
//! Forward: which names should exist for a hostname and address family.
//! Reverse: which hostname an existing record was created for, so the cleanup
//! phase can tell managed records from unrelated ones sharing the zone.

use crate::config::NamingConfig;
use crate::traits::RecordType;

/// Naming rules for one managed zone.
#[derive(Debug, Clone)]
pub struct FqdnPolicy {
    domain: String,
    subdomain: Option<String>,
    ipv4_subdomain: Option<String>,
    ipv6_subdomain: Option<String>,
}

impl FqdnPolicy {
    /// Build the policy for a zone. Subdomains are lowercased; empty strings
    /// count as unset.
    pub fn new(domain: &str, naming: &NamingConfig) -> Self {
        fn clean(sub: &Option<String>) -> Option<String> {
            sub.as_deref()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
        }

        Self {
            domain: domain.trim().to_lowercase(),
            subdomain: clean(&naming.subdomain),
            ipv4_subdomain: clean(&naming.ipv4_subdomain),
            ipv6_subdomain: clean(&naming.ipv6_subdomain),
        }
    }

    /// The dual-stack name every device owns: `hostname[.subdomain].domain`
    pub fn main_fqdn(&self, hostname: &str) -> String {
        match &self.subdomain {
            Some(sub) => format!("{hostname}.{sub}.{}", self.domain),
            None => format!("{hostname}.{}", self.domain),
        }
    }

    /// The additional family-specific name, when the matching subdomain is
    /// configured. Independent of the main name; a device can own both.
    pub fn family_fqdn(&self, hostname: &str, record_type: RecordType) -> Option<String> {
        let sub = match record_type {
            RecordType::A => self.ipv4_subdomain.as_ref()?,
            RecordType::Aaaa => self.ipv6_subdomain.as_ref()?,
        };
        Some(format!("{hostname}.{sub}.{}", self.domain))
    }

    /// Map an existing record name back to the hostname it would have been
    /// created for.
    ///
    /// Suffixes are tried in a fixed priority order: IPv4 subdomain, IPv6
    /// subdomain, primary subdomain, and the bare domain only when no primary
    /// subdomain is configured. `None` means the record is not under
    /// management and must not be touched.
    pub fn classify(&self, fqdn: &str) -> Option<String> {
        if let Some(sub) = &self.ipv4_subdomain
            && let Some(host) = strip_suffix(fqdn, &format!(".{sub}.{}", self.domain))
        {
            return Some(host);
        }
        if let Some(sub) = &self.ipv6_subdomain
            && let Some(host) = strip_suffix(fqdn, &format!(".{sub}.{}", self.domain))
        {
            return Some(host);
        }
        match &self.subdomain {
            Some(sub) => strip_suffix(fqdn, &format!(".{sub}.{}", self.domain)),
            None => strip_suffix(fqdn, &format!(".{}", self.domain)),
        }
    }
}

fn strip_suffix(fqdn: &str, suffix: &str) -> Option<String> {
    fqdn.strip_suffix(suffix)
        .filter(|host| !host.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(
        subdomain: Option<&str>,
        ipv4: Option<&str>,
        ipv6: Option<&str>,
    ) -> FqdnPolicy {
        FqdnPolicy::new(
            "example.com",
            &NamingConfig {
                subdomain: subdomain.map(String::from),
                ipv4_subdomain: ipv4.map(String::from),
                ipv6_subdomain: ipv6.map(String::from),
                prefix: String::new(),
                postfix: String::new(),
            },
        )
    }

    #[test]
    fn main_fqdn_with_and_without_subdomain() {
        assert_eq!(policy(None, None, None).main_fqdn("node1"), "node1.example.com");
        assert_eq!(
            policy(Some("int"), None, None).main_fqdn("node1"),
            "node1.int.example.com"
        );
    }

    #[test]
    fn family_fqdn_only_when_configured() {
        let p = policy(Some("int"), Some("v4"), None);
        assert_eq!(
            p.family_fqdn("node1", RecordType::A),
            Some("node1.v4.example.com".to_string())
        );
        assert_eq!(p.family_fqdn("node1", RecordType::Aaaa), None);
    }

    #[test]
    fn subdomains_are_lowercased() {
        let p = policy(Some("Int"), None, None);
        assert_eq!(p.main_fqdn("node1"), "node1.int.example.com");
    }

    #[test]
    fn classify_prefers_family_subdomains() {
        // "v4.int" nested under "int" is ambiguous: the main suffix would
        // also match, with candidate "node1.v4". The IPv4 subdomain wins.
        let p = policy(Some("int"), Some("v4.int"), None);
        assert_eq!(
            p.classify("node1.v4.int.example.com"),
            Some("node1".to_string())
        );

        let p = policy(Some("int"), Some("v4"), Some("v6"));
        assert_eq!(p.classify("node1.v4.example.com"), Some("node1".to_string()));
        assert_eq!(p.classify("node1.v6.example.com"), Some("node1".to_string()));
        assert_eq!(p.classify("node1.int.example.com"), Some("node1".to_string()));
    }

    #[test]
    fn classify_bare_domain_only_without_primary_subdomain() {
        let p = policy(None, None, None);
        assert_eq!(p.classify("node1.example.com"), Some("node1".to_string()));

        // with a primary subdomain configured, bare-domain records are not ours
        let p = policy(Some("int"), None, None);
        assert_eq!(p.classify("node1.example.com"), None);
    }

    #[test]
    fn classify_ignores_foreign_names() {
        let p = policy(Some("int"), None, None);
        assert_eq!(p.classify("www.other.org"), None);
        assert_eq!(p.classify("mail.example.com"), None);
        // the suffix itself is not a managed record
        assert_eq!(p.classify("int.example.com"), None);
    }

    #[test]
    fn classify_keeps_extra_labels_in_the_candidate() {
        let p = policy(None, None, None);
        assert_eq!(p.classify("a.b.example.com"), Some("a.b".to_string()));
    }
}

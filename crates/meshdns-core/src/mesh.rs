//! Reserved mesh address ranges.
//!
//! The cleanup phase refuses to delete a record whose address cannot belong
//! to the mesh; such records were not created by this tool even when their
//! name matches a managed suffix.

use std::net::IpAddr;
use std::sync::LazyLock;

use ipnet::{Ipv4Net, Ipv6Net};

/// IPv4 range the mesh assigns member addresses from (CGNAT space)
static MESH_IPV4: LazyLock<Ipv4Net> =
    LazyLock::new(|| "100.64.0.0/10".parse().expect("fixed CIDR literal"));

/// IPv6 ULA range the mesh assigns member addresses from
static MESH_IPV6: LazyLock<Ipv6Net> =
    LazyLock::new(|| "fd7a:115c:a1e0::/48".parse().expect("fixed CIDR literal"));

/// Whether an address falls inside the reserved mesh ranges.
pub fn is_mesh_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => MESH_IPV4.contains(&v4),
        IpAddr::V6(v6) => MESH_IPV6.contains(&v6),
    }
}

/// Parse an address string as reported by a backend.
///
/// Malformed content is a hard error, not a skip: it means the upstream data
/// cannot be trusted and the run must stop.
pub fn parse_address(raw: &str) -> crate::Result<IpAddr> {
    raw.trim()
        .parse()
        .map_err(|_| crate::Error::invalid_input(format!("unparseable IP address: {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv4_range_membership() {
        assert!(is_mesh_ip("100.100.1.2".parse().unwrap()));
        assert!(is_mesh_ip("100.64.0.0".parse().unwrap()));
        assert!(is_mesh_ip("100.127.255.255".parse().unwrap()));
        assert!(!is_mesh_ip("100.128.0.1".parse().unwrap()));
        assert!(!is_mesh_ip("8.8.8.8".parse().unwrap()));
    }

    #[test]
    fn ipv6_range_membership() {
        assert!(is_mesh_ip("fd7a:115c:a1e0::1".parse().unwrap()));
        assert!(is_mesh_ip("fd7a:115c:a1e0:ab12::1".parse().unwrap()));
        assert!(!is_mesh_ip("2001:db8::1".parse().unwrap()));
        assert!(!is_mesh_ip("fd7a:115c:a1e1::1".parse().unwrap()));
    }

    #[test]
    fn parse_address_trims_and_rejects_garbage() {
        assert_eq!(
            parse_address(" 100.100.1.1 ").unwrap(),
            "100.100.1.1".parse::<IpAddr>().unwrap()
        );
        assert!(parse_address("not-an-ip").is_err());
        assert!(parse_address("").is_err());
    }
}

//! Endpoint routing.
//!
//! Maps an operation, address family and (for location lookups) accuracy tier
//! to the provider path. The table is static; a missing entry is a defect in
//! this file, never a user error.

use crate::address::AddressFamily;
use crate::config::AccuracyTier;
use crate::error::LookupError;
use std::fmt;

/// Lookup operations offered by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Location,
    Scene,
    IpWhois,
    AsWhois,
    Host,
    RiskPortrait,
    IdentityCheck,
    Industry,
}

/// How an operation picks its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routing {
    /// Path depends on family and accuracy tier.
    Tiered,
    /// Path depends on family only.
    PerFamily,
    /// One path for every family.
    Shared,
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::Location,
        Operation::Scene,
        Operation::IpWhois,
        Operation::AsWhois,
        Operation::Host,
        Operation::RiskPortrait,
        Operation::IdentityCheck,
        Operation::Industry,
    ];

    pub fn routing(&self) -> Routing {
        match self {
            Operation::Location => Routing::Tiered,
            Operation::Scene => Routing::PerFamily,
            _ => Routing::Shared,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Location => "location",
            Operation::Scene => "scene",
            Operation::IpWhois => "ip_whois",
            Operation::AsWhois => "as_whois",
            Operation::Host => "host",
            Operation::RiskPortrait => "risk_portrait",
            Operation::IdentityCheck => "identity_check",
            Operation::Industry => "industry",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the endpoint table. `None` matches any value.
struct EndpointEntry {
    operation: Operation,
    family: Option<AddressFamily>,
    tier: Option<AccuracyTier>,
    path: &'static str,
}

const fn entry(
    operation: Operation,
    family: Option<AddressFamily>,
    tier: Option<AccuracyTier>,
    path: &'static str,
) -> EndpointEntry {
    EndpointEntry {
        operation,
        family,
        tier,
        path,
    }
}

use AccuracyTier::{City, District, Street};
use AddressFamily::{IPv4, IPv6};

static ENDPOINTS: &[EndpointEntry] = &[
    entry(Operation::Location, Some(IPv4), Some(City), "ip/geo/v1/city/"),
    entry(Operation::Location, Some(IPv4), Some(District), "ip/geo/v1/district/"),
    entry(Operation::Location, Some(IPv4), Some(Street), "ip/geo/v1/street/psi/"),
    entry(Operation::Location, Some(IPv6), Some(City), "ip/geo/v1/ipv6/"),
    entry(Operation::Location, Some(IPv6), Some(District), "ip/geo/v1/ipv6/district/"),
    entry(Operation::Location, Some(IPv6), Some(Street), "ip/geo/v1/ipv6/street/biz/"),
    entry(Operation::Scene, Some(IPv4), None, "ip/info/v1/scene/"),
    entry(Operation::Scene, Some(IPv6), None, "ip/info/v1/ipv6Scene/"),
    entry(Operation::IpWhois, None, None, "ip/info/v1/ipWhois"),
    entry(Operation::AsWhois, None, None, "as/info/v1/asWhois"),
    entry(Operation::Host, None, None, "ip/geo/v1/host/"),
    entry(Operation::RiskPortrait, None, None, "ip/info/v3/portrait/"),
    entry(Operation::IdentityCheck, None, None, "ip/info/v1/person/"),
    entry(Operation::Industry, None, None, "ip/info/v1/industry/"),
];

/// Resolve the provider path for an operation.
///
/// `tier` is required for tiered operations and ignored otherwise.
pub fn resolve(
    operation: Operation,
    family: AddressFamily,
    tier: Option<AccuracyTier>,
) -> Result<&'static str, LookupError> {
    let tier = match operation.routing() {
        Routing::Tiered => Some(tier.ok_or_else(|| {
            LookupError::Configuration(format!(
                "operation '{}' requires an accuracy tier",
                operation
            ))
        })?),
        Routing::PerFamily | Routing::Shared => None,
    };

    ENDPOINTS
        .iter()
        .find(|e| {
            e.operation == operation
                && e.family.map_or(true, |f| f == family)
                && e.tier == tier
        })
        .map(|e| e.path)
        .ok_or_else(|| {
            LookupError::Configuration(format!(
                "no endpoint for operation '{}' ({}, tier {})",
                operation,
                family,
                tier.map_or("-", |t| t.as_str())
            ))
        })
}

/// Check that every combination the catalog can request has a path.
pub fn verify_table() -> Result<(), LookupError> {
    for operation in Operation::ALL {
        for family in AddressFamily::ALL {
            match operation.routing() {
                Routing::Tiered => {
                    for tier in AccuracyTier::ALL {
                        resolve(operation, family, Some(tier))?;
                    }
                }
                Routing::PerFamily | Routing::Shared => {
                    resolve(operation, family, None)?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_complete() {
        verify_table().unwrap();
    }

    #[test]
    fn test_location_paths() {
        let cases = [
            (IPv4, City, "ip/geo/v1/city/"),
            (IPv4, District, "ip/geo/v1/district/"),
            (IPv4, Street, "ip/geo/v1/street/psi/"),
            (IPv6, City, "ip/geo/v1/ipv6/"),
            (IPv6, District, "ip/geo/v1/ipv6/district/"),
            (IPv6, Street, "ip/geo/v1/ipv6/street/biz/"),
        ];
        for (family, tier, expected) in cases {
            assert_eq!(
                resolve(Operation::Location, family, Some(tier)).unwrap(),
                expected,
                "{} {}",
                family,
                tier
            );
        }
    }

    #[test]
    fn test_location_requires_tier() {
        let err = resolve(Operation::Location, IPv4, None).unwrap_err();
        assert!(matches!(err, LookupError::Configuration(_)));
    }

    #[test]
    fn test_scene_paths_ignore_tier() {
        for tier in [None, Some(City), Some(Street)] {
            assert_eq!(
                resolve(Operation::Scene, IPv4, tier).unwrap(),
                "ip/info/v1/scene/"
            );
            assert_eq!(
                resolve(Operation::Scene, IPv6, tier).unwrap(),
                "ip/info/v1/ipv6Scene/"
            );
        }
    }

    #[test]
    fn test_shared_paths() {
        let cases = [
            (Operation::IpWhois, "ip/info/v1/ipWhois"),
            (Operation::AsWhois, "as/info/v1/asWhois"),
            (Operation::Host, "ip/geo/v1/host/"),
            (Operation::RiskPortrait, "ip/info/v3/portrait/"),
            (Operation::IdentityCheck, "ip/info/v1/person/"),
            (Operation::Industry, "ip/info/v1/industry/"),
        ];
        for (operation, expected) in cases {
            for family in AddressFamily::ALL {
                assert_eq!(resolve(operation, family, None).unwrap(), expected);
                assert_eq!(resolve(operation, family, Some(District)).unwrap(), expected);
            }
        }
    }

    #[test]
    fn test_every_path_is_reachable() {
        // Each table row is hit by exactly the combinations listed above, so
        // the set of resolved paths must equal the set of table paths.
        let mut resolved = Vec::new();
        for operation in Operation::ALL {
            for family in AddressFamily::ALL {
                let tiers: Vec<Option<AccuracyTier>> = match operation.routing() {
                    Routing::Tiered => AccuracyTier::ALL.into_iter().map(Some).collect(),
                    _ => vec![None],
                };
                for tier in tiers {
                    resolved.push(resolve(operation, family, tier).unwrap());
                }
            }
        }
        resolved.sort_unstable();
        resolved.dedup();

        let mut table: Vec<&str> = ENDPOINTS.iter().map(|e| e.path).collect();
        table.sort_unstable();
        assert_eq!(resolved, table);
    }
}

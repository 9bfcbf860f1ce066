//! Cargo feature selection per platform and build flavor.

use std::collections::BTreeSet;
use std::fmt;

/// Features of the full build.
const COMPLETE_FEATURES: &[&str] = &["cli", "http", "electrum", "track-spends"];

/// Features of the minimal Electrum server build.
const ELECTRUM_ONLY_FEATURES: &[&str] = &["cli", "electrum"];

/// Only added off ARM: one of its dependencies does not cross-compile there.
const WEBHOOKS_FEATURE: &str = "webhooks";

/// Build configuration compiled for each platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flavor {
    /// Every feature the platform supports.
    Complete,
    /// Just the CLI and the Electrum server.
    ElectrumOnly,
}

impl Flavor {
    /// Flavors compiled per platform, in build order.
    pub const ALL: [Self; 2] = [Self::Complete, Self::ElectrumOnly];
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete => f.write_str("complete"),
            Self::ElectrumOnly => f.write_str("electrum-only"),
        }
    }
}

/// An ordered set of cargo feature names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureSet(BTreeSet<&'static str>);

impl FeatureSet {
    /// Whether the set contains `feature`.
    #[must_use]
    pub fn contains(&self, feature: &str) -> bool {
        self.0.contains(feature)
    }

    /// Whether every feature of `self` is also in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Number of features in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over feature names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().copied()
    }

    /// Render the set as cargo's comma-separated `--features` value.
    #[must_use]
    pub fn to_cargo_arg(&self) -> String {
        self.iter().collect::<Vec<_>>().join(",")
    }
}

impl FromIterator<&'static str> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = &'static str>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_cargo_arg())
    }
}

/// Compute the feature set for a platform alias and flavor.
///
/// Aliases are not validated: anything not starting with `arm` is treated
/// as a non-ARM platform and gets `webhooks`.
///
/// # Examples
///
/// ```
/// use bwt_dist::features::{Flavor, features};
///
/// assert!(!features("arm32v7", Flavor::Complete).contains("webhooks"));
/// assert!(features("x86_64-linux", Flavor::Complete).contains("webhooks"));
/// assert_eq!(features("x86_64-win", Flavor::ElectrumOnly).to_cargo_arg(), "cli,electrum");
/// ```
#[must_use]
pub fn features(alias: &str, flavor: Flavor) -> FeatureSet {
    match flavor {
        Flavor::ElectrumOnly => ELECTRUM_ONLY_FEATURES.iter().copied().collect(),
        Flavor::Complete => {
            let webhooks = (!alias.starts_with("arm")).then_some(WEBHOOKS_FEATURE);
            COMPLETE_FEATURES.iter().copied().chain(webhooks).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PLATFORMS;
    use rstest::rstest;

    #[rstest]
    #[case::linux("x86_64-linux", true)]
    #[case::osx("x86_64-osx", true)]
    #[case::win("x86_64-win", true)]
    #[case::arm32("arm32v7", false)]
    #[case::arm64("arm64v8", false)]
    #[case::unknown("riscv64", true)]
    fn complete_includes_webhooks_off_arm(#[case] alias: &str, #[case] webhooks: bool) {
        let set = features(alias, Flavor::Complete);
        assert_eq!(set.contains("webhooks"), webhooks);
        for base in COMPLETE_FEATURES {
            assert!(set.contains(base), "{alias} missing {base}");
        }
    }

    #[test]
    fn electrum_only_is_fixed_for_every_platform() {
        for entry in PLATFORMS {
            let set = features(entry.alias, Flavor::ElectrumOnly);
            assert_eq!(set.to_cargo_arg(), "cli,electrum");
        }
    }

    #[test]
    fn electrum_only_is_subset_of_complete() {
        for entry in PLATFORMS {
            let minimal = features(entry.alias, Flavor::ElectrumOnly);
            assert!(minimal.is_subset(&features(entry.alias, Flavor::Complete)));
        }
    }

    #[test]
    fn cargo_arg_is_sorted_and_comma_joined() {
        let set = features("x86_64-linux", Flavor::Complete);
        assert_eq!(set.to_cargo_arg(), "cli,electrum,http,track-spends,webhooks");
        assert_eq!(set.len(), 5);
    }
}

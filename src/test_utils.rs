//! Test utilities for property-based testing
//!
//! This module provides generators and helpers for proptest.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;

    use crate::core::package::Package;

    /// Generate a random acyclic package set of 2..=max packages
    ///
    /// Package `i` may only depend on packages `j < i`, which rules out
    /// cycles; the result is shuffled so manifest order carries no hint.
    pub fn dag(max: usize) -> impl Strategy<Value = Vec<Package>> {
        (2..=max.max(2)).prop_flat_map(|n| {
            proptest::collection::vec(proptest::collection::vec(any::<bool>(), n), n)
                .prop_map(move |matrix| {
                    (0..n)
                        .map(|i| {
                            let depends: Vec<String> = (0..i)
                                .filter(|&j| matrix[i][j])
                                .map(|j| format!("pkg{j}"))
                                .collect();
                            let mut pkg = Package::new(
                                &format!("pkg{i}"),
                                &format!("https://github.com/test/pkg{i}"),
                            );
                            pkg.depends = depends;
                            pkg
                        })
                        .collect::<Vec<_>>()
                })
                .prop_shuffle()
        })
    }

    /// Add a mutual dependency between two distinct packages
    pub fn with_two_cycle(packages: Vec<Package>) -> impl Strategy<Value = Vec<Package>> {
        let n = packages.len();
        (0..n, 0..n)
            .prop_filter("Indices must differ", |(a, b)| a != b)
            .prop_map(move |(a, b)| {
                let mut packages = packages.clone();
                let name_a = packages[a].name.clone();
                let name_b = packages[b].name.clone();
                packages[a].depends.push(name_b);
                packages[b].depends.push(name_a);
                packages
            })
    }

    /// Generate a valid ETag-style validation token
    pub fn etag() -> impl Strategy<Value = String> {
        "\"[0-9a-f]{8,40}\""
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_dag_generator_names_unique(packages in dag(10)) {
            let names: HashSet<&str> = packages.iter().map(|p| p.name.as_str()).collect();
            prop_assert_eq!(names.len(), packages.len());
            for p in &packages {
                for d in &p.depends {
                    prop_assert!(names.contains(d.as_str()));
                }
            }
        }

        #[test]
        fn test_etag_generator(tag in etag()) {
            prop_assert!(tag.starts_with('"') && tag.ends_with('"'));
        }
    }
}

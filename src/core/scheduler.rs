//! Build-order scheduling
//!
//! Every package gets a priority from its dependency depth: leaves get 1,
//! anything else gets `2 + max(priority of its dependencies)`. A package's
//! priority is therefore strictly greater than each of its dependencies',
//! and draining a min-heap keyed on priority yields a dependency-safe order.
//!
//! Packages of equal priority come out sorted by name. Only dependency
//! precedence is guaranteed; the tie-break is not part of the contract.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::core::package::Package;
use crate::error::SchedulerError;

/// Scheduling record for one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageNode {
    /// Package name
    pub name: String,
    /// Dependency-depth priority
    pub priority: u32,
}

/// Per-run memo state
#[derive(Debug, Clone, Copy)]
enum Mark {
    InProgress,
    Done(u32),
}

/// Compute the priority of every package
///
/// Returns nodes in manifest order. Fails with
/// [`SchedulerError::MissingDependency`] if any `depends` entry names an
/// unknown package, and with [`SchedulerError::CyclicDependency`] if the
/// graph is not a DAG.
pub fn compute_priorities(packages: &[Package]) -> Result<Vec<PackageNode>, SchedulerError> {
    let index: HashMap<&str, &Package> = packages.iter().map(|p| (p.name.as_str(), p)).collect();

    for pkg in packages {
        if let Some(dep) = pkg
            .depends
            .iter()
            .find(|d| !index.contains_key(d.as_str()))
        {
            return Err(SchedulerError::MissingDependency {
                package: pkg.name.clone(),
                dependency: dep.clone(),
            });
        }
    }

    let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(packages.len());
    let mut path: Vec<&str> = Vec::new();

    let mut nodes = Vec::with_capacity(packages.len());
    for pkg in packages {
        let priority = priority_of(&pkg.name, &index, &mut marks, &mut path)?;
        nodes.push(PackageNode {
            name: pkg.name.clone(),
            priority,
        });
    }

    Ok(nodes)
}

fn priority_of<'a>(
    name: &'a str,
    index: &HashMap<&'a str, &'a Package>,
    marks: &mut HashMap<&'a str, Mark>,
    path: &mut Vec<&'a str>,
) -> Result<u32, SchedulerError> {
    match marks.get(name) {
        Some(Mark::Done(priority)) => return Ok(*priority),
        Some(Mark::InProgress) => {
            let start = path.iter().position(|n| *n == name).unwrap_or(0);
            let mut cycle: Vec<String> = path[start..].iter().map(ToString::to_string).collect();
            cycle.push(name.to_string());
            return Err(SchedulerError::CyclicDependency { cycle });
        }
        None => {}
    }

    let Some(pkg) = index.get(name).copied() else {
        return Err(SchedulerError::MissingDependency {
            package: path.last().map(ToString::to_string).unwrap_or_default(),
            dependency: name.to_string(),
        });
    };

    marks.insert(name, Mark::InProgress);
    path.push(name);

    let mut highest: Option<u32> = None;
    for dep in &pkg.depends {
        let p = priority_of(dep.as_str(), index, marks, path)?;
        highest = Some(highest.map_or(p, |h| h.max(p)));
    }

    path.pop();

    let priority = highest.map_or(1, |h| h + 2);
    marks.insert(name, Mark::Done(priority));
    Ok(priority)
}

/// Compute a dependency-safe build order
///
/// For every package `p` and every `d` in `p.depends`, `d` appears before
/// `p` in the returned sequence.
pub fn build_order(packages: &[Package]) -> Result<Vec<&Package>, SchedulerError> {
    let nodes = compute_priorities(packages)?;
    let index: HashMap<&str, &Package> = packages.iter().map(|p| (p.name.as_str(), p)).collect();

    let mut heap: BinaryHeap<Reverse<(u32, &str)>> = nodes
        .iter()
        .map(|n| Reverse((n.priority, n.name.as_str())))
        .collect();

    let mut order = Vec::with_capacity(nodes.len());
    while let Some(Reverse((_, name))) = heap.pop() {
        if let Some(pkg) = index.get(name) {
            order.push(*pkg);
        }
    }

    Ok(order)
}

/// Build order paired with each package's priority, for display
pub fn ordered_nodes(packages: &[Package]) -> Result<Vec<PackageNode>, SchedulerError> {
    let mut nodes = compute_priorities(packages)?;
    nodes.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::generators::{dag, with_two_cycle};
    use proptest::prelude::*;

    fn pkg(name: &str, depends: &[&str]) -> Package {
        Package::new(name, &format!("https://github.com/test/{name}")).with_depends(depends)
    }

    fn position(order: &[&Package], name: &str) -> usize {
        order.iter().position(|p| p.name == name).unwrap()
    }

    fn priority(nodes: &[PackageNode], name: &str) -> u32 {
        nodes.iter().find(|n| n.name == name).unwrap().priority
    }

    #[test]
    fn test_leaf_priority_is_one() {
        let packages = vec![pkg("a", &[])];
        let nodes = compute_priorities(&packages).unwrap();
        assert_eq!(nodes, vec![PackageNode { name: "a".into(), priority: 1 }]);
    }

    #[test]
    fn test_chain_priorities() {
        let packages = vec![pkg("c", &["b"]), pkg("b", &["a"]), pkg("a", &[])];
        let nodes = compute_priorities(&packages).unwrap();
        assert_eq!(priority(&nodes, "a"), 1);
        assert_eq!(priority(&nodes, "b"), 3);
        assert_eq!(priority(&nodes, "c"), 5);
    }

    #[test]
    fn test_diamond_order() {
        let packages = vec![
            pkg("d", &["b", "c"]),
            pkg("c", &["a"]),
            pkg("b", &["a"]),
            pkg("a", &[]),
        ];
        let order = build_order(&packages).unwrap();
        let names: Vec<&str> = order.iter().map(|p| p.name.as_str()).collect();

        assert_eq!(names.first(), Some(&"a"));
        assert_eq!(names.last(), Some(&"d"));
        assert_eq!(order.len(), 4);
    }

    #[test]
    fn test_two_node_cycle_detected() {
        let packages = vec![pkg("a", &["b"]), pkg("b", &["a"])];
        match build_order(&packages) {
            Err(SchedulerError::CyclicDependency { cycle }) => {
                assert_eq!(cycle.first(), cycle.last());
                assert!(cycle.contains(&"a".to_string()));
                assert!(cycle.contains(&"b".to_string()));
            }
            other => panic!("Expected CyclicDependency, got: {other:?}"),
        }
    }

    #[test]
    fn test_self_dependency_is_cycle() {
        let packages = vec![pkg("a", &["a"])];
        assert!(matches!(
            compute_priorities(&packages),
            Err(SchedulerError::CyclicDependency { .. })
        ));
    }

    #[test]
    fn test_missing_dependency_reported() {
        let packages = vec![pkg("app", &["ghost"])];
        assert_eq!(
            build_order(&packages).unwrap_err(),
            SchedulerError::MissingDependency {
                package: "app".into(),
                dependency: "ghost".into()
            }
        );
    }

    #[test]
    fn test_missing_dependency_reported_before_cycle() {
        let packages = vec![pkg("a", &["b"]), pkg("b", &["a", "ghost"])];
        assert!(matches!(
            build_order(&packages),
            Err(SchedulerError::MissingDependency { .. })
        ));
    }

    #[test]
    fn test_empty_manifest() {
        let packages: Vec<Package> = Vec::new();
        assert!(build_order(&packages).unwrap().is_empty());
    }

    #[test]
    fn test_ordered_nodes_ascending() {
        let packages = vec![pkg("app", &["lib"]), pkg("lib", &[])];
        let nodes = ordered_nodes(&packages).unwrap();
        assert_eq!(nodes[0].name, "lib");
        assert_eq!(nodes[1].name, "app");
        assert_eq!(nodes[1].priority, 3);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Every dependency precedes its dependent
        #[test]
        fn prop_dependencies_precede_dependents(packages in dag(12)) {
            let order = build_order(&packages).unwrap();
            prop_assert_eq!(order.len(), packages.len());
            for p in &packages {
                for d in &p.depends {
                    prop_assert!(position(&order, d) < position(&order, &p.name));
                }
            }
        }

        /// Priority follows the depth recurrence
        #[test]
        fn prop_priority_recurrence(packages in dag(12)) {
            let nodes = compute_priorities(&packages).unwrap();
            for p in &packages {
                let expected = p
                    .depends
                    .iter()
                    .map(|d| priority(&nodes, d))
                    .max()
                    .map_or(1, |h| h + 2);
                prop_assert_eq!(priority(&nodes, &p.name), expected);
            }
        }

        /// A two-node cycle anywhere is always reported
        #[test]
        fn prop_cycle_detected(packages in dag(10).prop_flat_map(with_two_cycle)) {
            let is_cycle = matches!(
                build_order(&packages),
                Err(SchedulerError::CyclicDependency { .. })
            );
            prop_assert!(is_cycle);
        }
    }
}

//! Instance selection.
//!
//! One source file may compile to several objects. The rules, in order:
//!
//! 1. exactly one deployable object: deploy it, whatever the instance says
//! 2. instance `all`: deploy every object, report the last one named after
//!    the source file (or the last one deployed)
//! 3. otherwise deploy the objects whose name matches the instance, with
//!    any `namespace:` prefix stripped and case ignored

use contract_gateway::CompiledObject;

use crate::error::{JobError, Result};
use crate::job::INSTANCE_ALL;
use crate::preprocess::contract_stem;

/// Which rule produced a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionRule {
    OnlyObject,
    All,
    ByName,
}

/// Objects to deploy, in deployment order.
#[derive(Debug, Clone)]
pub struct Selection {
    pub rule: SelectionRule,
    pub targets: Vec<CompiledObject>,
    /// Object whose address is reported. `None` means the last deployed.
    pub reported: Option<String>,
}

/// Final segment of a possibly namespaced name.
fn unqualified(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

/// Whether a compiler object name matches a requested instance.
///
/// An empty object name never matches.
pub fn match_instance_name(object_name: &str, instance: &str) -> bool {
    if object_name.is_empty() {
        return false;
    }
    unqualified(object_name).eq_ignore_ascii_case(unqualified(instance))
}

/// Pick the objects to deploy from already-filtered compiler output.
pub fn select_instances(
    objects: &[CompiledObject],
    instance: &str,
    contract: &str,
) -> Result<Selection> {
    let deployable: Vec<&CompiledObject> = objects.iter().filter(|o| o.is_deployable()).collect();

    if let [only] = deployable.as_slice() {
        return Ok(Selection {
            rule: SelectionRule::OnlyObject,
            targets: vec![(*only).clone()],
            reported: None,
        });
    }

    let available = || objects.iter().map(|o| o.name.clone()).collect::<Vec<_>>();

    if instance == INSTANCE_ALL {
        if deployable.is_empty() {
            return Err(JobError::NoMatchingInstance {
                instance: instance.to_string(),
                available: available(),
            });
        }
        let base = contract_stem(contract);
        let reported = deployable
            .iter()
            .rev()
            .find(|o| match_instance_name(&o.name, &base))
            .map(|o| o.name.clone());
        return Ok(Selection {
            rule: SelectionRule::All,
            targets: deployable.into_iter().cloned().collect(),
            reported,
        });
    }

    let targets: Vec<CompiledObject> = deployable
        .into_iter()
        .filter(|o| match_instance_name(&o.name, instance))
        .cloned()
        .collect();
    if targets.is_empty() {
        return Err(JobError::NoMatchingInstance {
            instance: instance.to_string(),
            available: available(),
        });
    }
    Ok(Selection {
        rule: SelectionRule::ByName,
        targets,
        reported: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(name: &str, code: &str) -> CompiledObject {
        CompiledObject::new(name, "[]", code)
    }

    #[test]
    fn test_match_instance_name() {
        assert!(match_instance_name("Token", "token"));
        assert!(match_instance_name("contracts/Token.sol:Token", "Token"));
        assert!(match_instance_name("Token", "lib:Token"));
        assert!(!match_instance_name("", ""));
        assert!(!match_instance_name("", "Token"));
        assert!(!match_instance_name("TokenSale", "Token"));
    }

    #[test]
    fn test_single_object_ignores_instance() {
        let objects = vec![obj("A", ""), obj("B", "60fe")];
        let sel = select_instances(&objects, "Unrelated", "A.sol").unwrap();
        assert_eq!(sel.rule, SelectionRule::OnlyObject);
        assert_eq!(sel.targets.len(), 1);
        assert_eq!(sel.targets[0].name, "B");
    }

    #[test]
    fn test_all_deploys_deployable_and_reports_base_name() {
        let objects = vec![obj("A", ""), obj("B", "60fe"), obj("C", "60fe")];
        let sel = select_instances(&objects, "all", "contracts/b.sol").unwrap();
        assert_eq!(sel.rule, SelectionRule::All);
        let names: Vec<_> = sel.targets.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["B", "C"]);
        assert_eq!(sel.reported.as_deref(), Some("B"));
    }

    #[test]
    fn test_all_reports_last_of_several_base_matches() {
        let objects = vec![obj("a.sol:B", "60fe"), obj("C", "60fe"), obj("b.sol:b", "60fe")];
        let sel = select_instances(&objects, "all", "b.sol").unwrap();
        assert_eq!(sel.reported.as_deref(), Some("b.sol:b"));
    }

    #[test]
    fn test_all_without_base_match_reports_last() {
        let objects = vec![obj("B", "60fe"), obj("C", "60fe")];
        let sel = select_instances(&objects, "all", "Other.sol").unwrap();
        assert!(sel.reported.is_none());
    }

    #[test]
    fn test_by_name_strips_namespace() {
        let objects = vec![obj("x.sol:Token", "60fe"), obj("x.sol:Sale", "60fe")];
        let sel = select_instances(&objects, "lib:Token", "x.sol").unwrap();
        assert_eq!(sel.rule, SelectionRule::ByName);
        assert_eq!(sel.targets.len(), 1);
        assert_eq!(sel.targets[0].name, "x.sol:Token");
    }

    #[test]
    fn test_by_name_without_match_fails() {
        let objects = vec![obj("A", "60fe"), obj("B", "60fe")];
        let err = select_instances(&objects, "Missing", "A.sol").unwrap_err();
        assert!(matches!(err, JobError::NoMatchingInstance { ref available, .. } if available.len() == 2));
    }
}

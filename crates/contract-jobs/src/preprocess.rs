//! Variable preprocessing.
//!
//! Placeholders are `$name` or `${name}`; `$$` is a literal dollar sign.
//! Names resolve, in order, to the current block height (`block`), an
//! earlier job's result, or a named account. A placeholder that resolves to
//! nothing is left in place verbatim and recorded as a
//! [`SubstitutionFailure`]; it never aborts the job.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::config::ContextConfig;
use crate::job::{CallJob, DeployJob, ResolvedCallJob, ResolvedDeployJob, SubstitutionFailure};
use crate::obs::{JobObserver, Stage};

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\$|\$\{([A-Za-z_][A-Za-z0-9_.\-]*)\}|\$([A-Za-z_][A-Za-z0-9_.\-]*)")
            .expect("placeholder pattern is valid")
    })
}

/// Substitute placeholders in `value`.
///
/// Returns the new string and the names that could not be resolved.
pub fn substitute<F>(value: &str, lookup: F) -> (String, Vec<String>)
where
    F: Fn(&str) -> Option<String>,
{
    let mut missing = Vec::new();
    let out = placeholder_re().replace_all(value, |caps: &Captures| {
        let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
        let name = match caps.get(1).or_else(|| caps.get(2)) {
            Some(m) => m.as_str(),
            None => return "$".to_string(),
        };
        match lookup(name) {
            Some(resolved) => resolved,
            None => {
                missing.push(name.to_string());
                whole.to_string()
            }
        }
    });
    (out.into_owned(), missing)
}

/// Field-by-field substitution against one context, collecting failures.
pub struct Preprocessor<'a> {
    config: &'a ContextConfig,
    observer: &'a dyn JobObserver,
    failures: Vec<SubstitutionFailure>,
}

impl<'a> Preprocessor<'a> {
    pub fn new(config: &'a ContextConfig, observer: &'a dyn JobObserver) -> Self {
        Self {
            config,
            observer,
            failures: Vec::new(),
        }
    }

    fn lookup(&self, name: &str) -> Option<String> {
        if name == "block" {
            if let Some(height) = self.config.block_height {
                return Some(height.to_string());
            }
        }
        self.config
            .variables
            .get(name)
            .or_else(|| self.config.accounts.get(name))
            .cloned()
    }

    /// Process one field.
    pub fn field(&mut self, field: &str, value: &str) -> String {
        let (out, missing) = substitute(value, |name| self.lookup(name));
        for placeholder in missing {
            self.observer.warn(
                Stage::Preprocess,
                "Could not resolve placeholder, leaving it in place",
                &[("field", field.to_string()), ("placeholder", placeholder.clone())],
            );
            self.failures.push(SubstitutionFailure {
                field: field.to_string(),
                placeholder,
            });
        }
        out
    }

    /// Process a list field, element by element.
    pub fn list(&mut self, field: &str, values: &[String]) -> Vec<String> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| self.field(&format!("{}[{}]", field, i), v))
            .collect()
    }

    /// Process a library map, keys and values.
    pub fn libraries(&mut self, libraries: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        libraries
            .iter()
            .map(|(name, address)| {
                let name = self.field("libraries", name);
                let address = self.field(&format!("libraries.{}", name), address);
                (name, address)
            })
            .collect()
    }

    pub fn into_failures(self) -> Vec<SubstitutionFailure> {
        self.failures
    }
}

fn use_default(value: String, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value
    }
}

/// File name of a contract path without directory or extension.
pub fn contract_stem(contract: &str) -> String {
    Path::new(contract)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Resolve a deploy job against the context.
pub fn resolve_deploy(
    job: &DeployJob,
    config: &ContextConfig,
    observer: &dyn JobObserver,
) -> ResolvedDeployJob {
    let mut pre = Preprocessor::new(config, observer);

    let source = pre.field("source", &job.source);
    let contract = pre.field("contract", &job.contract);
    let instance = pre.field("instance", &job.instance);
    let libraries = pre.libraries(&job.libraries);
    let amount = pre.field("amount", &job.amount);
    let sequence = pre.field("sequence", &job.sequence);
    let fee = pre.field("fee", &job.fee);
    let gas = pre.field("gas", &job.gas);
    let data = job.data.as_ref().map(|d| pre.list("data", d));

    let contract_name = contract_stem(&contract);
    let resolved = ResolvedDeployJob {
        source: use_default(source, &config.account),
        instance: use_default(instance, &contract_name),
        amount: use_default(amount, &config.default_amount),
        fee: use_default(fee, &config.default_fee),
        gas: use_default(gas, &config.default_gas),
        contract,
        contract_name,
        libraries,
        sequence,
        data,
        save_binary: job.save_binary,
        substitution_failures: pre.into_failures(),
    };

    observer.debug(
        Stage::Preprocess,
        "Deploy job resolved",
        &[
            ("contract", resolved.contract.clone()),
            ("instance", resolved.instance.clone()),
            ("source", resolved.source.clone()),
        ],
    );
    resolved
}

/// Resolve a call job against the context.
///
/// A call written in the legacy one-line form (`"set 5"` with no separate
/// data) is split into function and arguments before substitution.
pub fn resolve_call(
    job: &CallJob,
    config: &ContextConfig,
    observer: &dyn JobObserver,
) -> ResolvedCallJob {
    let mut pre = Preprocessor::new(config, observer);

    let (function, data) = split_legacy_function(&job.function, &job.data);

    let source = pre.field("source", &job.source);
    let destination = pre.field("destination", &job.destination);
    let data = pre.list("data", &data);
    let function = pre.field("function", &function);
    let amount = pre.field("amount", &job.amount);
    let sequence = pre.field("sequence", &job.sequence);
    let fee = pre.field("fee", &job.fee);
    let gas = pre.field("gas", &job.gas);
    let abi = pre.field("abi", &job.abi);

    let resolved = ResolvedCallJob {
        source: use_default(source, &config.account),
        amount: use_default(amount, &config.default_amount),
        fee: use_default(fee, &config.default_fee),
        gas: use_default(gas, &config.default_gas),
        destination,
        function,
        data,
        abi,
        sequence,
        save: job.save.clone(),
        substitution_failures: pre.into_failures(),
    };

    observer.debug(
        Stage::Preprocess,
        "Call job resolved",
        &[
            ("destination", resolved.destination.clone()),
            ("function", resolved.function.clone()),
            ("source", resolved.source.clone()),
        ],
    );
    resolved
}

fn split_legacy_function(function: &str, data: &[String]) -> (String, Vec<String>) {
    if !data.is_empty() {
        return (function.to_string(), data.to_vec());
    }
    let mut parts = function.split_whitespace();
    match parts.next() {
        Some(name) => (name.to_string(), parts.map(str::to_string).collect()),
        None => (function.to_string(), Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obs::RecordingObserver;

    fn config() -> ContextConfig {
        let mut config = ContextConfig::default().with_account("default-acct");
        config.block_height = Some(17);
        config.set_variable("token", "0x00000000000000000000000000000000000000aa");
        config
            .accounts
            .insert("alice".to_string(), "0x00000000000000000000000000000000000000a1".to_string());
        config
    }

    #[test]
    fn test_substitute_forms() {
        let lookup = |name: &str| match name {
            "x" => Some("1".to_string()),
            "y.z" => Some("2".to_string()),
            _ => None,
        };
        assert_eq!(substitute("$x", lookup).0, "1");
        assert_eq!(substitute("a${x}b", lookup).0, "a1b");
        assert_eq!(substitute("$y.z", lookup).0, "2");
        assert_eq!(substitute("cost $$5", lookup).0, "cost $5");
        assert_eq!(substitute("plain", lookup).0, "plain");
    }

    #[test]
    fn test_substitute_leaves_missing_verbatim() {
        let (out, missing) = substitute("to ${nobody} and $x", |_| None);
        assert_eq!(out, "to ${nobody} and $x");
        assert_eq!(missing, vec!["nobody".to_string(), "x".to_string()]);
    }

    #[test]
    fn test_resolve_deploy_substitutes_and_defaults() {
        let obs = RecordingObserver::new();
        let mut libraries = BTreeMap::new();
        libraries.insert("Lib".to_string(), "$token".to_string());
        let job = DeployJob {
            contract: "contracts/Token.sol".to_string(),
            source: "$alice".to_string(),
            sequence: "$block".to_string(),
            libraries,
            data: Some(vec!["$token".to_string(), "100".to_string()]),
            ..Default::default()
        };

        let resolved = resolve_deploy(&job, &config(), &obs);
        assert_eq!(resolved.source, "0x00000000000000000000000000000000000000a1");
        assert_eq!(resolved.sequence, "17");
        assert_eq!(resolved.contract_name, "Token");
        assert_eq!(resolved.instance, "Token");
        assert_eq!(resolved.amount, "9999");
        assert_eq!(resolved.libraries["Lib"], "0x00000000000000000000000000000000000000aa");
        assert_eq!(resolved.data.as_ref().unwrap()[0], "0x00000000000000000000000000000000000000aa");
        assert!(resolved.substitution_failures.is_empty());
        // original untouched
        assert_eq!(job.source, "$alice");
    }

    #[test]
    fn test_resolve_deploy_failed_placeholder_passes_through() {
        let obs = RecordingObserver::new();
        let job = DeployJob {
            contract: "Token.sol".to_string(),
            instance: "$missing_instance".to_string(),
            ..Default::default()
        };

        let resolved = resolve_deploy(&job, &config(), &obs);
        assert_eq!(resolved.instance, "$missing_instance");
        assert_eq!(resolved.substitution_failures.len(), 1);
        assert_eq!(resolved.substitution_failures[0].field, "instance");
        assert!(obs
            .for_stage(Stage::Preprocess)
            .iter()
            .any(|r| r.field("placeholder") == Some("missing_instance")));
    }

    #[test]
    fn test_resolve_call_legacy_split() {
        let obs = RecordingObserver::new();
        let job = CallJob {
            destination: "$token".to_string(),
            function: "set $block".to_string(),
            ..Default::default()
        };

        let resolved = resolve_call(&job, &config(), &obs);
        assert_eq!(resolved.function, "set");
        assert_eq!(resolved.data, vec!["17".to_string()]);
        assert_eq!(resolved.destination, "0x00000000000000000000000000000000000000aa");
        assert_eq!(resolved.source, "default-acct");
    }

    #[test]
    fn test_resolve_call_keeps_explicit_data() {
        let obs = RecordingObserver::new();
        let job = CallJob {
            function: "transfer(address,uint256)".to_string(),
            data: vec!["$token".to_string(), "5".to_string()],
            abi: "${token}".to_string(),
            save: "tx".to_string(),
            ..Default::default()
        };

        let resolved = resolve_call(&job, &config(), &obs);
        assert_eq!(resolved.function, "transfer(address,uint256)");
        assert_eq!(resolved.data.len(), 2);
        assert_eq!(resolved.abi, "0x00000000000000000000000000000000000000aa");
        assert!(resolved.saves_tx());
    }
}

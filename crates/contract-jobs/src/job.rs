//! Job records.
//!
//! `DeployJob` and `CallJob` are what the job-file parser hands over. They
//! are never mutated: preprocessing turns them into `ResolvedDeployJob` and
//! `ResolvedCallJob`, and the originals stay around for diagnostics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Save mode that reports the transaction hash instead of the return value.
pub const SAVE_TX: &str = "tx";

/// Instance name that deploys every object of a compilation unit.
pub const INSTANCE_ALL: &str = "all";

/// Deploy a contract from source or from a precompiled binary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployJob {
    /// Signing account
    pub source: String,
    /// Path of the source file or `.bin` file
    pub contract: String,
    /// Object to deploy, or `all`. Defaults to the contract file stem.
    pub instance: String,
    /// Library name → address, used for linking
    pub libraries: BTreeMap<String, String>,
    pub amount: String,
    pub fee: String,
    pub gas: String,
    pub sequence: String,
    /// Constructor arguments appended to the creation code
    pub data: Option<Vec<String>>,
    /// Also write the deployed code to `<bin_path>/<object>.bin`
    pub save_binary: bool,
}

/// Call a function on a deployed contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallJob {
    pub source: String,
    /// Contract address, or the name its ABI was saved under
    pub destination: String,
    /// Function name or full signature. Empty or `()` calls the fallback.
    pub function: String,
    /// Arguments, one string per parameter
    pub data: Vec<String>,
    /// Explicit ABI to encode against, overriding the destination
    pub abi: String,
    pub amount: String,
    pub fee: String,
    pub gas: String,
    pub sequence: String,
    /// `tx` reports the transaction hash instead of the decoded return
    pub save: String,
}

/// A placeholder that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionFailure {
    /// Job field the placeholder appeared in
    pub field: String,
    /// Placeholder name, without the `$`
    pub placeholder: String,
}

/// A deploy job after variable substitution and defaulting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDeployJob {
    pub source: String,
    pub contract: String,
    /// Contract file name with directory and extension stripped
    pub contract_name: String,
    pub instance: String,
    pub libraries: BTreeMap<String, String>,
    pub amount: String,
    pub fee: String,
    pub gas: String,
    pub sequence: String,
    pub data: Option<Vec<String>>,
    pub save_binary: bool,
    pub substitution_failures: Vec<SubstitutionFailure>,
}

/// A call job after variable substitution and defaulting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedCallJob {
    pub source: String,
    pub destination: String,
    pub function: String,
    pub data: Vec<String>,
    pub abi: String,
    pub amount: String,
    pub fee: String,
    pub gas: String,
    pub sequence: String,
    pub save: String,
    pub substitution_failures: Vec<SubstitutionFailure>,
}

impl ResolvedCallJob {
    /// Whether this job targets the fallback function.
    pub fn is_fallback(&self) -> bool {
        is_fallback(&self.function)
    }

    pub fn saves_tx(&self) -> bool {
        self.save == SAVE_TX
    }
}

/// Whether a function field names the fallback function.
pub fn is_fallback(function: &str) -> bool {
    let f = function.trim();
    f.is_empty() || f == "()"
}

/// A decoded return value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub value: String,
}

impl Variable {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Loose truthiness: `true`, or a non-zero number.
    pub fn is_truthy(&self) -> bool {
        match self.value.as_str() {
            "true" => true,
            "false" | "" => false,
            v => v.parse::<u128>().map(|n| n != 0).unwrap_or(true),
        }
    }
}

/// Render decoded variables as a job result string.
///
/// One value is returned as-is, several as `(a, b, …)`, none as empty.
pub fn return_value(variables: &[Variable]) -> String {
    match variables {
        [] => String::new(),
        [single] => single.value.clone(),
        many => format!(
            "({})",
            many.iter()
                .map(|v| v.value.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_fallback() {
        assert!(is_fallback(""));
        assert!(is_fallback("()"));
        assert!(is_fallback(" () "));
        assert!(!is_fallback("transfer"));
    }

    #[test]
    fn test_return_value_shapes() {
        assert_eq!(return_value(&[]), "");
        assert_eq!(return_value(&[Variable::new("0", "7")]), "7");
        assert_eq!(
            return_value(&[Variable::new("a", "1"), Variable::new("b", "true")]),
            "(1, true)"
        );
    }

    #[test]
    fn test_variable_truthiness() {
        assert!(Variable::new("0", "true").is_truthy());
        assert!(!Variable::new("0", "false").is_truthy());
        assert!(!Variable::new("0", "0").is_truthy());
        assert!(Variable::new("0", "12").is_truthy());
    }

    #[test]
    fn test_deploy_job_deserializes_with_defaults() {
        let job: DeployJob =
            serde_json::from_str(r#"{"contract":"Token.sol","save_binary":true}"#).unwrap();
        assert_eq!(job.contract, "Token.sol");
        assert!(job.save_binary);
        assert!(job.instance.is_empty());
        assert!(job.data.is_none());
    }
}

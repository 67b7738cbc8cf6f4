//! Call data encoding and return decoding against a JSON ABI.

use alloy_dyn_abi::{DynSolType, DynSolValue, FunctionExt, JsonAbiExt, Specifier};
use alloy_json_abi::{Function, JsonAbi, Param};

use super::{AbiSource, AbiStore};
use crate::error::{JobError, Result};
use crate::job::{is_fallback, Variable};

fn mismatch(source: &AbiSource, function: &str, message: impl Into<String>) -> JobError {
    JobError::AbiMismatch {
        abi_source: source.to_string(),
        function: function.to_string(),
        message: message.into(),
    }
}

/// Find the function a job names.
///
/// A full signature must match exactly. A bare name picks the overload
/// whose input count equals `arity`.
pub fn find_function<'a>(
    abi: &'a JsonAbi,
    function: &str,
    arity: usize,
) -> std::result::Result<&'a Function, String> {
    let function = function.trim();
    if function.contains('(') {
        let name = function.split('(').next().unwrap_or_default();
        return abi
            .function(name)
            .and_then(|overloads| overloads.iter().find(|f| f.signature() == function))
            .ok_or_else(|| format!("no function with signature {}", function));
    }

    let overloads = abi
        .function(function)
        .ok_or_else(|| format!("no function named {}", function))?;
    overloads
        .iter()
        .find(|f| f.inputs.len() == arity)
        .ok_or_else(|| {
            format!(
                "function {} takes {} argument(s), got {}",
                function,
                overloads
                    .iter()
                    .map(|f| f.inputs.len().to_string())
                    .collect::<Vec<_>>()
                    .join(" or "),
                arity
            )
        })
}

/// Turn argument strings into ABI values for the given parameters.
pub fn coerce_args(params: &[Param], args: &[String]) -> std::result::Result<Vec<DynSolValue>, String> {
    if params.len() != args.len() {
        return Err(format!(
            "expected {} argument(s), got {}",
            params.len(),
            args.len()
        ));
    }
    params
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            let ty: DynSolType = param
                .resolve()
                .map_err(|e| format!("unsupported parameter type {}: {}", param.ty, e))?;
            ty.coerce_str(arg.trim())
                .map_err(|e| format!("argument {:?} is not a valid {}: {}", arg, param.ty, e))
        })
        .collect()
}

fn encode_with(abi: &JsonAbi, source: &AbiSource, function: &str, args: &[String]) -> Result<Vec<u8>> {
    if is_fallback(function) {
        if abi.fallback.is_none() && abi.receive.is_none() {
            return Err(mismatch(source, "()", "ABI declares no fallback function"));
        }
        if !args.is_empty() {
            return Err(mismatch(source, "()", "the fallback function takes no arguments"));
        }
        return Ok(Vec::new());
    }

    let func = find_function(abi, function, args.len()).map_err(|m| mismatch(source, function, m))?;
    let values = coerce_args(&func.inputs, args).map_err(|m| mismatch(source, function, m))?;
    func.abi_encode_input(&values)
        .map_err(|e| mismatch(source, function, e.to_string()))
}

/// Encode a function call: selector followed by packed arguments.
///
/// The fallback function (empty or `()`) encodes to empty call data when
/// the ABI declares one.
pub fn encode_call(store: &AbiStore, source: &AbiSource, function: &str, args: &[String]) -> Result<Vec<u8>> {
    let abi = store.load(source).map_err(|e| with_function(e, function))?;
    encode_with(&abi, source, function, args)
}

/// Encode constructor arguments, to be appended to creation code.
pub fn encode_constructor(abi: &JsonAbi, source: &AbiSource, args: &[String]) -> Result<Vec<u8>> {
    match &abi.constructor {
        Some(constructor) => {
            let values = coerce_args(&constructor.inputs, args)
                .map_err(|m| mismatch(source, "constructor", m))?;
            constructor
                .abi_encode_input(&values)
                .map_err(|e| mismatch(source, "constructor", e.to_string()))
        }
        None if args.is_empty() => Ok(Vec::new()),
        None => Err(mismatch(
            source,
            "constructor",
            format!("ABI declares no constructor but {} argument(s) were given", args.len()),
        )),
    }
}

/// Decode raw return bytes into named variables.
///
/// Unnamed outputs are named by their position. A fallback call has no
/// output description, so its raw bytes come back as a single `return`
/// variable in hex.
pub fn decode_return(
    store: &AbiStore,
    source: &AbiSource,
    function: &str,
    arity: usize,
    raw: &[u8],
) -> Result<Vec<Variable>> {
    if is_fallback(function) {
        return Ok(vec![Variable::new("return", format!("0x{}", hex::encode(raw)))]);
    }

    let abi = store.load(source).map_err(|e| with_function(e, function))?;
    let func = find_function(&abi, function, arity).map_err(|m| mismatch(source, function, m))?;
    let values = func
        .abi_decode_output(raw, false)
        .map_err(|e| mismatch(source, function, format!("could not decode return: {}", e)))?;

    Ok(func
        .outputs
        .iter()
        .zip(values.iter())
        .enumerate()
        .map(|(i, (param, value))| {
            let name = if param.name.is_empty() {
                i.to_string()
            } else {
                param.name.clone()
            };
            Variable::new(name, format_value(value))
        })
        .collect())
}

fn with_function(err: JobError, function: &str) -> JobError {
    match err {
        JobError::AbiMismatch {
            abi_source,
            message,
            ..
        } => JobError::AbiMismatch {
            abi_source,
            function: function.to_string(),
            message,
        },
        other => other,
    }
}

/// Render a decoded value the way job results carry it.
pub fn format_value(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Int(i, _) => i.to_string(),
        DynSolValue::Uint(u, _) => u.to_string(),
        DynSolValue::Address(a) => a.to_string(),
        DynSolValue::FixedBytes(word, size) => format!("0x{}", hex::encode(&word[..*size])),
        DynSolValue::Bytes(bytes) => format!("0x{}", hex::encode(bytes)),
        DynSolValue::String(s) => s.clone(),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            format!(
                "[{}]",
                items.iter().map(format_value).collect::<Vec<_>>().join(",")
            )
        }
        other => format!("{:?}", other),
    }
}

// Python function-discovery driver
//
// Python submissions are not wrapped in a generated program. Instead a fixed driver
// executes the user's file into a fresh namespace, picks a callable by name and calls
// it with the test input read as JSON from stdin. The driver's last stdout line is a
// single JSON object that `parse_driver_output` turns back into a `DriverReply`.

use serde_json::Value;

/// Problem-specific entry point names, matched case-insensitively
pub const PROBLEM_FUNCTION_NAMES: &[&str] = &[
    "twoSum",
    "reverseList",
    "containsDuplicate",
    "removeNthFromEnd",
    "mergeTwoLists",
    "hasCycle",
    "isPalindrome",
    "isValid",
    "maxProfit",
    "maxSubArray",
    "groupAnagrams",
    "topKFrequent",
    "productExceptSelf",
    "longestConsecutive",
    "maxDepth",
    "invertTree",
    "isValidBST",
    "levelOrder",
];

/// Tried when no problem-specific name matches; after these, the first declared callable wins
pub const GENERIC_FUNCTION_NAMES: &[&str] = &["solution", "main"];

pub const DRIVER_FILE: &str = "driver.py";

const DRIVER_TEMPLATE: &str = r#"import inspect
import json
import sys
import traceback

PROBLEM_NAMES = __PROBLEM_NAMES__
GENERIC_NAMES = __GENERIC_NAMES__


def emit(payload):
    sys.stdout.write("\n" + json.dumps(payload, allow_nan=False) + "\n")
    sys.stdout.flush()


def declared(obj, module):
    return getattr(obj, "__module__", None) == module


def discover(namespace):
    module = namespace["__name__"]
    found = [
        (name, obj)
        for name, obj in list(namespace.items())
        if inspect.isfunction(obj) and not name.startswith("_") and declared(obj, module)
    ]
    cls = namespace.get("Solution")
    if inspect.isclass(cls) and declared(cls, module):
        methods = [
            name
            for name, member in vars(cls).items()
            if inspect.isfunction(member) and not name.startswith("_")
        ]
        if methods:
            try:
                instance = cls()
            except Exception:
                instance = None
            if instance is not None:
                found.extend((name, getattr(instance, name)) for name in methods)
    return found


def select(found):
    for tier in (PROBLEM_NAMES, GENERIC_NAMES):
        for name, fn in found:
            if name.lower() in tier:
                return fn
    return found[0][1] if found else None


def main():
    source_path = sys.argv[1]
    test_input = json.loads(sys.stdin.read())

    with open(source_path) as f:
        source = f.read()

    namespace = {"__name__": "__solution__", "__builtins__": __builtins__}
    try:
        exec(compile(source, source_path, "exec"), namespace)
    except Exception as e:
        emit({"status": "ERROR", "error": "%s: %s" % (type(e).__name__, e), "traceback": traceback.format_exc()})
        sys.exit(1)

    fn = select(discover(namespace))
    if fn is None:
        emit({"error": "No function found"})
        sys.exit(1)

    try:
        if isinstance(test_input, dict):
            result = fn(**test_input)
        else:
            result = fn(test_input)
        payload = json.dumps({"status": "OK", "result": result}, allow_nan=False)
    except Exception as e:
        emit({"status": "ERROR", "error": str(e) or type(e).__name__, "traceback": traceback.format_exc()})
        return

    sys.stdout.write("\n" + payload + "\n")
    sys.stdout.flush()


main()
"#;

/// Driver source with the candidate name lists filled in
pub fn driver_script() -> String {
    DRIVER_TEMPLATE
        .replace("__PROBLEM_NAMES__", &python_name_list(PROBLEM_FUNCTION_NAMES))
        .replace("__GENERIC_NAMES__", &python_name_list(GENERIC_FUNCTION_NAMES))
}

// A JSON array of strings is also a valid Python list literal
fn python_name_list(names: &[&str]) -> String {
    let lowered: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
    serde_json::to_string(&lowered).unwrap_or_else(|_| "[]".to_string())
}

/// What the driver reported for one test
#[derive(Debug, Clone, PartialEq)]
pub enum DriverReply {
    /// The selected callable returned this value
    Returned(Value),
    /// User code raised, or no callable could be selected
    Raised(String),
}

/// Parse the driver's last non-empty stdout line; `None` if it is not a driver message
pub fn parse_driver_output(stdout: &str) -> Option<DriverReply> {
    let line = stdout.lines().map(str::trim).rev().find(|l| !l.is_empty())?;
    let message: Value = serde_json::from_str(line).ok()?;
    let message = message.as_object()?;

    match message.get("status").and_then(Value::as_str) {
        Some("OK") => Some(DriverReply::Returned(
            message.get("result").cloned().unwrap_or(Value::Null),
        )),
        Some("ERROR") | None => {
            let error = message
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error");
            Some(DriverReply::Raised(error.to_string()))
        }
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_driver_script_has_candidates() {
        let script = driver_script();
        assert!(script.contains(r#"PROBLEM_NAMES = ["twosum","reverselist""#));
        assert!(script.contains(r#"GENERIC_NAMES = ["solution","main"]"#));
        assert!(!script.contains("__PROBLEM_NAMES__"));
    }

    #[test]
    fn test_driver_ignores_imported_callables() {
        let script = driver_script();
        assert!(script.contains(r#"getattr(obj, "__module__", None) == module"#));
        assert!(script.contains("and declared(obj, module)"));
    }

    #[test]
    fn test_parse_ok() {
        let reply = parse_driver_output("debug print\n\n{\"status\": \"OK\", \"result\": [0, 1]}\n");
        assert_eq!(reply, Some(DriverReply::Returned(json!([0, 1]))));
    }

    #[test]
    fn test_parse_null_result() {
        let reply = parse_driver_output("{\"status\": \"OK\", \"result\": null}");
        assert_eq!(reply, Some(DriverReply::Returned(Value::Null)));
    }

    #[test]
    fn test_parse_error() {
        let reply = parse_driver_output("{\"status\": \"ERROR\", \"error\": \"division by zero\"}");
        assert_eq!(reply, Some(DriverReply::Raised("division by zero".to_string())));
    }

    #[test]
    fn test_parse_no_function() {
        let reply = parse_driver_output("\n{\"error\": \"No function found\"}\n");
        assert_eq!(reply, Some(DriverReply::Raised("No function found".to_string())));
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse_driver_output(""), None);
        assert_eq!(parse_driver_output("hello"), None);
        assert_eq!(parse_driver_output("[1, 2]"), None);
        assert_eq!(parse_driver_output("{\"status\": \"WEIRD\"}"), None);
    }
}

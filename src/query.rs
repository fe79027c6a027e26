use serde_json::Value;
use serde_json_path::functions::{LogicalType, ValueType};
use serde_json_path::JsonPath;

use crate::model::OptionItem;
use crate::result::{Failure, JsonResult};

/// `contains(haystack, needle)`: substring test for strings, membership test
/// for arrays.
#[serde_json_path::function]
fn contains(haystack: ValueType, needle: ValueType) -> LogicalType {
    let (Some(haystack), Some(needle)) = (haystack.as_value(), needle.as_value()) else {
        return LogicalType::False;
    };
    let found = match (haystack, needle) {
        (Value::String(text), Value::String(part)) => text.contains(part.as_str()),
        (Value::Array(items), needle) => items.contains(needle),
        _ => false,
    };
    found.into()
}

// Filter operators of other JSONPath dialects that RFC 9535 spells as functions.
const FOREIGN_OPERATORS: &[(&str, &str)] = &[
    ("=~", "match(@.x, \"regex\") or search(@.x, \"regex\")"),
    (" nin ", "@.x != \"a\" && @.x != \"b\""),
    (" in ", "@.x == \"a\" || @.x == \"b\""),
    (" anyof ", "contains(@.x, \"a\") || contains(@.x, \"b\")"),
    (" noneof ", "!contains(@.x, \"a\") && !contains(@.x, \"b\")"),
    (" subsetof ", "contains() checks joined with &&"),
    (" size ", "length(@.x) == n"),
    (" empty ", "length(@.x) == 0"),
];

pub fn compile(query: &str) -> Result<JsonPath, Failure> {
    JsonPath::parse(query.trim()).map_err(|err| {
        let mut reason = err.to_string();
        if let Some((operator, replacement)) = FOREIGN_OPERATORS
            .iter()
            .find(|(operator, _)| query.contains(operator))
        {
            reason.push_str(&format!(
                "; '{}' is not supported, use {replacement}",
                operator.trim()
            ));
        }
        Failure::InvalidQuery {
            query: query.to_string(),
            reason,
        }
    })
}

fn option_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Applies `query` to `json` and turns every scalar result into an option,
/// preserving document order. An empty result is reported as
/// [`Failure::NoData`], never as an empty list.
pub fn evaluate(json: &str, query: &str) -> JsonResult<Vec<OptionItem>> {
    if json.trim().is_empty() {
        return JsonResult::failure(Failure::NoData);
    }
    let document: Value = match serde_json::from_str(json) {
        Ok(value) => value,
        Err(err) => {
            return JsonResult::failure(Failure::InvalidJson {
                reason: err.to_string(),
            })
        }
    };
    let path = match compile(query) {
        Ok(path) => path,
        Err(failure) => return JsonResult::failure(failure),
    };

    let options: Vec<OptionItem> = path
        .query(&document)
        .all()
        .into_iter()
        .filter_map(option_text)
        .map(OptionItem::of_value)
        .collect();

    if options.is_empty() {
        JsonResult::failure(Failure::NoData)
    } else {
        JsonResult::success(options)
    }
}

//! Data context construction.
//!
//! One render invocation sees a single merged object: the caller's
//! locals, the configuration-level options and the ambient request state,
//! merged in that order so later sources win on colliding keys. The merge
//! builds a brand-new map and never writes into any of its inputs, so a
//! `locals` value reused across requests can never observe leaked state.

use serde_json::{Map, Value, json};

/// Key under which the isolated partials copy is attached to the context
pub const PARTIALS_KEY: &str = "partials";

/// Build the data context for one render invocation
///
/// Precedence (low to high): `locals` < `options` < `state`. A `partials`
/// entry is always present and holds an owned copy of
/// `options["partials"]` (an empty object when unconfigured), so one
/// invocation can never mutate another's partials or the shared
/// configuration.
///
/// # Examples
///
/// ```
/// use belvedere::context::build_context;
/// use serde_json::{Map, json};
///
/// let locals = Map::from_iter([("a".to_string(), json!(1))]);
/// let options = Map::from_iter([("a".to_string(), json!(2)), ("b".to_string(), json!(3))]);
/// let state = Map::from_iter([("a".to_string(), json!(4))]);
///
/// let context = build_context(&locals, &options, &state);
/// assert_eq!(context["a"], json!(4));
/// assert_eq!(context["b"], json!(3));
/// assert_eq!(context["partials"], json!({}));
/// ```
pub fn build_context(
	locals: &Map<String, Value>,
	options: &Map<String, Value>,
	state: &Map<String, Value>,
) -> Map<String, Value> {
	let mut context = Map::new();
	for source in [locals, options, state] {
		for (key, value) in source {
			context.insert(key.clone(), value.clone());
		}
	}

	let partials = match options.get(PARTIALS_KEY) {
		Some(Value::Object(partials)) => Value::Object(partials.clone()),
		_ => json!({}),
	};
	context.insert(PARTIALS_KEY.to_string(), partials);

	context
}

/// JSON truthiness for flags carried in locals (`pretty` in particular)
///
/// Mirrors the truthiness the original flag contract relies on: absent,
/// `false`, `null`, `0` and `""` are falsy, everything else is truthy.
pub fn is_truthy(value: Option<&Value>) -> bool {
	match value {
		None | Some(Value::Null) | Some(Value::Bool(false)) => false,
		Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
		Some(Value::String(s)) => !s.is_empty(),
		Some(_) => true,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn map(pairs: &[(&str, Value)]) -> Map<String, Value> {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.clone()))
			.collect()
	}

	#[test]
	fn later_sources_win() {
		let locals = map(&[("a", json!(1))]);
		let options = map(&[("a", json!(2)), ("b", json!(3))]);
		let state = map(&[("a", json!(4))]);

		let context = build_context(&locals, &options, &state);
		assert_eq!(context["a"], json!(4));
		assert_eq!(context["b"], json!(3));
	}

	#[test]
	fn inputs_are_never_mutated() {
		let locals = map(&[("a", json!(1))]);
		let options = map(&[("b", json!(2))]);
		let state = map(&[("c", json!(3))]);

		let _ = build_context(&locals, &options, &state);

		assert_eq!(locals.len(), 1);
		assert!(!locals.contains_key("b"));
		assert!(!locals.contains_key(PARTIALS_KEY));
		assert_eq!(options.len(), 1);
		assert_eq!(state.len(), 1);
	}

	#[test]
	fn partials_are_copied_not_shared() {
		let options = map(&[(PARTIALS_KEY, json!({"p": "x"}))]);

		let mut first = build_context(&Map::new(), &options, &Map::new());
		let second = build_context(&Map::new(), &options, &Map::new());

		if let Some(Value::Object(partials)) = first.get_mut(PARTIALS_KEY) {
			partials.insert("p".to_string(), json!("mutated"));
		}

		assert_eq!(second[PARTIALS_KEY], json!({"p": "x"}));
		assert_eq!(options[PARTIALS_KEY], json!({"p": "x"}));
	}

	#[test]
	fn partials_default_to_empty_object() {
		let context = build_context(&Map::new(), &Map::new(), &Map::new());
		assert_eq!(context[PARTIALS_KEY], json!({}));
	}

	#[test]
	fn truthiness_matches_flag_contract() {
		assert!(is_truthy(Some(&json!(true))));
		assert!(is_truthy(Some(&json!(1))));
		assert!(is_truthy(Some(&json!("yes"))));
		assert!(is_truthy(Some(&json!({}))));
		assert!(!is_truthy(Some(&json!(false))));
		assert!(!is_truthy(Some(&json!(0))));
		assert!(!is_truthy(Some(&json!(""))));
		assert!(!is_truthy(Some(&json!(null))));
		assert!(!is_truthy(None));
	}
}

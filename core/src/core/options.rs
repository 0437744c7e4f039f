// opkit/src/core/options.rs

//! Options maps handed to an operation at construction time, and the small
//! helpers operating on them.

use serde_json::{Map, Value};

/// Configuration map of an operation instance (and attribute maps of records).
pub type Options = Map<String, Value>;

/// Merges caller `options` over per-type `defaults`. Caller keys win.
pub fn with_default_options(defaults: Options, options: Options) -> Options {
  let mut merged = defaults;
  merged.extend(options);
  merged
}

/// Keeps only the entries whose key is in `whitelist`, in whitelist order.
pub fn filter_options(options: &Options, whitelist: &[&str]) -> Options {
  whitelist
    .iter()
    .filter_map(|key| options.get(*key).map(|value| ((*key).to_string(), value.clone())))
    .collect()
}

/// Names of the `attributes` whose value differs between `old` and `current`.
///
/// Attributes missing from `current` are not reported.
pub fn changed_attributes(old: &Options, current: &Options, attributes: &[String]) -> Vec<String> {
  attributes
    .iter()
    .filter(|attribute| match current.get(attribute.as_str()) {
      Some(value) => old.get(attribute.as_str()) != Some(value),
      None => false,
    })
    .cloned()
    .collect()
}

/// Builds an [`Options`] map from `key => value` pairs.
///
/// ```
/// let options = opkit::options! { "notify" => true, "limit" => 10 };
/// assert_eq!(options["limit"], 10);
/// ```
#[macro_export]
macro_rules! options {
  () => { $crate::Options::new() };
  ($( $key:expr => $value:expr ),+ $(,)?) => {{
    let mut map = $crate::Options::new();
    $( map.insert(($key).to_string(), $crate::serde_json::json!($value)); )+
    map
  }};
}

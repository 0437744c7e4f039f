// opkit/src/core/naming.rs

//! Name canonicalization for callbacks, error reporters and record types.

/// Suffix every stored callback and custom action name carries.
pub const CALLBACK_SUFFIX: &str = "_callback";

/// Suffix of the reporter generated for an error reason (`not_found` -> `not_found_error`).
pub const ERROR_METHOD_SUFFIX: &str = "_error";

/// Returns `name` with `suffix` appended, unless it already ends with it.
///
/// `normalized_callback_name("build_record", "_callback")` and
/// `normalized_callback_name("build_record_callback", "_callback")` both yield
/// `"build_record_callback"`.
pub fn normalized_callback_name(name: &str, suffix: &str) -> String {
  if name.ends_with(suffix) {
    name.to_string()
  } else {
    format!("{}{}", name, suffix)
  }
}

/// Shorthand for [`normalized_callback_name`] with [`CALLBACK_SUFFIX`].
pub fn callback_name(name: &str) -> String {
  normalized_callback_name(name, CALLBACK_SUFFIX)
}

/// Converts `CamelCase` and `Module::Path` identifiers into `snake_case`.
pub fn underscore(word: &str) -> String {
  let word = word.replace("::", "/");
  let chars: Vec<char> = word.chars().collect();
  let mut out = String::with_capacity(word.len() + 4);

  for (idx, &ch) in chars.iter().enumerate() {
    if ch == '-' {
      out.push('_');
      continue;
    }
    if ch.is_uppercase() && idx > 0 {
      let prev = chars[idx - 1];
      let next_is_lower = chars.get(idx + 1).map_or(false, |c| c.is_lowercase());
      let boundary = (prev.is_lowercase() || prev.is_ascii_digit())
        || (prev.is_uppercase() && next_is_lower);
      if boundary && prev != '/' {
        out.push('_');
      }
    }
    out.extend(ch.to_lowercase());
  }
  out
}

/// Last path segment of a Rust type name, generics stripped.
///
/// `short_type_name::<my_app::ops::WidgetCreate>()` is `"WidgetCreate"`.
pub fn short_type_name<T: ?Sized>() -> &'static str {
  let full = std::any::type_name::<T>();
  let base = match full.find('<') {
    Some(idx) => &full[..idx],
    None => full,
  };
  match base.rfind("::") {
    Some(idx) => &base[idx + 2..],
    None => base,
  }
}

/// Namespace used for a record type's message keys: underscored and naively pluralized.
///
/// `record_error_key("BlogPost")` is `"blog_posts"`.
pub fn record_error_key(record_type: &str) -> String {
  format!("{}s", underscore(record_type))
}

//! Shared validation helpers used by the section validators.

/// Push an error if `value` is outside `[min, max]`.
pub(crate) fn validate_range(errors: &mut Vec<String>, name: &str, value: u32, min: u32, max: u32) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

/// Push an error if `value` does not start with one of `schemes`.
pub(crate) fn validate_scheme(errors: &mut Vec<String>, name: &str, value: &str, schemes: &[&str]) {
    let ok = schemes
        .iter()
        .any(|scheme| value.strip_prefix(scheme).is_some_and(|rest| rest.starts_with("://")));
    if !ok {
        errors.push(format!(
            "{name} = \"{value}\" must use one of: {}",
            schemes.join(", ")
        ));
    }
}

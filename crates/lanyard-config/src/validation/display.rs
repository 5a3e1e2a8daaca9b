use crate::schema::LanyardConfig;

use super::helpers::validate_range;

pub(crate) fn validate_display(errors: &mut Vec<String>, config: &LanyardConfig) {
    validate_range(
        errors,
        "display.tick_interval_ms",
        config.display.tick_interval_ms,
        100,
        10_000,
    );
}

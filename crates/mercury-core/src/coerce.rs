// ── Value coercion ──
//
// Switch firmware reports the same concept in different shapes ("on",
// true, 1). These rules turn raw values into the semantic type an
// entity displays.

use mercury_api::SwitchValue;

/// Text values (compared lower-cased) that read as `true`.
const TRUTHY_TEXT: [&str; 4] = ["on", "true", "1", "yes"];

/// Permissive boolean coercion.
///
/// Text is `true` iff its lower-cased form is one of `on`, `true`, `1`,
/// `yes` (everything else, including the empty string, is `false`).
/// Booleans pass through; numbers are `true` iff nonzero.
pub fn coerce_bool(raw: &SwitchValue) -> bool {
    match raw {
        SwitchValue::Text(s) => {
            let lower = s.to_lowercase();
            TRUTHY_TEXT.contains(&lower.as_str())
        }
        SwitchValue::Bool(b) => *b,
        SwitchValue::Int(i) => *i != 0,
        SwitchValue::Float(f) => *f != 0.0,
    }
}

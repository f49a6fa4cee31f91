/// Render a float for artifact names, command flags and the report.
///
/// Output matches the `repr` of the experiment scripts that built the
/// existing artifacts: shortest round-trip digits, integral values keep one
/// decimal (`1.0`), and magnitudes below `1e-4` or from `1e16` up switch to
/// exponent form with at least two exponent digits (`1e-05`, `1.5e+16`).
pub fn render_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    // `{:e}` gives the shortest round-trip mantissa, e.g. "1.5e-5"
    let scientific = format!("{value:e}");
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= 16 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.abs())
    } else {
        let fixed = value.to_string();
        if fixed.contains('.') {
            fixed
        } else {
            format!("{fixed}.0")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_float() {
        assert_eq!(render_float(1.0), "1.0");
        assert_eq!(render_float(0.0), "0.0");
        assert_eq!(render_float(12.0), "12.0");
        assert_eq!(render_float(0.1), "0.1");
        assert_eq!(render_float(0.005), "0.005");
        assert_eq!(render_float(1.0 / 3.0), "0.3333333333333333");
    }

    #[test]
    fn test_small_values_use_exponent_form() {
        assert_eq!(render_float(0.0001), "0.0001");
        assert_eq!(render_float(0.00001), "1e-05");
        assert_eq!(render_float(0.000015), "1.5e-05");
        assert_eq!(render_float(2.5e-10), "2.5e-10");
        assert_eq!(render_float(-0.00001), "-1e-05");
    }

    #[test]
    fn test_large_values_use_exponent_form() {
        assert_eq!(render_float(1e15), "1000000000000000.0");
        assert_eq!(render_float(1e16), "1e+16");
        assert_eq!(render_float(1.5e16), "1.5e+16");
        assert_eq!(render_float(1e100), "1e+100");
    }

    #[test]
    fn test_non_finite() {
        assert_eq!(render_float(f64::NAN), "nan");
        assert_eq!(render_float(f64::INFINITY), "inf");
        assert_eq!(render_float(f64::NEG_INFINITY), "-inf");
    }
}

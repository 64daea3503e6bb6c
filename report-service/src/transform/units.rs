/// Convert a raw reading in `unit` to whole kilowatt-hours.
///
/// `Wh` (any case) is divided by 1000 with truncation; every other unit,
/// including unrecognized ones, passes through unchanged.
pub fn normalize_to_kwh(raw: i64, unit: &str) -> i64 {
    if unit.eq_ignore_ascii_case("Wh") {
        raw / 1000
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watt_hours_are_truncated_to_kwh() {
        assert_eq!(normalize_to_kwh(1000, "Wh"), 1);
        assert_eq!(normalize_to_kwh(1999, "Wh"), 1);
        assert_eq!(normalize_to_kwh(999, "wh"), 0);
        assert_eq!(normalize_to_kwh(2500, "WH"), 2);

        for v in (0..50_000).step_by(137) {
            assert_eq!(normalize_to_kwh(v, "Wh"), v / 1000);
        }
    }

    #[test]
    fn other_units_pass_through() {
        for v in [0, 1, 999, 1000, 123_456] {
            assert_eq!(normalize_to_kwh(v, "kWh"), v);
            assert_eq!(normalize_to_kwh(v, "MWh"), v);
            assert_eq!(normalize_to_kwh(v, ""), v);
        }
    }
}

use proptest::prelude::*;

use meetpoll_types::{DynamicConfig, SessionKind};

proptest! {
    /// Every well-formed HH:MM pair with min < max yields a window.
    #[test]
    fn ordered_times_form_a_window(
        h1 in 0u32..24, m1 in 0u32..60,
        h2 in 0u32..24, m2 in 0u32..60,
    ) {
        let cfg = DynamicConfig {
            date: None,
            min_time: format!("{h1:02}:{m1:02}"),
            max_time: format!("{h2:02}:{m2:02}"),
            allowed_days: Vec::new(),
        };
        let ordered = (h1, m1) < (h2, m2);
        prop_assert_eq!(cfg.time_window().is_ok(), ordered);
    }

    /// Display and FromStr agree for every kind.
    #[test]
    fn kind_display_parses_back(idx in 0usize..3) {
        let kind = [SessionKind::Fixed, SessionKind::Dynamic, SessionKind::Weekly][idx];
        prop_assert_eq!(kind.to_string().parse::<SessionKind>().unwrap(), kind);
    }
}

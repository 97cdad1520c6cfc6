use applycrypto_core::config::{AliasTable, SqlWrappingType};
use applycrypto_core::ApplyCryptoConfig;
use proptest::prelude::*;

proptest! {
    #[test]
    fn wrapping_names_parse_in_any_case(idx in 0usize..4, mask in prop::collection::vec(any::<bool>(), 16), dashed in any::<bool>()) {
        let wrapping = SqlWrappingType::all()[idx];
        let mut written: String = wrapping
            .name()
            .chars()
            .zip(mask.iter().cycle())
            .map(|(c, upper)| if *upper { c.to_ascii_uppercase() } else { c })
            .collect();
        if dashed {
            written = written.replace('_', "-");
        }
        prop_assert_eq!(SqlWrappingType::from_name(&format!("  {written} ")), Some(wrapping));
    }

    #[test]
    fn analysis_limits_survive_a_toml_round_trip(
        depth in 1usize..10_000,
        fan_out in 1usize..10_000,
        escalation in 0usize..8,
        deadline in prop::option::of(1u64..600_000),
    ) {
        let mut config = ApplyCryptoConfig::default();
        config.analysis.max_depth = Some(depth);
        config.analysis.max_fan_out = Some(fan_out);
        config.analysis.max_escalation = Some(escalation);
        config.analysis.deadline_ms = deadline;

        let text = config.to_toml().unwrap();
        let back = ApplyCryptoConfig::from_toml(&text).unwrap();
        prop_assert_eq!(back.analysis.effective_max_depth(), depth);
        prop_assert_eq!(back.analysis.effective_max_fan_out(), fan_out);
        prop_assert_eq!(back.analysis.effective_max_escalation(), escalation);
        prop_assert_eq!(back.analysis.deadline_ms, deadline);
        prop_assert!(ApplyCryptoConfig::validate(&back).is_ok());
    }

    #[test]
    fn alias_tables_with_plain_patterns_validate(names in prop::collection::vec("[a-z_]{1,12}\\*?", 1..6)) {
        let mut table = AliasTable::empty();
        table.national_id = names;
        prop_assert!(table.validate().is_ok());
    }
}

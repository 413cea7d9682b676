//! Property-based tests for veil-cli

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use veil_core::config::MAX_JITTER_SECS;

    use crate::config::{CliOverrides, Config};
    use crate::output::{OutputFormat, OutputFormatter};

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Overrides are accepted exactly when the resulting jitter is in range.
        #[test]
        fn test_jitter_override_validation(jitter in any::<u64>()) {
            let overrides = CliOverrides {
                jitter_secs: Some(jitter),
                ..Default::default()
            };
            let result = Config::default().with_overrides(&overrides);
            prop_assert_eq!(result.is_ok(), jitter <= MAX_JITTER_SECS);
        }

        /// Any saved config loads back with the same tunables.
        #[test]
        fn test_config_file_round_trip(
            jitter in 0..=MAX_JITTER_SECS,
            capacity in 1usize..100_000,
        ) {
            let dir = tempfile::TempDir::new().unwrap();
            let path = dir.path().join("veil.toml");

            let mut config = Config::default();
            config.pipeline.jitter_secs = jitter;
            config.relay.channel_capacity = capacity;
            config.save(&path).unwrap();

            let loaded = Config::load(&path).unwrap();
            prop_assert_eq!(loaded.pipeline.jitter_secs, jitter);
            prop_assert_eq!(loaded.relay.channel_capacity, capacity);
        }

        /// JSON output is always parseable, whatever the message text.
        #[test]
        fn test_json_received_output_is_valid(text in "\\PC*") {
            let sender = veil_crypto::Identity::generate();
            let receiver = veil_crypto::Identity::generate();
            let wrapped = veil_core::send(&sender, receiver.public_key(), &text).unwrap();
            let message = veil_core::receive(&receiver, &wrapped).unwrap();

            let out = OutputFormatter::new(OutputFormat::Json, false).format_received(&message);
            let value: serde_json::Value = serde_json::from_str(&out).unwrap();
            prop_assert_eq!(value["data"]["message"].as_str(), Some(text.as_str()));
        }
    }
}

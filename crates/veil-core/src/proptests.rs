#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use veil_crypto::Identity;

    use crate::protocol::{receive, send, Messenger};

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_round_trip_any_text(message in "\\PC*") {
            let sender = Identity::generate();
            let receiver = Identity::generate();

            let wrapped = send(&sender, receiver.public_key(), &message).unwrap();
            let received = receive(&receiver, &wrapped).unwrap();

            prop_assert_eq!(received.plaintext, message);
            prop_assert_eq!(&received.original_sender, sender.public_key());
        }

        #[test]
        fn test_tampered_content_never_recovers(message in ".{0,64}", extra in "[a-zA-Z0-9+/=]") {
            let sender = Identity::generate();
            let receiver = Identity::generate();

            let mut wrapped = send(&sender, receiver.public_key(), &message).unwrap();
            wrapped.content.push_str(&extra);
            prop_assert!(receive(&receiver, &wrapped).is_err());
        }

        #[test]
        fn test_shifted_timestamp_never_recovers(shift in 1u64..1_000_000) {
            let sender = Identity::generate();
            let receiver = Identity::generate();

            let mut wrapped = Messenger::default()
                .send_at(&sender, receiver.public_key(), "x", 1_700_000_000)
                .unwrap();
            wrapped.created_at = wrapped.created_at.wrapping_add(shift);
            prop_assert!(receive(&receiver, &wrapped).is_err());
        }
    }
}

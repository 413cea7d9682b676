#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::cipher::{decrypt, encrypt};
    use crate::event::{recipient_tag, Envelope, Layer};
    use crate::identity::Identity;

    fn identity_from_seed(seed: [u8; 32]) -> Option<Identity> {
        Identity::import(&seed).ok()
    }

    proptest! {
        #[test]
        fn test_id_determinism(
            content in ".*",
            created_at in any::<u64>(),
            tag in proptest::collection::vec(".*", 0..4),
        ) {
            let author = Identity::generate();
            let a = Envelope::build(Layer::Direct, author.public_key().clone(), vec![tag.clone()], content.clone(), created_at);
            let b = Envelope::build(Layer::Direct, author.public_key().clone(), vec![tag], content, created_at);
            prop_assert_eq!(a.id, b.id);
        }

        #[test]
        fn test_signature_round_trip(seed in any::<[u8; 32]>(), content in ".*") {
            let Some(author) = identity_from_seed(seed) else {
                return Ok(());
            };
            let env = Envelope::build(
                Layer::Direct,
                author.public_key().clone(),
                vec![recipient_tag(author.public_key())],
                content,
                1_700_000_000,
            )
            .sign(&author)
            .unwrap();
            prop_assert!(env.verify());

            let mut tampered = env;
            tampered.content.push('x');
            prop_assert!(!tampered.verify());
        }

        #[test]
        fn test_cipher_round_trip(
            sender_seed in any::<[u8; 32]>(),
            recipient_seed in any::<[u8; 32]>(),
            payload in any::<Vec<u8>>(),
        ) {
            let (Some(sender), Some(recipient)) =
                (identity_from_seed(sender_seed), identity_from_seed(recipient_seed))
            else {
                return Ok(());
            };

            let ct = encrypt(&sender, recipient.public_key(), &payload).unwrap();
            let pt = decrypt(&recipient, sender.public_key(), &ct).unwrap();
            prop_assert_eq!(pt, payload);
        }

        #[test]
        fn test_wire_json_round_trip(content in ".*", created_at in any::<u64>()) {
            let author = Identity::generate();
            let env = Envelope::build(Layer::Wrapped, author.public_key().clone(), vec![], content, created_at)
                .sign(&author)
                .unwrap();
            let parsed = Envelope::from_json(env.to_json().unwrap().as_bytes()).unwrap();
            prop_assert!(parsed.verify());
            prop_assert_eq!(parsed, env);
        }
    }
}

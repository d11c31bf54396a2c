//! Property tests: any edit to a session token must break it

use authkit_core::{ProviderUser, SessionClaims, SessionKeys, TokenMinter, TokenVerifier};
use proptest::prelude::*;

const BASE64URL: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

fn pair(secret: &[u8]) -> (TokenMinter, TokenVerifier) {
    let keys = SessionKeys::from_secret(secret).unwrap();
    (TokenMinter::new(keys.clone()), TokenVerifier::new(keys))
}

fn replace_at(token: &str, index: usize, replacement: char) -> String {
    token
        .char_indices()
        .map(|(i, c)| if i == index { replacement } else { c })
        .collect()
}

fn claims_strategy() -> impl Strategy<Value = SessionClaims> {
    ("[a-z0-9_]{1,24}", proptest::option::of("[a-z]{1,10}@[a-z]{1,10}\\.com")).prop_map(
        |(id, email)| SessionClaims::new(ProviderUser::new(id, email.as_deref())),
    )
}

proptest! {
    #[test]
    fn prop_mint_verify_round_trip(claims in claims_strategy()) {
        let (minter, verifier) = pair(b"proptest-secret");

        let token = minter.mint(&claims).unwrap();
        let session = verifier.verify(&token).unwrap();
        prop_assert_eq!(session.claims, claims);
    }

    #[test]
    fn prop_signature_edit_fails(
        claims in claims_strategy(),
        position in any::<prop::sample::Index>(),
        replacement in prop::sample::select(BASE64URL.to_vec()),
    ) {
        let (minter, verifier) = pair(b"proptest-secret");
        let token = minter.mint(&claims).unwrap();

        let signature_start = token.rfind('.').unwrap() + 1;
        let signature_len = token.len() - signature_start;
        let index = signature_start + position.index(signature_len);
        let replacement = replacement as char;
        prop_assume!(token.as_bytes()[index] as char != replacement);

        let tampered = replace_at(&token, index, replacement);
        prop_assert!(verifier.verify(&tampered).is_err());
    }

    #[test]
    fn prop_header_or_payload_edit_fails(
        claims in claims_strategy(),
        position in any::<prop::sample::Index>(),
        replacement in prop::sample::select(BASE64URL.to_vec()),
    ) {
        let (minter, verifier) = pair(b"proptest-secret");
        let token = minter.mint(&claims).unwrap();

        let signed_len = token.rfind('.').unwrap();
        let index = position.index(signed_len);
        let replacement = replacement as char;
        prop_assume!(token.as_bytes()[index] != b'.');
        prop_assume!(token.as_bytes()[index] as char != replacement);

        let tampered = replace_at(&token, index, replacement);
        prop_assert!(verifier.verify(&tampered).is_err());
    }

    #[test]
    fn prop_foreign_secret_fails(
        claims in claims_strategy(),
        secret in proptest::collection::vec(any::<u8>(), 1..64),
    ) {
        prop_assume!(secret.as_slice() != b"proptest-secret");
        let (minter, _) = pair(&secret);
        let (_, verifier) = pair(b"proptest-secret");

        let token = minter.mint(&claims).unwrap();
        prop_assert!(verifier.verify(&token).is_err());
    }
}

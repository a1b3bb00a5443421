//! Symmetric encryption through the public API.

use stratum_secrets::{decrypt, encrypt, generate_key, EncodedBundle, SecretError};

#[test]
fn test_encrypt_decrypt_symmetric() {
    let plaintext = "The quick brown fox jumps over the lazy dog";
    let key = generate_key();

    let bundle = encrypt(plaintext, &key).unwrap();
    let cleartext = decrypt(&bundle.ciphertext, &key, &bundle.nonce, &bundle.auth_tag).unwrap();

    assert_eq!(cleartext, plaintext);
}

#[test]
fn test_bundle_survives_json_transport() {
    let key = generate_key();
    let bundle = encrypt("connection-string", &key).unwrap();

    let wire = serde_json::to_string(&bundle.encode()).unwrap();
    let received: EncodedBundle = serde_json::from_str(&wire).unwrap();
    let decoded = received.decode().unwrap();

    assert_eq!(decoded, bundle);
    assert_eq!(decoded.open(&key).unwrap(), "connection-string");
}

#[test]
fn test_tampering_is_detected() {
    let key = generate_key();
    let bundle = encrypt("payload", &key).unwrap();

    let mut ciphertext = bundle.ciphertext.clone();
    ciphertext[0] ^= 0x01;
    assert!(matches!(
        decrypt(&ciphertext, &key, &bundle.nonce, &bundle.auth_tag),
        Err(SecretError::AuthenticationFailed)
    ));

    let mut tag = bundle.auth_tag;
    tag[15] ^= 0x01;
    assert!(matches!(
        decrypt(&bundle.ciphertext, &key, &bundle.nonce, &tag),
        Err(SecretError::AuthenticationFailed)
    ));

    assert!(matches!(
        decrypt(&bundle.ciphertext, &generate_key(), &bundle.nonce, &bundle.auth_tag),
        Err(SecretError::AuthenticationFailed)
    ));
}

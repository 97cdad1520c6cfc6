//! The closed crypto decision table.

use applycrypto_core::errors::ResolutionFailure;

use super::types::{CryptoAction, SinkKind, SourceKind};

/// Crypto action for a (source, sink) pair.
///
/// | source | sink | action |
/// |---|---|---|
/// | HTTP_REQUEST, EXTERNAL_API, SESSION | DB | ENCRYPT |
/// | DB | HTTP_RESPONSE, EXTERNAL_API, SESSION | DECRYPT |
/// | SESSION | HTTP_RESPONSE | NONE |
/// | HTTP_REQUEST | SESSION | NONE |
/// | DB | DB | NONE |
///
/// Every other pair is an error, never a guess.
pub fn decide(source: SourceKind, sink: SinkKind) -> Result<CryptoAction, ResolutionFailure> {
    use SinkKind as K;
    use SourceKind as S;
    match (source, sink) {
        (S::HttpRequest | S::ExternalApi | S::Session, K::Db) => Ok(CryptoAction::Encrypt),
        (S::Db, K::HttpResponse | K::ExternalApi | K::Session) => Ok(CryptoAction::Decrypt),
        (S::Session, K::HttpResponse) => Ok(CryptoAction::None),
        (S::HttpRequest, K::Session) => Ok(CryptoAction::None),
        (S::Db, K::Db) => Ok(CryptoAction::None),
        _ => Err(ResolutionFailure::UnlistedPolicy {
            source_kind: source.name().to_string(),
            sink_kind: sink.name().to_string(),
        }),
    }
}

/// Combine the before-call and after-call legs of one statement.
pub fn combine(encrypt: bool, decrypt: bool) -> CryptoAction {
    match (encrypt, decrypt) {
        (true, true) => CryptoAction::EncryptThenDecrypt,
        (true, false) => CryptoAction::Encrypt,
        (false, true) => CryptoAction::Decrypt,
        (false, false) => CryptoAction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listed_pairs() {
        assert_eq!(decide(SourceKind::HttpRequest, SinkKind::Db), Ok(CryptoAction::Encrypt));
        assert_eq!(decide(SourceKind::Db, SinkKind::Session), Ok(CryptoAction::Decrypt));
        assert_eq!(decide(SourceKind::Session, SinkKind::HttpResponse), Ok(CryptoAction::None));
        assert_eq!(decide(SourceKind::Db, SinkKind::Db), Ok(CryptoAction::None));
    }

    #[test]
    fn unlisted_pair_is_an_error() {
        let err = decide(SourceKind::HttpRequest, SinkKind::HttpResponse).unwrap_err();
        assert!(matches!(err, ResolutionFailure::UnlistedPolicy { .. }));
    }

    #[test]
    fn legs_combine() {
        assert_eq!(combine(true, true), CryptoAction::EncryptThenDecrypt);
        assert_eq!(combine(false, false), CryptoAction::None);
    }
}

// src/services/token.rs

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::error::AppError,
    models::auth::{Claims, Identity},
};

/// Emissão e decodificação de JWT (HS256). Não acessa o banco.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, identity: &Identity) -> Result<String, AppError> {
        self.issue_at(identity, Utc::now())
    }

    pub fn issue_at(&self, identity: &Identity, now: DateTime<Utc>) -> Result<String, AppError> {
        let claims = Claims {
            sub: identity.id,
            role: identity.role,
            company_id: identity.company_id,
            kind: identity.kind,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        // Usa '?' para um tratamento de erro mais limpo
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// Verifica assinatura e expiração. Qualquer falha vira `InvalidToken`.
    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Token rejeitado na decodificação: {}", e);
                AppError::InvalidToken
            })
    }
}

/// Um token emitido antes do marco de invalidação do tenant está revogado.
/// `iat` tem resolução de segundos: um token emitido no mesmo segundo do marco
/// (fração > 0) também é tratado como revogado.
pub fn is_revoked(issued_at: i64, invalidated_at: Option<DateTime<Utc>>) -> bool {
    let Some(cutoff) = invalidated_at else {
        return false;
    };
    match DateTime::<Utc>::from_timestamp(issued_at, 0) {
        Some(iat) => iat < cutoff,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{auth::ActorKind, role::Role};
    use uuid::Uuid;

    fn identity() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            email: "agent@acme.fr".into(),
            display_name: "Agent".into(),
            role: Role::Agent,
            company_id: Some(Uuid::new_v4()),
            kind: ActorKind::Employee,
        }
    }

    #[test]
    fn issued_token_decodes_to_same_identity() {
        let codec = TokenCodec::new("segredo", Duration::hours(24));
        let who = identity();
        let token = codec.issue(&who).unwrap();
        let claims = codec.decode(&token).unwrap();
        assert_eq!(claims.sub, who.id);
        assert_eq!(claims.role, Role::Agent);
        assert_eq!(claims.company_id, who.company_id);
        assert_eq!(claims.kind, ActorKind::Employee);
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = TokenCodec::new("segredo", Duration::hours(1));
        let token = codec.issue_at(&identity(), Utc::now() - Duration::hours(3)).unwrap();
        assert!(matches!(codec.decode(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issuer = TokenCodec::new("um", Duration::hours(1));
        let verifier = TokenCodec::new("outro", Duration::hours(1));
        let token = issuer.issue(&identity()).unwrap();
        assert!(matches!(verifier.decode(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn garbage_is_rejected() {
        let codec = TokenCodec::new("segredo", Duration::hours(1));
        assert!(codec.decode("nao.e.jwt").is_err());
    }

    #[test]
    fn token_issued_before_cutoff_is_revoked() {
        let cutoff = Utc::now();
        let earlier = (cutoff - Duration::minutes(5)).timestamp();
        assert!(is_revoked(earlier, Some(cutoff)));
    }

    #[test]
    fn token_issued_after_cutoff_survives() {
        let cutoff = Utc::now() - Duration::minutes(5);
        assert!(!is_revoked(Utc::now().timestamp(), Some(cutoff)));
        assert!(!is_revoked(Utc::now().timestamp(), None));
    }

    #[test]
    fn same_second_as_cutoff_is_revoked() {
        let cutoff = DateTime::<Utc>::from_timestamp(1_700_000_000, 500_000_000).unwrap();
        assert!(is_revoked(1_700_000_000, Some(cutoff)));
        assert!(!is_revoked(1_700_000_001, Some(cutoff)));
    }
}

use jsonwebtoken::{DecodingKey, Validation, decode};

use crate::models::{Claims, TokenType};

/// Decodes an access token. Refresh tokens are not accepted on API routes.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())?;

    if claims.token_type != TokenType::Access {
        return Err("access token required".to_string());
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn token(token_type: TokenType, secret: &str) -> String {
        let exp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as usize
            + 600;
        let claims = Claims {
            user_id: 900,
            sub: "hr.jane".to_string(),
            role: 2,
            exp,
            jti: uuid::Uuid::new_v4().to_string(),
            token_type,
            company_id: 7,
            employee_id: None,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn accepts_access_tokens() {
        let claims = verify_token(&token(TokenType::Access, "s3cret"), "s3cret").unwrap();
        assert_eq!(claims.user_id, 900);
        assert_eq!(claims.company_id, 7);
    }

    #[test]
    fn rejects_refresh_tokens_and_wrong_secret() {
        assert!(verify_token(&token(TokenType::Refresh, "s3cret"), "s3cret").is_err());
        assert!(verify_token(&token(TokenType::Access, "other"), "s3cret").is_err());
    }
}

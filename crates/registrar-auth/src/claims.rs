use registrar_core::Role;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Claims carried by an identity provider token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// Stable subject identifier issued by the identity provider.
    pub sub: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Role preset by the identity provider. Only honoured when the user row
    /// is first created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub exp: usize,
    pub iat: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_without_optional_fields() {
        let json = r#"{"sub":"user_2abc","email":"ada@example.com","exp":9999999999,"iat":9999999900}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.sub, "user_2abc");
        assert!(claims.name.is_none());
        assert!(claims.role.is_none());
    }

    #[test]
    fn test_claims_with_preset_role() {
        let json = r#"{"sub":"user_2abc","email":"ada@example.com","name":"Ada","role":"teacher","exp":1,"iat":0}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.role, Some(Role::Teacher));
        assert_eq!(claims.name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let json = r#"{"sub":"x","email":"x@example.com","role":"principal","exp":1,"iat":0}"#;
        assert!(serde_json::from_str::<Claims>(json).is_err());
    }

    #[test]
    fn test_serialize_skips_absent_fields() {
        let claims = Claims {
            sub: "user_1".to_string(),
            email: "a@b.com".to_string(),
            name: None,
            role: None,
            exp: 10,
            iat: 1,
        };
        let serialized = serde_json::to_string(&claims).unwrap();
        assert!(!serialized.contains("name"));
        assert!(!serialized.contains("role"));
    }
}

//! UUID surrogate tokens

use super::TokenGenerator;
use crate::domain::SurrogateToken;
use uuid::Uuid;

/// Random v4 UUID tokens
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidTokenGenerator;

impl UuidTokenGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl TokenGenerator for UuidTokenGenerator {
    fn generate(&mut self) -> SurrogateToken {
        SurrogateToken::from_uuid(Uuid::new_v4())
    }
}

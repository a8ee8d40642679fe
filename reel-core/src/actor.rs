//! Who is asking. Identity itself comes from an external auth layer;
//! reel only carries the resolved reference and role.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Anything other than `admin` (case-insensitive) is a plain user.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::User
        }
    }
}

/// Context carried with every request-scoped operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    /// Opaque owner reference; `None` for anonymous viewers.
    pub actor_ref: Option<String>,
    pub role: Role,
}

impl ActorContext {
    pub fn user<S: Into<String>>(actor_ref: S) -> Self {
        Self {
            actor_ref: Some(actor_ref.into()),
            role: Role::User,
        }
    }

    pub fn admin<S: Into<String>>(actor_ref: S) -> Self {
        Self {
            actor_ref: Some(actor_ref.into()),
            role: Role::Admin,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            actor_ref: None,
            role: Role::User,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is(&self, owner_ref: &str) -> bool {
        self.actor_ref.as_deref() == Some(owner_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_defaults_to_user() {
        assert_eq!(Role::parse("ADMIN"), Role::Admin);
        assert_eq!(Role::parse("moderator"), Role::User);
    }

    #[test]
    fn anonymous_owns_nothing() {
        assert!(!ActorContext::anonymous().is(""));
        assert!(ActorContext::user("u-1").is("u-1"));
    }
}

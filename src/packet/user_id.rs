use crate::types::Tag;

/// User ID Packet: a textual identity, conventionally
/// `Name (Comment) <email>`.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.11>
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("User ID: \"{}\"", id)]
pub struct UserId {
    id: String,
}

impl UserId {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(input: impl Into<String>) -> Self {
        UserId { id: input.into() }
    }

    /// Returns the actual id.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tag(&self) -> Tag {
        Tag::UserId
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let id = UserId::from_str("Alice <alice@example.org>");
        assert_eq!(id.id(), "Alice <alice@example.org>");
        assert_eq!(id.to_string(), "User ID: \"Alice <alice@example.org>\"");
    }
}

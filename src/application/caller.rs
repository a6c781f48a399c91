//! Identity of the party invoking an application operation
//!
//! Authentication happens upstream; the service only needs to know who is
//! asking and whether they act as an operator.

/// Caller role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerRole {
    Driver,
    Operator,
}

impl CallerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Driver => "driver",
            Self::Operator => "operator",
        }
    }

    /// Unknown role names fall back to `Driver`.
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("operator") {
            Self::Operator
        } else {
            Self::Driver
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub role: CallerRole,
}

impl Caller {
    pub fn driver(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: CallerRole::Driver,
        }
    }

    pub fn operator(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: CallerRole::Operator,
        }
    }

    pub fn is_operator(&self) -> bool {
        self.role == CallerRole::Operator
    }

    /// Owner of a resource, or an operator.
    pub fn may_act_for(&self, owner_id: &str) -> bool {
        self.is_operator() || self.user_id == owner_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_is_lenient() {
        assert_eq!(CallerRole::parse("operator"), CallerRole::Operator);
        assert_eq!(CallerRole::parse(" Operator "), CallerRole::Operator);
        assert_eq!(CallerRole::parse("admin"), CallerRole::Driver);
        assert_eq!(CallerRole::parse(""), CallerRole::Driver);
    }

    #[test]
    fn operators_act_for_anyone() {
        assert!(Caller::driver("u1").may_act_for("u1"));
        assert!(!Caller::driver("u1").may_act_for("u2"));
        assert!(Caller::operator("ops").may_act_for("u2"));
    }
}

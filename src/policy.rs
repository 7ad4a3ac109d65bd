//! Per-route access policy.
//!
//! A [`RouteDescriptor`] is declared once, next to the handler it protects,
//! and never changes afterwards. The composition engine reads it to decide
//! which guards the route gets.

use http::Method;

/// Path of the product collection; `POST` here is checked for duplicates.
pub const PRODUCTS_PATH: &str = "/products";
/// Path of user self-registration; `POST` here is checked for duplicate usernames.
pub const REGISTER_USER_PATH: &str = "/registerUser";

/// Declared route flags. Absent flags are `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Policy {
    pub require_authentication: bool,
    pub log_me: bool,
    /// Declared by admin-only routes. Carried for documentation; no guard
    /// is composed from it.
    pub check_admin: bool,
}

impl Policy {
    pub fn open() -> Self {
        Self::default()
    }

    pub fn authenticated() -> Self {
        Self {
            require_authentication: true,
            ..Self::default()
        }
    }

    pub fn logged(mut self) -> Self {
        self.log_me = true;
        self
    }

    pub fn admin(mut self) -> Self {
        self.check_admin = true;
        self
    }
}

/// Identity and declared policy of one registered route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    pub method: Method,
    pub path: String,
    pub policy: Option<Policy>,
}

impl RouteDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            policy: None,
        }
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Effective policy; a route without one is fully open.
    pub fn effective_policy(&self) -> Policy {
        self.policy.unwrap_or_default()
    }

    /// Product creation, subject to the existence check.
    pub fn is_product_creation(&self) -> bool {
        self.method == Method::POST && self.path == PRODUCTS_PATH
    }

    /// User self-registration, subject to the duplicate-username check.
    pub fn is_user_registration(&self) -> bool {
        self.method == Method::POST && self.path == REGISTER_USER_PATH
    }
}

impl std::fmt::Display for RouteDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

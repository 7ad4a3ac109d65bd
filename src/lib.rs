//! Route access policy for the dositio catalog service.
//!
//! Routes declare what they need (authentication, access logging) in a
//! [`RouteDescriptor`]; [`compose_route`] turns that declaration into the
//! ordered [`GuardChain`] the HTTP layer runs in front of the handler.
//! Resource-specific checks (duplicate products, duplicate usernames) are
//! attached by the composition engine from the route's method and path, so
//! handlers never carry authorization code of their own.
//!
//! ```
//! use dositio::{compose_route, GuardKind, Policy, RouteDescriptor};
//! use http::Method;
//!
//! let route = RouteDescriptor::new(Method::POST, "/products")
//!     .with_policy(Policy::authenticated().logged());
//! let chain = compose_route(&route);
//!
//! assert_eq!(chain.early, vec![GuardKind::Log, GuardKind::Authenticate]);
//! assert_eq!(chain.pre_handler, vec![GuardKind::RejectIfExists]);
//! ```

pub mod compose;
pub mod context;
pub mod error;
pub mod guard;
pub mod login;
pub mod policy;
pub mod token;

pub use compose::{compose_route, compose_routes, ChainOutcome, GuardChain, GuardKind};
pub use context::RequestContext;
pub use error::{ErrorKind, GuardError};
pub use guard::{AccessEntry, AccessLog, Guard, GuardResult, GuardSet, TracingAccessLog};
pub use login::{login, Credentials, LoginToken};
pub use policy::{Policy, RouteDescriptor};
pub use token::{Identity, TokenError, TokenService};

pub use store;

/// Names of the collections the service reads and writes.
pub mod collections {
    pub const PRODUCTS: &str = "products";
    pub const CATEGORIES: &str = "categories";
    /// Self-registered users; the login route authenticates against these.
    pub const REGISTERED_USERS: &str = "registerUser";
    pub const USERS: &str = "users";
}

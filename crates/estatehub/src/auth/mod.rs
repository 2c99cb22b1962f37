//! Credentials, bearer tokens and login throttling shared by the builder and admin flows.

pub mod password;
pub mod session;
pub mod throttle;
pub mod tokens;

pub use password::{generate_temporary_password, PasswordError, DEFAULT_COST};
pub use session::{bearer_token, AdminSession, BuilderSession, TokenAuthority};
pub use throttle::LoginThrottle;
pub use tokens::{Claims, Role, TokenError, TokenService};

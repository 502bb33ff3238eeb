pub mod password;
pub mod permissions;
pub mod token;

pub use password::{PasswordError, PasswordPolicy};
pub use permissions::{find_duplicate, has_permission, with_role_defaults, Action, Collection, Permission, Role};
pub use token::{Claims, TokenError, TokenIssuer};

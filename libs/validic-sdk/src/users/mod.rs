//! Organization user management: listing, provisioning, updating,
//! suspending, token refresh and deletion.

mod models;
mod resource;

pub use models::{Credentials, UserOptions, UserProfile, UserQuery, UserStatus};
pub use resource::UserResource;

/// Identity of the caller
///
/// Credentials are verified elsewhere; by the time a request reaches the
/// service all that is left is "who is calling", or nobody.

use crate::domain::UserId;

/// Supplies the current user, if any
pub trait IdentityResolver {
    fn current_user(&self) -> Option<UserId>;
}

/// Identity fixed for the lifetime of a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticIdentity {
    user: Option<UserId>,
}

impl StaticIdentity {
    pub fn user(user: impl Into<String>) -> Self {
        let user = user.into();
        // An empty id is what an unauthenticated request carries
        if user.is_empty() {
            return Self::anonymous();
        }
        Self {
            user: Some(UserId::new(user)),
        }
    }

    pub fn anonymous() -> Self {
        Self { user: None }
    }
}

impl IdentityResolver for StaticIdentity {
    fn current_user(&self) -> Option<UserId> {
        self.user.clone()
    }
}

impl<T: IdentityResolver + ?Sized> IdentityResolver for &T {
    fn current_user(&self) -> Option<UserId> {
        (**self).current_user()
    }
}

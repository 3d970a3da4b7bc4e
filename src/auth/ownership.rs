//! Ownership checks along the user → location → container → item chain.
//!
//! Every check is a pure comparison of the resource's owning user against the
//! authenticated caller. Loading the resource (and answering 404 when it does
//! not exist) is the caller's job and always happens first.

use crate::database::models::{Container, Item, Location};

use super::Claims;

/// Outcome of an ownership check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }

    fn when(allowed: bool) -> Self {
        if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}

/// Resources that resolve to exactly one owning user.
pub trait Owned {
    fn owner_id(&self) -> i64;
}

impl Owned for Location {
    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

// Stored directly on the container since the location is optional.
impl Owned for Container {
    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

impl Owned for Item {
    fn owner_id(&self) -> i64 {
        self.container.user_id
    }
}

pub fn authorize<R: Owned + ?Sized>(claims: &Claims, resource: &R) -> Decision {
    Decision::when(resource.owner_id() == claims.user_id)
}

pub fn authorize_location(claims: &Claims, location: &Location) -> Decision {
    authorize(claims, location)
}

pub fn authorize_container(claims: &Claims, container: &Container) -> Decision {
    authorize(claims, container)
}

pub fn authorize_item(claims: &Claims, item: &Item) -> Decision {
    authorize(claims, item)
}

/// Which side of an attachment was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentDenied {
    Container,
    Location,
}

/// Both the container and the location being attached must belong to the caller.
pub fn authorize_attachment(
    claims: &Claims,
    container: &Container,
    location: &Location,
) -> Result<(), AttachmentDenied> {
    if !authorize_container(claims, container).is_allowed() {
        return Err(AttachmentDenied::Container);
    }
    if !authorize_location(claims, location).is_allowed() {
        return Err(AttachmentDenied::Location);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::test_fixtures::{claims_for, container, item, location};

    #[test]
    fn location_owner_is_allowed() {
        let loc = location(10, 1);
        assert_eq!(authorize_location(&claims_for(1), &loc), Decision::Allow);
        assert_eq!(authorize_location(&claims_for(2), &loc), Decision::Deny);
    }

    #[test]
    fn container_without_location_still_has_owner() {
        let c = container(20, 3, None);
        assert!(authorize_container(&claims_for(3), &c).is_allowed());
        assert!(!authorize_container(&claims_for(4), &c).is_allowed());
    }

    #[test]
    fn item_follows_container_owner() {
        for owner in 1..=4_i64 {
            for caller in 1..=4_i64 {
                let it = item(100, container(20, owner, Some(9)));
                let decision = authorize_item(&claims_for(caller), &it);
                assert_eq!(decision.is_allowed(), owner == caller, "owner {} caller {}", owner, caller);
            }
        }
    }

    #[test]
    fn attachment_checks_both_sides() {
        let claims = claims_for(1);
        assert_eq!(authorize_attachment(&claims, &container(1, 1, None), &location(2, 1)), Ok(()));
        assert_eq!(
            authorize_attachment(&claims, &container(1, 2, None), &location(2, 1)),
            Err(AttachmentDenied::Container)
        );
        assert_eq!(
            authorize_attachment(&claims, &container(1, 1, None), &location(2, 2)),
            Err(AttachmentDenied::Location)
        );
    }
}

pub mod credential;
pub mod ownership;
pub mod password;

pub use credential::{Claims, CredentialCodec, CredentialError, IssuedCredential};
pub use ownership::{
    authorize_attachment, authorize_container, authorize_item, authorize_location, AttachmentDenied, Decision,
};
pub use password::{hash_password, verify_password, PasswordError};

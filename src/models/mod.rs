//! Marketplace records and the forms that write them

mod category;
mod message;
mod notification;
mod product;
mod review;
mod user;

pub use category::*;
pub use message::*;
pub use notification::*;
pub use product::*;
pub use review::*;
pub use user::*;

use crate::error::{Error, FieldError};

/// Form validation run before anything is written
pub trait Validate {
    fn validate(&self) -> Result<(), Error>;
}

pub(crate) fn collect(errors: Vec<FieldError>) -> Result<(), Error> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(errors))
    }
}

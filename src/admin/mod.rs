//! Back-office workflows. Every operation takes the acting admin
//! explicitly; there is no ambient "current user".

pub mod categories;
pub mod feedbacks;
pub mod orders;
pub mod products;
pub mod users;

pub use categories::*;
pub use feedbacks::*;
pub use orders::*;
pub use products::*;
pub use users::*;

pub mod cart;
pub mod category;
pub mod feedback;
pub mod order;
pub mod product;
pub mod user;

pub use cart::*;
pub use category::*;
pub use feedback::*;
pub use order::*;
pub use product::*;
pub use user::*;

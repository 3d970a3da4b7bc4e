pub mod container;
pub mod item;
pub mod location;
pub mod user;

pub use container::{Container, ContainerFilter, NewContainer};
pub use item::{owners_of, Item, ItemRow, NewItem};
pub use location::{Location, LocationFilter, NewLocation};
pub use user::{NewUser, User};

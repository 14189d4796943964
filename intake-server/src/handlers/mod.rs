pub mod health;
pub mod lookup;
pub mod sessions;

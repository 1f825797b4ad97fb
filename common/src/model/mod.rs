pub mod activity;
pub mod analysis;
pub mod choices;
pub mod notification;
pub mod quota;
pub mod shift;
pub mod user;

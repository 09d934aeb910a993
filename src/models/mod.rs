pub mod booking;
pub mod driver;
pub mod notification;
pub mod payment;
pub mod review;
pub mod subscription;
pub mod trip;
pub mod user;

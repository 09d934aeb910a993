pub mod dispatch;
pub mod drivers;
pub mod fare;
pub mod lifecycle;
pub mod notifications;
pub mod payments;
pub mod reviews;
pub mod subscriptions;

#[cfg(test)]
pub(crate) mod testing;

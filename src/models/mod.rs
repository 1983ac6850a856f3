pub mod action;
pub mod dialog;
pub mod errors;
pub mod notifications;
pub mod session;
pub mod token;

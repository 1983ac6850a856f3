pub mod action_flow;
pub mod contract_writer;
pub mod notification_services;
pub mod token_info;

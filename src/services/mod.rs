pub mod balance_service;
pub mod bridge;
pub mod send_service;
pub mod tx;

pub use balance_service::BalanceService;
pub use send_service::SendFlow;

pub mod rate_limit;
pub mod service_account;

pub mod addr;
pub mod config;
pub mod error;
pub mod flow;
pub mod result;
pub mod rpc;
pub mod service;
pub mod supervisor;

#[cfg(test)]
mod test;

//! Asynchronous RESP client.
//!
//! Three dispatchers share one codec and differ in how they use a
//! connection:
//!
//! - [`Client`] sends one command at a time and returns replies in
//!   submission order.
//! - [`Pipeline`] writes whole batches and reads their replies back in order.
//! - [`PubSub`] runs a listener that forwards pushed messages to a stream.
//!
//! ```no_run
//! use courier::Client;
//! use courier::ClientConfig;
//!
//! # async fn run() -> Result<(), courier::ClientError> {
//! let client = Client::connect(&ClientConfig::default()).await?;
//! let reply = client.execute(resp::cmd!("SET", "mykey", 123)).await;
//! println!("{}", reply);
//! # Ok(())
//! # }
//! ```

mod client;
pub mod config;
mod connection;
mod error;
mod pipeline;
mod pubsub;
mod queue;
mod request;

pub use client::Client;
pub use config::ClientConfig;
pub use config::ConfigError;
pub use connection::BoxedReader;
pub use connection::BoxedWriter;
pub use connection::Connection;
pub use error::ClientError;
pub use pipeline::Pipeline;
pub use pubsub::Message;
pub use pubsub::PubSub;
pub use queue::CommandQueue;
pub use request::ReplyHandle;

//! # RESP - client side codec for the Redis Serialization Protocol
//!
//! Encodes commands into the multi-bulk request form and decodes server
//! replies, including nested multi-bulk replies, from a byte stream.
//!
//! ## Example
//!
//! ```rust
//! use bytes::BytesMut;
//! use resp::Reply;
//! use resp::RespEncoder;
//!
//! let request = resp::cmd!("set", "mykey", 123).encode().unwrap();
//! assert_eq!(&request[..], b"*3\r\n$3\r\nset\r\n$5\r\nmykey\r\n$3\r\n123\r\n");
//!
//! let mut buf = BytesMut::from(&b"+OK\r\n"[..]);
//! let reply = resp::parse(&mut buf).unwrap();
//! assert_eq!(reply, Reply::status("OK"));
//! ```

mod codec;
mod command;
mod encode;
mod error;
mod parser;
mod types;
mod utils;

pub use codec::Decoder;
pub use codec::Encoder;
pub use command::Command;
pub use command::ToArg;
pub use encode::RespEncoder;
pub use encode::encode_command;
pub use error::EncodeError;
pub use error::ParseError;
pub use error::RespError;
pub use parser::RespParseResult;
pub use parser::RespParser;
pub use parser::parse;
pub use types::Reply;
pub use utils::DEFAULT_MAX_LINE_LEN;
pub use utils::MAX_NESTING_DEPTH;

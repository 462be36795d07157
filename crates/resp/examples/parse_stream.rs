use bytes::BytesMut;
use resp::RespParseResult;
use resp::RespParser;

fn main() {
	println!("--- RESP Streaming Parse Example ---");

	// Replies from a server, split at awkward points:
	// a status, an integer, and a pubsub message push.
	let data_chunks = vec![
		b"+O".as_slice(),
		b"K\r\n:1".as_slice(),
		b"00".as_slice(),
		b"0\r\n*3\r\n$7\r\nmess".as_slice(),
		b"age\r\n$4\r\nnews\r\n$5\r\nhel".as_slice(),
		b"lo\r\n".as_slice(),
	];

	let mut parser = RespParser::new();
	let mut buffer = BytesMut::new();

	for (i, chunk) in data_chunks.iter().enumerate() {
		println!(
			"\n[Stream] Received chunk {}: {:?}",
			i,
			String::from_utf8_lossy(chunk)
		);
		buffer.extend_from_slice(chunk);

		loop {
			match parser.parse(&mut buffer) {
				RespParseResult::Complete(reply) => {
					println!("[Parser] Complete reply:\n{}", reply);
				}
				RespParseResult::Incomplete => {
					println!("[Parser] Incomplete, waiting for more data...");
					break;
				}
				RespParseResult::Error(e) => {
					eprintln!("[Parser] Error: {}", e);
					return;
				}
			}
		}
	}
}

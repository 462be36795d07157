use courier::Client;
use courier::ClientConfig;
use courier::Message;
use courier::Pipeline;
use courier::PubSub;
use courier::config::Cli;
use courier::config::Commands;
use courier::config::Parser;
use resp::Command;
use resp::Reply;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tracing::debug;
use tracing::error;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
	let args = Cli::parse();
	let config = courier::config::setup(&args)?;
	debug!("Connecting to {}", config.addr());

	let ok = match args.command {
		Commands::Exec { args } => run_exec(&config, args).await?,
		Commands::Pipeline => run_pipeline(&config).await?,
		Commands::Subscribe { channels } => run_subscribe(&config, channels, false).await?,
		Commands::Psubscribe { patterns } => run_subscribe(&config, patterns, true).await?,
	};

	if !ok {
		std::process::exit(1);
	}
	Ok(())
}

async fn run_exec(
	config: &ClientConfig,
	args: Vec<String>,
) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
	let client = Client::connect(config).await?;
	let reply = client.execute(args.into_iter().collect()).await;
	println!("{}", reply);
	Ok(!reply.is_invalid())
}

async fn run_pipeline(config: &ClientConfig) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
	let pipeline = Pipeline::connect(config).await?;

	let mut handles = Vec::new();
	let mut lines = BufReader::new(tokio::io::stdin()).lines();
	while let Some(line) = lines.next_line().await? {
		let command: Command = line.split_whitespace().collect();
		if command.is_empty() {
			continue;
		}
		handles.push(pipeline.enqueue(command));
	}

	let size = pipeline.exec();
	debug!("Committed pipeline batch of {} commands", size);

	let mut ok = true;
	for (i, handle) in handles.into_iter().enumerate() {
		let reply = handle.await;
		ok &= !reply.is_invalid();
		println!("{}) {}", i + 1, reply);
	}
	Ok(ok)
}

async fn run_subscribe(
	config: &ClientConfig,
	targets: Vec<String>,
	patterns: bool,
) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
	let mut pubsub = PubSub::connect(config).await?;
	if patterns {
		pubsub.psubscribe(&targets).await?;
	} else {
		pubsub.subscribe(&targets).await?;
	}
	info!("Listening on {} (Ctrl-C to quit)", targets.join(", "));

	let mut ok = true;
	loop {
		tokio::select! {
			_ = tokio::signal::ctrl_c() => break,
			message = pubsub.next_message() => match message {
				Some(Reply::Invalid(e)) => {
					error!("Subscription failed: {}", e);
					ok = false;
					break;
				}
				Some(reply) => print_message(&reply),
				None => break,
			},
		}
	}

	pubsub.stop().await;
	Ok(ok)
}

fn print_message(reply: &Reply) {
	match Message::from_reply(reply) {
		Some(Message::Message { channel, payload }) => {
			println!(
				"{}: {}",
				String::from_utf8_lossy(&channel),
				String::from_utf8_lossy(&payload)
			);
		}
		Some(Message::PMessage {
			pattern,
			channel,
			payload,
		}) => {
			println!(
				"{} ({}): {}",
				String::from_utf8_lossy(&channel),
				String::from_utf8_lossy(&pattern),
				String::from_utf8_lossy(&payload)
			);
		}
		Some(confirmation) => debug!("{:?}", confirmation),
		None => println!("{}", reply),
	}
}

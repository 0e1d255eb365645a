use clap::Parser;

use taskrank::Args;

// Ranking yields cooperatively on a single thread.
#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	taskrank::run(Args::parse()).await
}

use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = wa_search::Args::parse();
	wa_search::run(args).await
}

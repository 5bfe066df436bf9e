use clap::Parser;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = cloud_todo_lib::cli::Cli::parse();
    cloud_todo_lib::cli::run(cli).await
}

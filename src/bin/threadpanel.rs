use clap::Parser;
use threadpanel::{
    app::{App, cli::Cli},
    errors::AppError,
    logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<(), AppError> {
    let cli = Cli::parse();
    if cli.args.print_log_dir {
        println!("Log directory: {}", logging::get_data_dir().display());
        return Ok(());
    }

    let mut app = App::new(cli);
    app.run().await
}

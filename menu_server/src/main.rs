use dotenvy::dotenv;
use log::*;
use menu_server::{cli::handle_command_line_args, config::ServerConfig, server::run_server};

#[actix_web::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    if handle_command_line_args() {
        return;
    }
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("🪛️ {e}");
            eprintln!("{e}\nRun `menu_server --help` for a list of the configuration variables.");
            std::process::exit(1);
        },
    };

    info!("🚀️ Starting server on {}:{}", config.host, config.port);
    match run_server(config).await {
        Ok(_) => println!("Bye!"),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        },
    }
}

use canvas_studio::server::{ServerConfig, serve};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(err) => {
            log::error!("{}", err);
            std::process::exit(1);
        }
    };
    log::info!("Serving files from {}", config.web_root.display());

    if let Err(err) = serve(config).await {
        log::error!("Server stopped: {}", err);
        std::process::exit(1);
    }
}

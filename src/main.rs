use rmcp::{transport::stdio, ServiceExt};
use std::env;
use std::time::Duration;
use survey_refinery_mcp::state::cleanup::start_job_cleanup;
use survey_refinery_mcp::{server, AppConfig, AppState, RefineryServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load_or_default(Some("config.toml"));

    tracing_subscriber::registry()
        .with(
            EnvFilter::from_default_env()
                .add_directive(format!("survey_refinery_mcp={}", config.logging.level).parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = env::args().collect();
    tracing::info!("Loaded configuration: {:?}", config.server.name);

    let default_port = config.server.http_port;
    let app_state = AppState::open(config)?;
    start_job_cleanup(app_state.clone(), Duration::from_secs(10 * 60));

    if args.len() > 1 && args[1] == "--http" {
        let port = args
            .get(2)
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(default_port);

        let bind_addr = args.get(3).map(|s| s.as_str()).unwrap_or("0.0.0.0");

        run_http_server(app_state, bind_addr, port).await?;
    } else {
        tracing::info!("Starting MCP Server on stdio");
        let server = RefineryServer::new(app_state);
        let service = server.serve(stdio()).await?;
        service.waiting().await?;
    }

    tracing::info!("MCP Server shutting down");
    Ok(())
}

async fn run_http_server(app_state: AppState, bind_addr: &str, port: u16) -> anyhow::Result<()> {
    let app = server::router(app_state);

    let addr = format!("{}:{}", bind_addr, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("HTTP Server listening on http://{}", addr);
    tracing::info!("  curl http://{}/info", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

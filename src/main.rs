use actix_web::{web, App, HttpServer};
use anyhow::Context;
use clap::Parser;

mod api;
mod cli;
mod error;
mod metrics;
mod models;
mod services;
mod state;
#[cfg(all(test, unix))]
mod test_support;

use api::{get_metrics, handle_op, health};
use cli::CommandArgs;
use services::{host, toolchain, ConfigStore, Launcher};
use state::{new_state, Shepherd};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CommandArgs::parse();
    let bind_address = format!("{}:{}", args.address, args.port);

    // 找不到工具时直接退出，不接受任何请求
    let tools = toolchain::discover(args.pprof_path.clone(), args.trace_path.clone())
        .context("failed to locate go tools")?;
    log::info!("pprof: {}", tools.pprof.display());
    log::info!("trace: {}", tools.trace.display());

    let host_ip = args.host_ip.clone().unwrap_or_else(host::detect_host_ip);

    let state = new_state(Shepherd::new(
        Launcher::new(),
        ConfigStore::new(&args.config),
        tools,
        host_ip,
    ));

    log::info!("🔄 Recovering tools from {}...", state.config_path().display());
    if let Err(e) = state.recover().await {
        log::warn!("⚠️  Skipping recovery: {:#}", e);
    }

    print_banner(&args, state.host_ip());

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .route("/api", web::to(handle_op))
            .route("/metrics", web::get().to(get_metrics))
            .route("/health", web::get().to(health))
    })
        .bind(&bind_address)
        .with_context(|| format!("failed to bind {}", bind_address))?
        .run()
        .await?;

    Ok(())
}

fn print_banner(args: &CommandArgs, host_ip: &str) {
    println!("╔═══════════════════════════════════════════════════════════╗");
    println!("║      Shepherd v{:<43}║", env!("CARGO_PKG_VERSION"));
    println!("║      On-demand pprof / trace web UIs                      ║");
    println!("╚═══════════════════════════════════════════════════════════╝");
    println!();
    println!("🚀 Server starting on http://{}:{}", host_ip, args.port);
    println!();
    println!("📋 Available endpoints:");
    println!("  GET    /api?op=add&tool=&name=&path1=&path2=   - Launch a tool");
    println!("  GET    /api?op=rmv&port=                       - Stop a tool");
    println!("  GET    /api?op=get                             - List tools");
    println!("  GET    /metrics                                - Prometheus metrics");
    println!("  GET    /health                                 - Health check");
    println!();
    println!("💡 Tool types: 0 = pprof, 1 = trace, 2 = pprof diff (-base path1 path2)");
    println!("═══════════════════════════════════════════════════════════");
}

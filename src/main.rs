use anyhow::Result;
use lance_cycle::app::App;
use lance_cycle::config::Config;
use lance_cycle::utils::logging;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Inicializa logs
    logging::init();

    // Carrega configuração
    let config = Config::from_env();

    // Inicializa a automação
    let mut app = App::initialize(config).await?;

    // Ctrl+C pede parada cooperativa: a tarefa em voo termina antes
    let cancel = app.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("⏹️ Ctrl+C recebido, parando após a tarefa atual...");
            cancel.cancel();
        }
    });

    app.run().await?;

    Ok(())
}

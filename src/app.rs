//! Estrutura principal da aplicação

use anyhow::Result;
use tracing::info;

use crate::browser;
use crate::config::Config;
use crate::infrastructure::Session;
use crate::models::CycleStats;
use crate::orchestrator::{CancelFlag, CycleOrchestrator};
use crate::services::history::FileHistorySink;
use crate::services::progress::LogReporter;
use crate::utils::logging;

/// Aplicação principal
pub struct App {
    config: Config,
    session: Session,
    cancel: CancelFlag,
}

impl App {
    /// Inicializa a aplicação
    pub async fn initialize(config: Config) -> Result<Self> {
        // Inicializa o arquivo de log
        logging::init_log_file(&config.output_log_file)?;

        log_startup(&config);

        // Conecta ao navegador já aberto
        let (browser, page) = browser::connect_to_browser(config.browser_debug_port).await?;
        let session = Session::new(browser, page);

        Ok(Self {
            config,
            session,
            cancel: CancelFlag::new(),
        })
    }

    /// Sinal de cancelamento compartilhável (ex.: handler de Ctrl+C)
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Executa a automação completa
    pub async fn run(&mut self) -> Result<CycleStats> {
        let history = FileHistorySink::new(&self.config.history_file);
        let reporter = LogReporter;

        let orchestrator =
            CycleOrchestrator::new(&self.config, &history, &reporter, self.cancel.clone());

        let stats = orchestrator.run_full_automation(&mut self.session).await?;

        print_final_stats(&stats, &self.config);

        Ok(stats)
    }
}

// ========== Funções auxiliares de log ==========

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 Programa iniciado - ciclo completo de lances");
    info!("🌐 Porta de depuração do navegador: {}", config.browser_debug_port);
    info!("📋 Board alvo: {}", config.board_project_name);
    info!("{}", "=".repeat(60));
}

fn print_final_stats(stats: &CycleStats, config: &Config) {
    info!("\n{}", "=".repeat(60));
    info!("📊 Estatísticas finais");
    info!(
        "Concluído em: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ Sucesso: {}/{}", stats.completed, stats.total_tasks);
    info!("❌ Falhas: {}", stats.failed);
    if stats.interrupted > 0 {
        info!("⏹️ Interrompidas: {}", stats.interrupted);
    }
    info!("{}", "=".repeat(60));
    info!("\nHistórico salvo em: {}", config.history_file);
    info!("Log salvo em: {}", config.output_log_file);
}

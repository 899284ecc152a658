use lance_cycle::browser::connect_to_browser;
use lance_cycle::config::Config;
use lance_cycle::infrastructure::Session;
use lance_cycle::orchestrator::{CancelFlag, CycleOrchestrator};
use lance_cycle::services::board_extractor;
use lance_cycle::services::history::NullHistorySink;
use lance_cycle::services::progress::LogReporter;
use lance_cycle::utils::logging;

// Estes testes exigem um Chrome aberto com --remote-debugging-port e as
// duas abas logadas (Servopa e Todoist).
// Ignorados por padrão: cargo test -- --ignored

#[tokio::test]
#[ignore]
async fn test_browser_connection() {
    // Inicializa logs
    logging::init();

    // Carrega configuração
    let config = Config::from_env();

    // Testa conexão com o navegador
    let result = connect_to_browser(config.browser_debug_port).await;

    assert!(result.is_ok(), "Deveria conectar ao navegador aberto");
}

#[tokio::test]
#[ignore]
async fn test_extract_board() {
    logging::init();

    let config = Config::from_env();

    let (browser, page) = connect_to_browser(config.browser_debug_port)
        .await
        .expect("Falha ao conectar ao navegador");
    let mut session = Session::new(browser, page);

    // Muda para a aba do Todoist antes de extrair
    let switched = session
        .switch_to(&config.todoist_url_part)
        .await
        .expect("Falha ao listar abas");
    assert!(switched, "Deveria existir uma aba do Todoist aberta");

    let board = board_extractor::extract_board(session.active_page(), &LogReporter)
        .await
        .expect("Falha ao extrair o board");

    let board = board.expect("Deveria encontrar colunas no board");
    println!(
        "Board: {} colunas, {} tarefas",
        board.sections.len(),
        board.total_tasks()
    );

    for section in &board.sections {
        assert!(!section.grupo.is_empty(), "Toda coluna deve ter grupo");
        for task in &section.tasks {
            assert!(!task.cota.is_empty(), "Toda tarefa deve ter cota");
        }
    }
}

#[tokio::test]
#[ignore]
async fn test_full_cycle() {
    logging::init();

    let config = Config::from_env();

    let (browser, page) = connect_to_browser(config.browser_debug_port)
        .await
        .expect("Falha ao conectar ao navegador");
    let mut session = Session::new(browser, page);

    // Sem histórico em arquivo para não sujar a auditoria real
    let history = NullHistorySink;
    let reporter = LogReporter;
    let orchestrator =
        CycleOrchestrator::new(&config, &history, &reporter, CancelFlag::new());

    let stats = orchestrator
        .run_full_automation(&mut session)
        .await
        .expect("Falha na automação completa");

    println!(
        "Ciclo: {} concluídas, {} falhas de {} tarefas",
        stats.completed, stats.failed, stats.total_tasks
    );
    assert_eq!(
        stats.completed + stats.failed + stats.skipped + stats.interrupted,
        stats.total_tasks,
        "Sem cancelamento, toda tarefa deve ter desfecho"
    );
}

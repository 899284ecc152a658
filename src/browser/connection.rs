use anyhow::Result;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::AppError;

/// Conecta ao navegador já em execução na porta de depuração
///
/// A automação espera um Chrome aberto com as duas abas (Servopa e Todoist)
/// já autenticadas. Retorna o browser e a primeira aba encontrada.
pub async fn connect_to_browser(port: u16) -> Result<(Browser, Page)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("Conectando ao navegador: {}", browser_url);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("Falha ao conectar ao navegador: {}", e);
        AppError::Browser(format!("falha ao conectar em {}: {}", browser_url, e))
    })?;
    debug!("Navegador conectado");

    // Processa eventos do navegador em segundo plano
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // Pequena pausa para o estado do navegador sincronizar
    sleep(tokio::time::Duration::from_millis(300)).await;

    let pages = browser.pages().await?;
    debug!("{} abas abertas", pages.len());

    let page = match pages.into_iter().next() {
        Some(page) => page,
        None => {
            debug!("Nenhuma aba aberta, criando aba em branco");
            browser.new_page("about:blank").await.map_err(|e| {
                error!("Falha ao criar aba: {}", e);
                e
            })?
        }
    };

    Ok((browser, page))
}

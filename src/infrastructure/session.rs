//! Sessão do navegador - camada de infraestrutura
//!
//! A "aba ativa" é estado mutável compartilhado com um único escritor:
//! somente o orquestrador segura `&mut Session` e somente `switch_to`
//! troca a aba ativa. Serviços recebem a `Page` ativa emprestada pela
//! duração de uma chamada.

use anyhow::Result;
use chromiumoxide::{Browser, Page};
use tracing::debug;

/// Sessão do navegador
///
/// Responsabilidades:
/// - Dona do Browser e da aba ativa
/// - Única autorizada a mudar qual aba está ativa
/// - Não conhece Board / Lance / fluxo
pub struct Session {
    browser: Browser,
    active: Page,
}

impl Session {
    pub fn new(browser: Browser, initial: Page) -> Self {
        Self {
            browser,
            active: initial,
        }
    }

    /// Aba ativa no momento
    pub fn active_page(&self) -> &Page {
        &self.active
    }

    /// Todas as abas abertas na sessão
    pub async fn pages(&self) -> Result<Vec<Page>> {
        Ok(self.browser.pages().await?)
    }

    /// Quantidade de abas abertas
    pub async fn page_count(&self) -> Result<usize> {
        Ok(self.browser.pages().await?.len())
    }

    /// Ativa a primeira aba cuja URL contém `url_part`
    ///
    /// Comparação por substring, sensível a maiúsculas. Sem retry: quem
    /// chama decide se tenta de novo. Retorna `true` deixando a aba ativa
    /// no primeiro match; `false` se nenhuma aba corresponde.
    pub async fn switch_to(&mut self, url_part: &str) -> Result<bool> {
        for page in self.browser.pages().await? {
            let url = page.url().await?.unwrap_or_default();
            if url.contains(url_part) {
                page.bring_to_front().await?;
                self.active = page;
                debug!("Aba ativa: {}", url_part);
                return Ok(true);
            }
        }
        debug!("Nenhuma aba com '{}' encontrada", url_part);
        Ok(false)
    }

    /// URL da aba ativa (vazia se indisponível)
    pub async fn current_url(&self) -> Result<String> {
        Ok(self.active.url().await?.unwrap_or_default())
    }
}

//! Cliente tipado del backend externo de ReEntry Connect.
//!
//! El backend es un colaborador opaco alcanzable en `{BACKEND_URL}/api`;
//! este módulo envuelve sus endpoints con tipos y errores `anyhow`. Ningún
//! fallo suyo es fatal para la aplicación: los llamantes degradan a listas
//! vacías o al mensaje de disculpa del asistente.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::AppConfig;
use crate::models::{CategoryInfo, ChatMessage, Resource, Submission};

/// Carga útil de `POST /api/chat`: el mensaje nuevo, el identificador de
/// sesión y la ventana de contexto (como máximo los 10 mensajes previos,
/// del más antiguo al más reciente).
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
    pub session_id: &'a str,
    pub history: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponseBody {
    response: String,
}

/// Interfaz del colaborador de chat. Es la costura que permite sustituir el
/// backend real por uno guionizado o averiado en las pruebas.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(
        &self,
        message: &str,
        session_id: &str,
        history: &[ChatMessage],
    ) -> Result<String>;
}

/// Cliente HTTP sobre los endpoints del backend.
#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    api_base: Url,
}

impl BackendClient {
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(cfg.chat_timeout)
            .build()
            .context("No se pudo construir el cliente HTTP")?;
        let api_base = cfg
            .backend_url
            .join("api/")
            .context("No se pudo componer la URL base de la API")?;
        Ok(Self { http, api_base })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.api_base
            .join(path)
            .with_context(|| format!("Ruta de API inválida: {path}"))
    }

    /// Dispara la siembra idempotente de la base de datos del backend.
    pub async fn seed(&self) -> Result<()> {
        let url = self.endpoint("seed")?;
        self.http
            .post(url)
            .send()
            .await
            .context("No se pudo contactar con el backend para la siembra")?
            .error_for_status()
            .context("La siembra del backend devolvió un error")?;
        Ok(())
    }

    /// Lista ordenada de categorías `{id, name, icon}`.
    pub async fn categories(&self) -> Result<Vec<CategoryInfo>> {
        let url = self.endpoint("categories")?;
        let list = self
            .http
            .get(url)
            .send()
            .await
            .context("No se pudieron pedir las categorías al backend")?
            .error_for_status()
            .context("El backend devolvió un error al listar categorías")?
            .json()
            .await
            .context("Lista de categorías con formato inesperado")?;
        Ok(list)
    }

    /// Lista completa de recursos del directorio.
    pub async fn resources(&self) -> Result<Vec<Resource>> {
        let url = self.endpoint("resources")?;
        let list = self
            .http
            .get(url)
            .send()
            .await
            .context("No se pudieron pedir los recursos al backend")?
            .error_for_status()
            .context("El backend devolvió un error al listar recursos")?
            .json()
            .await
            .context("Lista de recursos con formato inesperado")?;
        Ok(list)
    }

    /// Reenvía una sugerencia de recurso de la comunidad.
    pub async fn submit(&self, submission: &Submission) -> Result<()> {
        let url = self.endpoint("submissions")?;
        self.http
            .post(url)
            .json(submission)
            .send()
            .await
            .context("No se pudo enviar la sugerencia al backend")?
            .error_for_status()
            .context("El backend rechazó la sugerencia")?;
        Ok(())
    }
}

#[async_trait]
impl ChatBackend for BackendClient {
    async fn chat(
        &self,
        message: &str,
        session_id: &str,
        history: &[ChatMessage],
    ) -> Result<String> {
        let url = self.endpoint("chat")?;
        let body = ChatRequest { message, session_id, history };
        let reply: ChatResponseBody = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .context("No se pudo contactar con el servicio de chat")?
            .error_for_status()
            .context("El servicio de chat devolvió un error")?
            .json()
            .await
            .context("Respuesta de chat con formato inesperado")?;
        Ok(reply.response)
    }
}

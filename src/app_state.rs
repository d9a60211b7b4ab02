use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

use crate::{
    backend::BackendClient, chat::ChatSession, config::AppConfig, favorites::FavoritesStore,
    storage::LocalStore,
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<LocalStore>,
    pub backend: Arc<BackendClient>,
    pub favorites: Arc<FavoritesStore>,
    pub chat: Arc<ChatSession>,
    pub shutdown_sender: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

/// Instantánea ligera del estado de la aplicación para el frontend.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Status {
    /// `true` mientras el asistente tiene una petición en vuelo.
    pub chat_busy: bool,
    pub favorites: usize,
    pub language: &'static str,
}

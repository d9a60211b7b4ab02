// Módulos de la aplicación
mod api;
mod app_state;
mod backend;
mod chat;
mod config;
mod favorites;
mod filter;
mod i18n;
mod models;
mod storage;

use std::sync::{Arc, Mutex};

use axum::Router;
use tokio::sync::oneshot;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::backend::BackendClient;
use crate::chat::ChatSession;
use crate::favorites::FavoritesStore;
use crate::storage::{LocalStore, KEY_LANGUAGE};

#[tokio::main]
async fn main() {
    // 1. Cargar .env e inicializar logging
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 2. Cargar configuración
    let cfg = config::AppConfig::from_env().expect("Error al cargar la configuración");

    // 3. Abrir el almacén local y rehidratar el estado persistido
    let store =
        Arc::new(LocalStore::open(&cfg.data_dir).expect("Error abriendo el almacén local"));
    let language = store.get(KEY_LANGUAGE).unwrap_or(cfg.default_language);
    let favorites = Arc::new(FavoritesStore::new(store.clone()));

    // 4. Inicializar el cliente del backend externo
    let backend = Arc::new(
        BackendClient::from_config(&cfg).expect("Error inicializando el cliente del backend"),
    );

    // 5. Crear la sesión de chat (identidad persistente por perfil)
    let chat = Arc::new(ChatSession::new(
        &store,
        backend.clone(),
        language,
        cfg.chat_timeout,
    ));

    // 6. Disparar la siembra idempotente del backend en segundo plano
    {
        let backend = backend.clone();
        tokio::spawn(async move {
            match backend.seed().await {
                Ok(()) => info!("Siembra del backend completada."),
                Err(e) => error!("Fallo en la siembra del backend: {e}"),
            }
        });
    }

    // Crear canal para la señal de apagado.
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    // 7. Crear estado compartido de la aplicación
    let app_state = AppState {
        config: cfg.clone(),
        store,
        backend,
        favorites,
        chat,
        shutdown_sender: Arc::new(Mutex::new(Some(shutdown_tx))),
    };

    // 8. Configurar el router de la API y el servicio de ficheros estáticos
    let app = Router::new()
        .merge(api::create_router(app_state.clone()))
        .fallback_service(ServeDir::new("frontend"))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // 9. Iniciar el servidor
    let server_addr = &app_state.config.server_addr;
    let listener = tokio::net::TcpListener::bind(server_addr)
        .await
        .expect("No se pudo abrir el puerto del servidor");
    let server_url = format!("http://{}", server_addr);
    info!("🚀 Servidor escuchando en {}", &server_url);

    // Abrir el frontend en el navegador por defecto
    if webbrowser::open(&server_url).is_err() {
        info!(
            "No se pudo abrir el navegador. Por favor, accede a {} manualmente.",
            server_url
        );
    }

    // Configurar el apagado ordenado.
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_rx.await.ok();
            info!("Señal de apagado recibida, iniciando cierre del servidor.");
        })
        .await
        .expect("El servidor terminó con error");

    info!("✅ Servidor cerrado correctamente.");
}

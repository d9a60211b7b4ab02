use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::{
    app_state::{AppState, Status},
    chat::SendOutcome,
    filter::{self, ResourceFilter},
    i18n::Language,
    models::{Category, CategoryInfo, Resource, Submission},
    storage::KEY_LANGUAGE,
};

// --- Payloads y Respuestas de la API ---

#[derive(Deserialize)]
pub struct ResourceQuery {
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    county: Option<String>,
}

#[derive(Deserialize)]
pub struct ChatPayload {
    message: String,
}

#[derive(Serialize)]
pub struct ChatTurnResponse {
    response: String,
    session_id: String,
}

#[derive(Serialize)]
pub struct FavoritesResponse {
    items: Vec<Resource>,
    count: usize,
}

#[derive(Deserialize)]
pub struct LanguagePayload {
    language: String,
}

// --- Router ---

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/categories", get(categories_handler))
        .route("/api/resources", get(resources_handler))
        .route("/api/chat", post(chat_handler))
        .route(
            "/api/favorites",
            get(list_favorites_handler)
                .post(add_favorite_handler)
                .delete(clear_favorites_handler),
        )
        .route("/api/favorites/:id", delete(remove_favorite_handler))
        .route("/api/submissions", post(submission_handler))
        .route("/api/seed", post(seed_handler))
        .route(
            "/api/language",
            get(get_language_handler).post(set_language_handler),
        )
        .route("/api/status", get(status_handler))
        .route("/api/shutdown", post(shutdown_handler))
        .with_state(app_state)
}

// --- Handlers ---

/// Lista de categorías del backend, sin las suprimidas. Si el backend no
/// responde se degrada a lista vacía: el frontend muestra su estado cero.
#[axum::debug_handler]
async fn categories_handler(State(state): State<AppState>) -> Json<Vec<CategoryInfo>> {
    match state.backend.categories().await {
        Ok(list) => Json(filter::visible_categories(list)),
        Err(e) => {
            error!("No se pudieron obtener las categorías: {e}");
            Json(Vec::new())
        }
    }
}

/// Recursos del directorio con los tres filtros independientes aplicados:
/// texto libre, categoría y condado. `all` (o ausencia) desactiva un filtro.
#[axum::debug_handler]
async fn resources_handler(
    State(state): State<AppState>,
    Query(params): Query<ResourceQuery>,
) -> Json<Vec<Resource>> {
    let all = match state.backend.resources().await {
        Ok(list) => filter::visible_resources(list),
        Err(e) => {
            error!("No se pudieron obtener los recursos: {e}");
            return Json(Vec::new());
        }
    };

    let resource_filter = ResourceFilter {
        query: params.search.unwrap_or_default(),
        category: params
            .category
            .as_deref()
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"))
            .map(parse_category),
        county: params
            .county
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all")),
    };

    Json(filter::filter_resources(&all, &resource_filter))
}

/// Un turno del asistente. El cuerpo de la respuesta siempre es el texto que
/// acabó en el historial: la respuesta real o la disculpa fija si el backend
/// falló. Los rechazos de las guardas (vacío / en vuelo) no tocan la sesión.
#[axum::debug_handler]
async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatPayload>,
) -> Result<Json<ChatTurnResponse>, (StatusCode, Json<serde_json::Value>)> {
    state.chat.open();

    match state.chat.send(&payload.message).await {
        SendOutcome::Replied(response) => Ok(Json(ChatTurnResponse {
            response,
            session_id: state.chat.session_id().to_string(),
        })),
        SendOutcome::RejectedEmpty => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "El mensaje no puede estar vacío."})),
        )),
        SendOutcome::RejectedBusy => Err((
            StatusCode::CONFLICT,
            Json(json!({"error": "Ya hay una petición de chat en curso."})),
        )),
    }
}

#[axum::debug_handler]
async fn list_favorites_handler(State(state): State<AppState>) -> Json<FavoritesResponse> {
    Json(FavoritesResponse {
        items: state.favorites.all(),
        count: state.favorites.count(),
    })
}

/// Guarda una instantánea del recurso. Repetir un id ya guardado no tiene
/// efecto y responde 200 en lugar de 201.
#[axum::debug_handler]
async fn add_favorite_handler(
    State(state): State<AppState>,
    Json(resource): Json<Resource>,
) -> impl IntoResponse {
    let added = state.favorites.add(resource);
    let status = if added { StatusCode::CREATED } else { StatusCode::OK };
    (status, Json(json!({ "count": state.favorites.count() })))
}

#[axum::debug_handler]
async fn remove_favorite_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<serde_json::Value> {
    state.favorites.remove(&id);
    Json(json!({ "count": state.favorites.count() }))
}

#[axum::debug_handler]
async fn clear_favorites_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.favorites.clear();
    Json(json!({ "count": 0 }))
}

/// Reenvía la sugerencia al backend. El fallo se devuelve como carga de
/// error para la notificación transitoria; el formulario sigue editable en
/// el cliente para reintentar.
#[axum::debug_handler]
async fn submission_handler(
    State(state): State<AppState>,
    Json(submission): Json<Submission>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    match state.backend.submit(&submission).await {
        Ok(()) => {
            info!("Sugerencia de recurso reenviada: {}", submission.name);
            Ok((
                StatusCode::CREATED,
                Json(json!({"message": "Sugerencia recibida."})),
            ))
        }
        Err(e) => {
            error!("No se pudo reenviar la sugerencia: {e}");
            Err((
                StatusCode::BAD_GATEWAY,
                Json(json!({"error": "No se pudo enviar la sugerencia. Inténtalo de nuevo."})),
            ))
        }
    }
}

/// Dispara la siembra idempotente del backend en segundo plano; los fallos
/// se registran, nunca llegan al usuario.
#[axum::debug_handler]
async fn seed_handler(State(state): State<AppState>) -> StatusCode {
    tokio::spawn(async move {
        match state.backend.seed().await {
            Ok(()) => info!("Siembra del backend completada."),
            Err(e) => error!("Fallo en la siembra del backend: {e}"),
        }
    });
    StatusCode::ACCEPTED
}

#[axum::debug_handler]
async fn get_language_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "language": state.chat.language().as_str() }))
}

#[axum::debug_handler]
async fn set_language_handler(
    State(state): State<AppState>,
    Json(payload): Json<LanguagePayload>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let language = Language::from_str(&payload.language)
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(json!({"error": e.to_string()}))))?;

    if let Err(e) = state.store.set(KEY_LANGUAGE, &language) {
        error!("No se pudo persistir la preferencia de idioma: {e}");
    }
    state.chat.set_language(language);

    Ok(Json(json!({ "language": language.as_str() })))
}

#[axum::debug_handler]
async fn status_handler(State(state): State<AppState>) -> Json<Status> {
    Json(Status {
        chat_busy: state.chat.is_awaiting(),
        favorites: state.favorites.count(),
        language: state.chat.language().as_str(),
    })
}

#[axum::debug_handler]
async fn shutdown_handler(State(state): State<AppState>) -> impl IntoResponse {
    info!("Petición de apagado recibida.");
    if let Some(sender) = state.shutdown_sender.lock().unwrap().take() {
        let _ = sender.send(());
    }
    StatusCode::OK
}

fn parse_category(raw: &str) -> Category {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .unwrap_or(Category::Other)
}

//! Gestión de la sesión del asistente de chat.
//!
//! Flujo de un envío:
//!   1. Guardas: texto en blanco o petición ya en vuelo → rechazo sin efectos.
//!   2. Captura de la ventana de contexto: los últimos 10 mensajes previos,
//!      del más antiguo al más reciente, tal y como estaban antes del añadido.
//!   3. Añadido optimista del mensaje del usuario y paso a "esperando".
//!   4. Llamada al backend acotada por un tiempo máximo explícito.
//!   5. Éxito → se añade la respuesta del asistente; fallo → se añade la
//!      disculpa fija localizada. En ambos casos la sesión vuelve a reposo.
//!
//! El historial en memoria no tiene límite; solo la ventana transmitida se
//! recorta a 10. Un reinicio del proceso deja el historial en el saludo
//! inicial, pero el identificador de sesión persiste y se reutiliza.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::timeout;
use tracing::error;
use uuid::Uuid;

use crate::backend::ChatBackend;
use crate::i18n::Language;
use crate::models::ChatMessage;
use crate::storage::{LocalStore, KEY_CHAT_SESSION};

/// Máximo de mensajes previos que viajan con cada petición.
pub const CONTEXT_WINDOW: usize = 10;

/// Estados del widget de chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetState {
    Closed,
    OpenIdle,
    AwaitingResponse,
}

/// Resultado de un intento de envío.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Texto añadido al historial como asistente (respuesta real o disculpa).
    Replied(String),
    /// Entrada en blanco: sin efectos.
    RejectedEmpty,
    /// Ya hay una petición en vuelo: sin efectos.
    RejectedBusy,
}

struct ChatInner {
    state: WidgetState,
    history: Vec<ChatMessage>,
}

/// Sesión de chat de la aplicación: identidad persistente, historial
/// solo-añadir y como máximo una petición en vuelo.
pub struct ChatSession {
    inner: Mutex<ChatInner>,
    session_id: String,
    language: Mutex<Language>,
    backend: Arc<dyn ChatBackend>,
    request_timeout: Duration,
}

impl ChatSession {
    /// Crea la sesión: recupera (o genera y persiste) el identificador y
    /// siembra el historial con el saludo, presente incluso antes de abrir
    /// el widget por primera vez.
    pub fn new(
        store: &LocalStore,
        backend: Arc<dyn ChatBackend>,
        language: Language,
        request_timeout: Duration,
    ) -> Self {
        let session_id = ensure_session_id(store);
        Self {
            inner: Mutex::new(ChatInner {
                state: WidgetState::Closed,
                history: vec![ChatMessage::assistant(language.chat_greeting())],
            }),
            session_id,
            language: Mutex::new(language),
            backend,
            request_timeout,
        }
    }

    pub fn open(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.state == WidgetState::Closed {
            inner.state = WidgetState::OpenIdle;
        }
    }

    /// Cerrar no borra ni el historial ni el identificador: al reabrir se
    /// continúa la misma conversación.
    pub fn close(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.state == WidgetState::OpenIdle {
            inner.state = WidgetState::Closed;
        }
    }

    pub fn state(&self) -> WidgetState {
        self.inner.lock().unwrap().state
    }

    /// `true` mientras hay una petición en vuelo; el frontend desactiva la
    /// entrada con esta señal.
    pub fn is_awaiting(&self) -> bool {
        self.state() == WidgetState::AwaitingResponse
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn history(&self) -> Vec<ChatMessage> {
        self.inner.lock().unwrap().history.clone()
    }

    pub fn language(&self) -> Language {
        *self.language.lock().unwrap()
    }

    /// Cambia el idioma de los textos que la sesión inserta por sí misma.
    /// El historial ya escrito no se retraduce.
    pub fn set_language(&self, language: Language) {
        *self.language.lock().unwrap() = language;
    }

    /// Envía un mensaje del usuario. Exactamente una petición en vuelo a la
    /// vez: un envío durante la espera no añade mensaje ni emite petición.
    pub async fn send(&self, text: &str) -> SendOutcome {
        let text = text.trim();

        let window = {
            let mut inner = self.inner.lock().unwrap();
            if text.is_empty() {
                return SendOutcome::RejectedEmpty;
            }
            if inner.state == WidgetState::AwaitingResponse {
                return SendOutcome::RejectedBusy;
            }

            // Ventana de contexto capturada ANTES del añadido optimista: el
            // mensaje nuevo viaja en `message`, nunca duplicado en `history`.
            let start = inner.history.len().saturating_sub(CONTEXT_WINDOW);
            let window = inner.history[start..].to_vec();

            inner.history.push(ChatMessage::user(text));
            inner.state = WidgetState::AwaitingResponse;
            window
        };

        // MEJORA: espera acotada; al expirar se toma la misma ruta que un
        // fallo de red.
        let result = timeout(
            self.request_timeout,
            self.backend.chat(text, &self.session_id, &window),
        )
        .await;

        let reply = match result {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                error!("Fallo en la petición de chat: {e}");
                self.language().chat_error().to_string()
            }
            Err(_) => {
                error!(
                    "La petición de chat superó el tiempo máximo de {:?}",
                    self.request_timeout
                );
                self.language().chat_error().to_string()
            }
        };

        let mut inner = self.inner.lock().unwrap();
        inner.history.push(ChatMessage::assistant(reply.clone()));
        inner.state = WidgetState::OpenIdle;
        SendOutcome::Replied(reply)
    }
}

/// Devuelve el identificador persistido o genera uno nuevo (UUID v4) y lo
/// persiste inmediatamente. La identidad es por perfil, no por conversación,
/// y no caduca nunca: no existe operación de borrado.
fn ensure_session_id(store: &LocalStore) -> String {
    if let Some(id) = store.get::<String>(KEY_CHAT_SESSION) {
        return id;
    }
    let id = Uuid::new_v4().to_string();
    if let Err(e) = store.set(KEY_CHAT_SESSION, &id) {
        error!("No se pudo persistir el identificador de sesión: {e}");
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use tempfile::tempdir;

    #[derive(Debug, Clone)]
    struct CapturedCall {
        message: String,
        session_id: String,
        history: Vec<ChatMessage>,
    }

    /// Backend guionizado: responde siempre lo mismo y registra cada llamada.
    struct ScriptedBackend {
        reply: String,
        calls: Mutex<Vec<CapturedCall>>,
    }

    impl ScriptedBackend {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self { reply: reply.to_string(), calls: Mutex::new(Vec::new()) })
        }

        fn calls(&self) -> Vec<CapturedCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn chat(
            &self,
            message: &str,
            session_id: &str,
            history: &[ChatMessage],
        ) -> Result<String> {
            self.calls.lock().unwrap().push(CapturedCall {
                message: message.to_string(),
                session_id: session_id.to_string(),
                history: history.to_vec(),
            });
            Ok(self.reply.clone())
        }
    }

    /// Backend que falla siempre.
    struct FailingBackend;

    #[async_trait]
    impl ChatBackend for FailingBackend {
        async fn chat(&self, _: &str, _: &str, _: &[ChatMessage]) -> Result<String> {
            Err(anyhow!("conexión rechazada"))
        }
    }

    /// Backend que no responde hasta que el test lo libera.
    struct GatedBackend {
        gate: tokio::sync::Notify,
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl ChatBackend for GatedBackend {
        async fn chat(&self, _: &str, _: &str, _: &[ChatMessage]) -> Result<String> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.gate.notified().await;
            Ok("respuesta tardía".to_string())
        }
    }

    fn session_with(backend: Arc<dyn ChatBackend>, dir: &std::path::Path) -> ChatSession {
        let store = LocalStore::open(dir).unwrap();
        ChatSession::new(&store, backend, Language::En, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn el_saludo_existe_antes_de_abrir_el_widget() {
        let dir = tempdir().unwrap();
        let session = session_with(ScriptedBackend::new("ok"), dir.path());

        assert_eq!(session.state(), WidgetState::Closed);
        let history = session.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, Role::Assistant);
        assert_eq!(history[0].content, Language::En.chat_greeting());
    }

    #[tokio::test]
    async fn un_envio_agrega_usuario_y_asistente_en_orden() {
        let dir = tempdir().unwrap();
        let backend = ScriptedBackend::new("Prueba con 180 Degrees.");
        let session = session_with(backend.clone(), dir.path());

        session.open();
        let outcome = session.send("  Busco vivienda  ").await;
        assert_eq!(outcome, SendOutcome::Replied("Prueba con 180 Degrees.".to_string()));
        assert_eq!(session.state(), WidgetState::OpenIdle);

        let history = session.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[1].role, Role::User);
        assert_eq!(history[1].content, "Busco vivienda");
        assert_eq!(history[2].role, Role::Assistant);

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].message, "Busco vivienda");
        assert_eq!(calls[0].session_id, session.session_id());
        // La ventana contiene solo el saludo; el mensaje nuevo no va en ella.
        assert_eq!(calls[0].history.len(), 1);
        assert_eq!(calls[0].history[0].role, Role::Assistant);
    }

    #[tokio::test]
    async fn la_ventana_transmitida_se_recorta_a_diez_previos() {
        let dir = tempdir().unwrap();
        let backend = ScriptedBackend::new("ok");
        let session = session_with(backend.clone(), dir.path());
        session.open();

        for i in 0..8 {
            session.send(&format!("mensaje {i}")).await;
        }

        let calls = backend.calls();
        // Antes del octavo envío el historial tenía 1 + 7*2 = 15 mensajes.
        let last = calls.last().unwrap();
        assert_eq!(last.history.len(), CONTEXT_WINDOW);

        // Del más antiguo al más reciente, y sin el mensaje en curso.
        assert_eq!(last.history.last().unwrap().content, "ok");
        assert_eq!(last.history[CONTEXT_WINDOW - 2].content, "mensaje 6");
        assert!(last.history.iter().all(|m| m.content != "mensaje 7"));

        // El historial en memoria no se recorta.
        assert_eq!(session.history().len(), 17);
    }

    #[tokio::test]
    async fn entrada_en_blanco_no_tiene_efectos() {
        let dir = tempdir().unwrap();
        let backend = ScriptedBackend::new("ok");
        let session = session_with(backend.clone(), dir.path());
        session.open();

        assert_eq!(session.send("   ").await, SendOutcome::RejectedEmpty);
        assert_eq!(session.history().len(), 1);
        assert!(backend.calls().is_empty());
        assert_eq!(session.state(), WidgetState::OpenIdle);
    }

    #[tokio::test]
    async fn fallo_del_backend_sustituye_exactamente_una_disculpa() {
        let dir = tempdir().unwrap();
        let session = session_with(Arc::new(FailingBackend), dir.path());
        session.open();

        let outcome = session.send("hola").await;
        assert_eq!(
            outcome,
            SendOutcome::Replied(Language::En.chat_error().to_string())
        );
        assert_eq!(session.state(), WidgetState::OpenIdle);

        let history = session.history();
        // saludo + usuario + una única disculpa como asistente.
        assert_eq!(history.len(), 3);
        assert_eq!(history[2].role, Role::Assistant);
        assert_eq!(history[2].content, Language::En.chat_error());
    }

    #[tokio::test]
    async fn la_disculpa_sale_en_el_idioma_activo() {
        let dir = tempdir().unwrap();
        let session = session_with(Arc::new(FailingBackend), dir.path());
        session.open();
        session.set_language(Language::Es);

        let outcome = session.send("hola").await;
        assert_eq!(
            outcome,
            SendOutcome::Replied(Language::Es.chat_error().to_string())
        );
    }

    #[tokio::test]
    async fn el_timeout_toma_la_ruta_de_fallo() {
        struct SlowBackend;

        #[async_trait]
        impl ChatBackend for SlowBackend {
            async fn chat(&self, _: &str, _: &str, _: &[ChatMessage]) -> Result<String> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok("demasiado tarde".to_string())
            }
        }

        let dir = tempdir().unwrap();
        let store = LocalStore::open(dir.path()).unwrap();
        let session = ChatSession::new(
            &store,
            Arc::new(SlowBackend),
            Language::En,
            Duration::from_millis(20),
        );
        session.open();

        let outcome = session.send("hola").await;
        assert_eq!(
            outcome,
            SendOutcome::Replied(Language::En.chat_error().to_string())
        );
        assert_eq!(session.state(), WidgetState::OpenIdle);
    }

    #[tokio::test]
    async fn un_envio_durante_la_espera_se_rechaza_sin_efectos() {
        let dir = tempdir().unwrap();
        let backend = Arc::new(GatedBackend {
            gate: tokio::sync::Notify::new(),
            calls: std::sync::atomic::AtomicUsize::new(0),
        });
        let session = Arc::new(session_with(backend.clone(), dir.path()));
        session.open();

        let first = {
            let session = session.clone();
            tokio::spawn(async move { session.send("primera").await })
        };

        // Esperar a que la primera petición esté en vuelo.
        for _ in 0..200 {
            if session.is_awaiting() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert!(session.is_awaiting());

        assert_eq!(session.send("segunda").await, SendOutcome::RejectedBusy);
        // Ni segundo mensaje de usuario ni segunda petición.
        assert_eq!(session.history().len(), 2);
        assert_eq!(backend.calls.load(std::sync::atomic::Ordering::SeqCst), 1);

        backend.gate.notify_one();
        let outcome = first.await.unwrap();
        assert_eq!(outcome, SendOutcome::Replied("respuesta tardía".to_string()));
        assert_eq!(session.history().len(), 3);
    }

    #[tokio::test]
    async fn cerrar_y_reabrir_conserva_la_conversacion() {
        let dir = tempdir().unwrap();
        let session = session_with(ScriptedBackend::new("ok"), dir.path());

        session.open();
        session.send("hola").await;
        session.close();
        assert_eq!(session.state(), WidgetState::Closed);

        session.open();
        assert_eq!(session.state(), WidgetState::OpenIdle);
        assert_eq!(session.history().len(), 3);
    }

    #[tokio::test]
    async fn el_identificador_persiste_entre_instancias() {
        let dir = tempdir().unwrap();

        let first = session_with(ScriptedBackend::new("ok"), dir.path());
        let second = session_with(ScriptedBackend::new("ok"), dir.path());

        assert_eq!(first.session_id(), second.session_id());
        // El historial visible, en cambio, vuelve a empezar en el saludo.
        assert_eq!(second.history().len(), 1);
    }
}

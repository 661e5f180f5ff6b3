//! The widget's process-wide namespace.
//!
//! Every entry point the widget reaches through (its outbound request
//! function, plugin registration, builder registry, base load routine, and
//! the document it registers listeners on) lives here, so the compatibility
//! shim can patch them in one place before any instance is constructed.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use futures_util::future::BoxFuture;
use serde_json::Value;

use formwright_types::error::WidgetError;

use super::document::Document;
use super::shim::ShimReport;

/// An outbound request the widget wants to make.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetRequest {
    pub method: String,
    pub url: String,
    pub body: Option<Value>,
}

impl WidgetRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.into(),
            body: None,
        }
    }
}

pub type RequestFn =
    Arc<dyn Fn(WidgetRequest) -> BoxFuture<'static, Result<Value, WidgetError>> + Send + Sync>;

pub type PluginFn = Arc<dyn Fn(&WidgetNamespace, &Value) -> Result<(), WidgetError> + Send + Sync>;

pub type RegisterBuilderFn =
    Arc<dyn Fn(Option<&str>, Option<&Value>) -> Result<(), WidgetError> + Send + Sync>;

pub type LoadFn =
    Arc<dyn Fn(Option<&str>) -> BoxFuture<'static, Result<Value, WidgetError>> + Send + Sync>;

/// Bookkeeping the shim keeps on the namespace it patched.
#[derive(Default)]
pub(crate) struct ShimState {
    /// Set once, by the first network isolation pass.
    pub(crate) original_request: OnceLock<RequestFn>,
    pub(crate) registration_patched: AtomicBool,
    pub(crate) load_patched: AtomicBool,
    pub(crate) applied: OnceLock<ShimReport>,
}

pub struct WidgetNamespace {
    base_url: RwLock<Option<String>>,
    token: RwLock<Option<String>>,
    request: RwLock<RequestFn>,
    plugins: RwLock<PluginFn>,
    register_builder: RwLock<Option<RegisterBuilderFn>>,
    load: RwLock<Option<LoadFn>>,
    document: Arc<Document>,
    pub(crate) shim: ShimState,
}

static GLOBAL: OnceLock<Arc<WidgetNamespace>> = OnceLock::new();

/// The process-wide namespace shared by every session.
pub fn global() -> Arc<WidgetNamespace> {
    Arc::clone(GLOBAL.get_or_init(|| Arc::new(WidgetNamespace::new())))
}

impl WidgetNamespace {
    /// A namespace with no transport: requests fail until a host installs one.
    pub fn new() -> Self {
        let request: RequestFn = Arc::new(
            |req: WidgetRequest| -> BoxFuture<'static, Result<Value, WidgetError>> {
                Box::pin(async move {
                    Err(WidgetError::Request(format!(
                        "no transport for {} {}",
                        req.method, req.url
                    )))
                })
            },
        );
        let plugins: PluginFn = Arc::new(|_ns: &WidgetNamespace, plugin: &Value| {
            Err(WidgetError::Plugin(format!("plugin not supported: {plugin}")))
        });

        Self {
            base_url: RwLock::new(None),
            token: RwLock::new(None),
            request: RwLock::new(request),
            plugins: RwLock::new(plugins),
            register_builder: RwLock::new(None),
            load: RwLock::new(None),
            document: Arc::new(Document::new()),
            shim: ShimState::default(),
        }
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    pub fn base_url(&self) -> Option<String> {
        self.base_url
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_base_url(&self, url: Option<String>) {
        *self.base_url.write().unwrap_or_else(PoisonError::into_inner) = url;
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub fn request_fn(&self) -> RequestFn {
        self.request.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set_request_fn(&self, request: RequestFn) {
        *self.request.write().unwrap_or_else(PoisonError::into_inner) = request;
    }

    /// Issue a request through whatever request function is installed.
    pub fn request(&self, req: WidgetRequest) -> BoxFuture<'static, Result<Value, WidgetError>> {
        let request = self.request_fn();
        request(req)
    }

    pub fn set_plugin_loader(&self, loader: PluginFn) {
        *self.plugins.write().unwrap_or_else(PoisonError::into_inner) = loader;
    }

    /// Register a widget plugin.
    pub fn use_plugin(&self, plugin: &Value) -> Result<(), WidgetError> {
        let loader = self.plugins.read().unwrap_or_else(PoisonError::into_inner).clone();
        loader(self, plugin)
    }

    pub fn set_builder_registration(&self, register: Option<RegisterBuilderFn>) {
        *self
            .register_builder
            .write()
            .unwrap_or_else(PoisonError::into_inner) = register;
    }

    pub fn builder_registration(&self) -> Option<RegisterBuilderFn> {
        self.register_builder
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Call the builder registry's registration method, if the widget has one.
    pub fn register_builder(&self, name: Option<&str>, entry: Option<&Value>) -> Result<(), WidgetError> {
        match self.builder_registration() {
            Some(register) => register(name, entry),
            None => Err(WidgetError::Registration(
                "builder registry not available".to_string(),
            )),
        }
    }

    pub fn set_load_fn(&self, load: Option<LoadFn>) {
        *self.load.write().unwrap_or_else(PoisonError::into_inner) = load;
    }

    pub fn load_fn(&self) -> Option<LoadFn> {
        self.load.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Run the widget's base load routine for `path`.
    pub fn load(&self, path: Option<&str>) -> BoxFuture<'static, Result<Value, WidgetError>> {
        match self.load_fn() {
            Some(load) => load(path),
            None => Box::pin(async { Err(WidgetError::Load("load routine not available".to_string())) }),
        }
    }

    /// What the shim did to this namespace, if it has run.
    pub fn shim_report(&self) -> Option<&ShimReport> {
        self.shim.applied.get()
    }
}

impl Default for WidgetNamespace {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WidgetNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetNamespace")
            .field("base_url", &self.base_url())
            .field("has_token", &self.token().is_some())
            .field("document", &self.document)
            .field("shim", &self.shim_report())
            .finish()
    }
}

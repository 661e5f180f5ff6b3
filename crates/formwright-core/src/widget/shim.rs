//! Compatibility shim for the embedded builder widget.
//!
//! Patches the widget namespace so the widget runs fully offline and
//! survives its known defects:
//!
//! - outbound requests resolve immediately to an empty collection;
//! - plugin registration is a no-op;
//! - document listeners run inside the fault boundary;
//! - builder registration tolerates missing arguments;
//! - the base load routine tolerates a missing path and never rejects.
//!
//! Each patch is individually idempotent, and [`ensure_applied`] runs the
//! whole set at most once per namespace. Patches are never undone: later
//! sessions rely on the same safety net.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use futures_util::future::BoxFuture;
use serde_json::{Map, Value};

use formwright_types::error::WidgetError;

use super::dispatch::guarded_invoke;
use super::namespace::{LoadFn, PluginFn, RegisterBuilderFn, RequestFn, WidgetNamespace, WidgetRequest};

/// Which patches took effect when the shim ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShimReport {
    pub network_isolated: bool,
    pub plugins_disabled: bool,
    pub safe_dispatch: bool,
    /// False when the widget exposes no builder registry.
    pub builder_registration_patched: bool,
    /// False when the widget exposes no base load routine.
    pub load_patched: bool,
}

/// Apply every patch to `ns` unless that already happened.
pub fn ensure_applied(ns: &WidgetNamespace) -> &ShimReport {
    ns.shim.applied.get_or_init(|| {
        apply_network_isolation(ns);
        disable_plugin_loading(ns);
        install_safe_event_dispatch(ns);

        let report = ShimReport {
            network_isolated: ns.shim.original_request.get().is_some(),
            plugins_disabled: true,
            safe_dispatch: ns.document().is_guarded(),
            builder_registration_patched: patch_builder_registration(ns),
            load_patched: patch_load(ns),
        };
        tracing::info!(?report, "Widget compatibility shim applied");
        report
    })
}

/// Clear the remote endpoint and token, and replace the request function
/// with one that resolves to an empty collection without any I/O.
///
/// Returns true if this call replaced the request function.
pub fn apply_network_isolation(ns: &WidgetNamespace) -> bool {
    ns.set_base_url(None);
    ns.set_token(None);

    if ns.shim.original_request.set(ns.request_fn()).is_err() {
        return false;
    }

    let offline: RequestFn = Arc::new(
        |req: WidgetRequest| -> BoxFuture<'static, Result<Value, WidgetError>> {
            tracing::debug!(method = %req.method, url = %req.url, "Suppressed widget request");
            Box::pin(async { Ok(Value::Array(Vec::new())) })
        },
    );
    ns.set_request_fn(offline);
    true
}

/// Replace plugin registration with a no-op that leaves the namespace as is.
pub fn disable_plugin_loading(ns: &WidgetNamespace) {
    let noop: PluginFn = Arc::new(|_ns: &WidgetNamespace, plugin: &Value| {
        tracing::debug!(%plugin, "Ignored widget plugin registration");
        Ok(())
    });
    ns.set_plugin_loader(noop);
}

/// Route every listener registered on the widget's document through the
/// fault boundary. Returns true if this call enabled it.
pub fn install_safe_event_dispatch(ns: &WidgetNamespace) -> bool {
    ns.document().enable_guarded_dispatch()
}

/// Make builder registration a no-op when the name or the instance is
/// missing. Absent registry: nothing to patch, returns false.
pub fn patch_builder_registration(ns: &WidgetNamespace) -> bool {
    let Some(original) = ns.builder_registration() else {
        return false;
    };
    if ns.shim.registration_patched.swap(true, Ordering::AcqRel) {
        return true;
    }

    let patched: RegisterBuilderFn = Arc::new(move |name: Option<&str>, entry: Option<&Value>| {
        match (name.filter(|n| !n.is_empty()), entry) {
            (Some(name), Some(entry)) => original(Some(name), Some(entry)),
            _ => {
                tracing::debug!(?name, "Skipped builder registration with missing arguments");
                Ok(())
            }
        }
    });
    ns.set_builder_registration(Some(patched));
    true
}

/// Default a missing load path to the empty string and resolve every
/// failure (error or panic) to an empty object. Absent routine: returns false.
pub fn patch_load(ns: &WidgetNamespace) -> bool {
    let Some(original) = ns.load_fn() else {
        return false;
    };
    if ns.shim.load_patched.swap(true, Ordering::AcqRel) {
        return true;
    }

    let patched: LoadFn = Arc::new(
        move |path: Option<&str>| -> BoxFuture<'static, Result<Value, WidgetError>> {
            let path = path.unwrap_or("").to_string();
            let pending = guarded_invoke("widget-load", || original(Some(&path)));
            Box::pin(async move {
                let result = match pending {
                    Ok(future) => future.await,
                    Err(fault) => Err(WidgetError::Load(fault.message)),
                };
                match result {
                    Ok(value) => Ok(value),
                    Err(e) => {
                        tracing::warn!(%path, error = %e, "Widget load failed, resolving empty");
                        Ok(Value::Object(Map::new()))
                    }
                }
            })
        },
    );
    ns.set_load_fn(Some(patched));
    true
}

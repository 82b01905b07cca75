//! `window.history` / `window.location` binding

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{DomException, Event, History, Window};

use crate::error::NavigationError;
use crate::event::NavigationEvent;
use crate::provider::{Listener, NavigationProvider};
use crate::Result;

/// Stateless handle to the page's session history.
///
/// Every call looks the global window up again, so the handle holds no JS
/// objects and can be shared across the adapter's callbacks.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserNavigator;

impl BrowserNavigator {
    pub fn new() -> Result<Self> {
        window()?;
        Ok(Self)
    }
}

impl NavigationProvider for BrowserNavigator {
    fn current_path(&self) -> String {
        window()
            .and_then(|w| w.location().pathname().map_err(js_error))
            .unwrap_or_default()
    }

    fn current_hash(&self) -> String {
        window()
            .and_then(|w| w.location().hash().map_err(js_error))
            .unwrap_or_default()
    }

    fn stack_length(&self) -> usize {
        history()
            .and_then(|h| h.length().map_err(js_error))
            .map(|len| len as usize)
            .unwrap_or_default()
    }

    fn push_state(&self, path: &str) -> Result<()> {
        history()?
            .push_state_with_url(&JsValue::NULL, "", Some(path))
            .map_err(js_error)
    }

    fn replace_state(&self, path: &str) -> Result<()> {
        history()?
            .replace_state_with_url(&JsValue::NULL, "", Some(path))
            .map_err(js_error)
    }

    fn go(&self, delta: i32) -> Result<()> {
        history()?.go_with_delta(delta).map_err(js_error)
    }

    fn back(&self) -> Result<()> {
        history()?.back().map_err(js_error)
    }

    fn forward(&self) -> Result<()> {
        history()?.forward().map_err(js_error)
    }

    fn subscribe(&self, event: NavigationEvent, listener: Listener) -> Result<()> {
        let handler = Closure::wrap(Box::new(move |_event: Event| {
            listener(event);
        }) as Box<dyn FnMut(Event)>);

        window()?
            .add_event_listener_with_callback(event.as_str(), handler.as_ref().unchecked_ref())
            .map_err(js_error)?;

        // Listeners live as long as the page
        handler.forget();
        Ok(())
    }
}

fn window() -> Result<Window> {
    web_sys::window().ok_or_else(|| NavigationError::Unavailable("no global window".to_string()))
}

fn history() -> Result<History> {
    window()?.history().map_err(js_error)
}

fn js_error(value: JsValue) -> NavigationError {
    if let Some(exception) = value.dyn_ref::<DomException>() {
        if exception.name() == "SecurityError" {
            return NavigationError::Security(exception.message());
        }
        return NavigationError::Browser(format!("{}: {}", exception.name(), exception.message()));
    }

    NavigationError::Browser(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
}

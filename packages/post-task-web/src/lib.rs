use js_sys::{Function, Object, Reflect};
use post_task::{CapabilitySnapshot, CompletionHandle, Host, Priority, Task, completion};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

// Platform adapter for the browser main thread and workers with a `window`.

/// Binds [`Host`] to the live browser globals.
///
/// Nothing is cached: every call looks the globals up again, so polyfills
/// installed (or removed) after start-up are picked up. Without a `window`
/// the host reports no capabilities and tasks run inline.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserHost;

impl BrowserHost {
    pub fn new() -> Self {
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();
        BrowserHost
    }
}

fn property(target: &JsValue, name: &str) -> Option<JsValue> {
    Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .filter(|value| !value.is_undefined() && !value.is_null())
}

fn is_function(target: &JsValue, name: &str) -> bool {
    property(target, name).is_some_and(|value| value.is_function())
}

fn window() -> Result<web_sys::Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no global `window` exists"))
}

fn scheduler() -> Result<JsValue, JsValue> {
    let window = window()?;
    property(window.as_ref(), "scheduler")
        .ok_or_else(|| JsValue::from_str("no global `scheduler` exists"))
}

fn method(target: &JsValue, name: &str) -> Result<Function, JsValue> {
    Reflect::get(target, &JsValue::from_str(name))?.dyn_into::<Function>()
}

fn millis_i32(duration: Duration) -> i32 {
    i32::try_from(duration.as_millis()).unwrap_or(i32::MAX)
}

fn millis_u32(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}

/// Hands `callback` to the browser through `register`.
///
/// If the browser call throws, the callback runs inline instead so that the
/// task is not lost. The JS wrapper is only handed over to the JS heap once
/// registration succeeded; otherwise it is dropped here.
fn guarded(
    primitive: &'static str,
    callback: Task,
    register: impl FnOnce(&Function) -> Result<(), JsValue>,
) {
    let slot = Rc::new(Cell::new(Some(callback)));
    let pending = slot.clone();
    let closure: Closure<dyn FnMut()> = Closure::once(move || {
        if let Some(callback) = pending.take() {
            callback();
        }
    });

    match register(closure.as_ref().unchecked_ref()) {
        // Frees itself after its single call.
        Ok(()) => drop(closure.into_js_value()),
        Err(error) => {
            tracing::error!(primitive, ?error, "browser scheduling call failed, running inline");
            drop(closure);
            if let Some(callback) = slot.take() {
                callback();
            }
        }
    }
}

impl Host for BrowserHost {
    fn capabilities(&self) -> CapabilitySnapshot {
        let Some(window) = web_sys::window() else {
            return CapabilitySnapshot::NONE;
        };
        let window: &JsValue = window.as_ref();
        let scheduler = property(window, "scheduler");

        CapabilitySnapshot {
            native_scheduler: scheduler
                .as_ref()
                .is_some_and(|s| is_function(s, "postTask")),
            native_yield: scheduler.as_ref().is_some_and(|s| is_function(s, "yield")),
            microtask_queue: is_function(window, "queueMicrotask"),
            idle_callback: is_function(window, "requestIdleCallback"),
            timer: is_function(window, "setTimeout"),
        }
    }

    fn post_native(&self, task: Task, priority: Priority) -> CompletionHandle {
        let (completer, handle) = completion();
        let callback: Task = Box::new(move || completer.run(task));

        guarded("scheduler.postTask", callback, |function| {
            let scheduler = scheduler()?;
            let options = Object::new();
            Reflect::set(
                &options,
                &JsValue::from_str("priority"),
                &JsValue::from_str(priority.as_str()),
            )?;
            method(&scheduler, "postTask")?.call2(&scheduler, function, &options)?;
            Ok(())
        });
        handle
    }

    fn yield_native(&self) -> CompletionHandle {
        let (completer, handle) = completion();
        let callback: Task = Box::new(move || completer.complete());

        guarded("scheduler.yield", callback, |function| {
            let scheduler = scheduler()?;
            let promise = method(&scheduler, "yield")?.call0(&scheduler)?;
            method(&promise, "then")?.call1(&promise, function)?;
            Ok(())
        });
        handle
    }

    fn queue_microtask(&self, callback: Task) {
        guarded("queueMicrotask", callback, |function| {
            window()?.queue_microtask(function);
            Ok(())
        });
    }

    fn request_idle_callback(&self, callback: Task, timeout: Duration) {
        guarded("requestIdleCallback", callback, |function| {
            let options = web_sys::IdleRequestOptions::new();
            options.set_timeout(millis_u32(timeout));
            window()?.request_idle_callback_with_options(function, &options)?;
            Ok(())
        });
    }

    fn set_timeout(&self, callback: Task, delay: Duration) {
        guarded("setTimeout", callback, |function| {
            window()?
                .set_timeout_with_callback_and_timeout_and_arguments_0(function, millis_i32(delay))?;
            Ok(())
        });
    }
}

/// `postTask` for JavaScript callers. Resolves once `task` has run.
#[wasm_bindgen(js_name = postTask)]
pub fn post_task_js(task: Function, priority: &str) -> Result<js_sys::Promise, JsValue> {
    let priority: Priority = priority
        .parse()
        .map_err(|e: post_task::Error| JsValue::from_str(&e.to_string()))?;
    let handle = post_task::post_task(
        &BrowserHost::new(),
        move || {
            if let Err(error) = task.call0(&JsValue::NULL) {
                tracing::error!(?error, "posted task threw");
            }
        },
        priority,
    );
    Ok(into_promise(handle))
}

/// `pauseTask` for JavaScript callers.
#[wasm_bindgen(js_name = pauseTask)]
pub fn pause_task_js() -> js_sys::Promise {
    into_promise(post_task::pause_task(&BrowserHost::new()))
}

fn into_promise(handle: CompletionHandle) -> js_sys::Promise {
    future_to_promise(async move {
        handle
            .await
            .map(|()| JsValue::UNDEFINED)
            .map_err(|error| JsValue::from_str(&error.to_string()))
    })
}

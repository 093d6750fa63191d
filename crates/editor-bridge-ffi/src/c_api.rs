//! C ABI.
//!
//! ```c
//! typedef void (*editor_bridge_event_cb)(const char *event_json, void *user_data);
//!
//! EditorBridge *editor_bridge_new(const char *config_json, editor_bridge_event_cb cb, void *user_data);
//! char *editor_bridge_call(EditorBridge *bridge, const char *call_json);
//! int editor_bridge_poll(EditorBridge *bridge);
//! int editor_bridge_is_language_service_connected(const EditorBridge *bridge);
//! char *editor_bridge_last_error(void);
//! void editor_bridge_string_free(char *s);
//! void editor_bridge_free(EditorBridge *bridge);
//! ```
//!
//! Strings returned by the library are owned by the caller and released with
//! `editor_bridge_string_free`. A bridge must only be used from the thread that created it.

use crate::bridge::Bridge;
use crate::error::FfiError;
use editor_bridge::{BridgeConfig, HostEvent, HostNotifier};
use std::cell::RefCell;
use std::ffi::{CStr, CString, c_char, c_int, c_void};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::ptr;
use std::rc::Rc;

/// Receives each host notification as a NUL-terminated JSON string, valid for the call only.
pub type EditorBridgeEventCallback = extern "C" fn(event_json: *const c_char, user_data: *mut c_void);

thread_local! {
    static LAST_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
}

fn set_last_error(err: &FfiError) {
    tracing::warn!(error = %err, "boundary call failed");
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(err.to_string()));
}

fn clear_last_error() {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
}

fn into_c_string(text: String) -> *mut c_char {
    // Interior NULs cannot come out of serde_json or our own messages.
    CString::new(text)
        .map(CString::into_raw)
        .unwrap_or(ptr::null_mut())
}

struct CallbackNotifier {
    callback: EditorBridgeEventCallback,
    user_data: *mut c_void,
}

impl HostNotifier for CallbackNotifier {
    fn notify(&self, event: HostEvent) {
        let json = event.to_json().to_string();
        match CString::new(json) {
            Ok(json) => (self.callback)(json.as_ptr(), self.user_data),
            Err(err) => tracing::warn!(error = %err, "dropping notification with interior NUL"),
        }
    }
}

struct Discard;

impl HostNotifier for Discard {
    fn notify(&self, _event: HostEvent) {}
}

/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
unsafe fn read_str<'a>(ptr: *const c_char, name: &'static str) -> Result<&'a str, FfiError> {
    if ptr.is_null() {
        return Err(FfiError::NullArgument(name));
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| FfiError::InvalidUtf8(name))
}

fn guarded<T>(f: impl FnOnce() -> Result<T, FfiError>) -> Result<T, FfiError> {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(FfiError::Panic(message))
    })
}

#[unsafe(no_mangle)]
/// Create a bridge. Returns null on failure (see `editor_bridge_last_error`).
///
/// # Safety
/// `config_json` must be null (defaults) or a NUL-terminated string. `user_data` is passed back
/// to `callback` untouched and must stay valid for the bridge's lifetime.
pub unsafe extern "C" fn editor_bridge_new(
    config_json: *const c_char,
    callback: Option<EditorBridgeEventCallback>,
    user_data: *mut c_void,
) -> *mut Bridge {
    let result = guarded(|| {
        let config = if config_json.is_null() {
            BridgeConfig::default()
        } else {
            BridgeConfig::from_json_str(unsafe { read_str(config_json, "config_json") }?)?
        };
        let notifier: Rc<dyn HostNotifier> = match callback {
            Some(callback) => Rc::new(CallbackNotifier {
                callback,
                user_data,
            }),
            None => Rc::new(Discard),
        };
        Ok(Bridge::new(config, notifier))
    });
    match result {
        Ok(bridge) => {
            clear_last_error();
            Box::into_raw(Box::new(bridge))
        }
        Err(err) => {
            set_last_error(&err);
            ptr::null_mut()
        }
    }
}

#[unsafe(no_mangle)]
/// Destroy a bridge, closing its language service connection.
///
/// # Safety
/// `bridge` must be null or a pointer returned by `editor_bridge_new` that was not freed yet.
pub unsafe extern "C" fn editor_bridge_free(bridge: *mut Bridge) {
    if !bridge.is_null() {
        drop(unsafe { Box::from_raw(bridge) });
    }
}

#[unsafe(no_mangle)]
/// Run one JSON call document. Returns the JSON result, or null on failure.
///
/// # Safety
/// `bridge` must come from `editor_bridge_new`; `call_json` must be a NUL-terminated string.
pub unsafe extern "C" fn editor_bridge_call(
    bridge: *mut Bridge,
    call_json: *const c_char,
) -> *mut c_char {
    let Some(bridge) = (unsafe { bridge.as_mut() }) else {
        set_last_error(&FfiError::NullArgument("bridge"));
        return ptr::null_mut();
    };
    let result = guarded(|| {
        let call_json = unsafe { read_str(call_json, "call_json") }?;
        bridge.dispatch_json(call_json)
    });
    match result {
        Ok(value) => {
            clear_last_error();
            into_c_string(value.to_string())
        }
        Err(err) => {
            set_last_error(&err);
            ptr::null_mut()
        }
    }
}

#[unsafe(no_mangle)]
/// Drive the language service connection. Returns 0, or -1 when `bridge` is null.
///
/// # Safety
/// `bridge` must be null or come from `editor_bridge_new`.
pub unsafe extern "C" fn editor_bridge_poll(bridge: *mut Bridge) -> c_int {
    let Some(bridge) = (unsafe { bridge.as_mut() }) else {
        return -1;
    };
    match guarded(|| {
        bridge.poll();
        Ok(())
    }) {
        Ok(()) => 0,
        Err(err) => {
            set_last_error(&err);
            -1
        }
    }
}

#[unsafe(no_mangle)]
/// 1 when a language service socket is open, else 0.
///
/// # Safety
/// `bridge` must be null or come from `editor_bridge_new`.
pub unsafe extern "C" fn editor_bridge_is_language_service_connected(bridge: *const Bridge) -> c_int {
    match unsafe { bridge.as_ref() } {
        Some(bridge) => c_int::from(bridge.is_language_service_connected()),
        None => 0,
    }
}

#[unsafe(no_mangle)]
/// Message of the last failed call on this thread, or null.
pub extern "C" fn editor_bridge_last_error() -> *mut c_char {
    LAST_ERROR.with(|slot| match slot.borrow().as_ref() {
        Some(message) => into_c_string(message.clone()),
        None => ptr::null_mut(),
    })
}

#[unsafe(no_mangle)]
/// Release a string returned by this library.
///
/// # Safety
/// `s` must be null or a string returned by this library that was not freed yet.
pub unsafe extern "C" fn editor_bridge_string_free(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use editor_bridge::encode_base64;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    extern "C" fn collect(event_json: *const c_char, user_data: *mut c_void) {
        let events = unsafe { &*(user_data as *const RefCell<Vec<Value>>) };
        let json = unsafe { CStr::from_ptr(event_json) }.to_str().unwrap();
        events.borrow_mut().push(serde_json::from_str(json).unwrap());
    }

    fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let text = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string();
        unsafe { editor_bridge_string_free(ptr) };
        text
    }

    fn call(bridge: *mut Bridge, json: &Value) -> *mut c_char {
        let json = CString::new(json.to_string()).unwrap();
        unsafe { editor_bridge_call(bridge, json.as_ptr()) }
    }

    #[test]
    fn test_calls_and_notifications() {
        let events: Box<RefCell<Vec<Value>>> = Box::default();
        let user_data = &*events as *const RefCell<Vec<Value>> as *mut c_void;
        let bridge = unsafe { editor_bridge_new(ptr::null(), Some(collect), user_data) };
        assert!(!bridge.is_null());
        assert_eq!(events.borrow()[0]["Event"], "Editor Initialising");

        let result = call(
            bridge,
            &json!({
                "call": "createOrUpdateModel",
                "uri": encode_base64("file:///a.txt"),
                "content": encode_base64("one\n"),
            }),
        );
        assert_eq!(take_string(result), "null");
        assert!(
            events
                .borrow()
                .iter()
                .any(|event| event["Event"] == "Request Diff Update" && event["URI"] == "file:///a.txt")
        );

        let result = call(bridge, &json!({"call": "undo", "uri": encode_base64("file:///a.txt")}));
        assert_eq!(take_string(result), "false");

        assert_eq!(unsafe { editor_bridge_poll(bridge) }, 0);
        assert_eq!(unsafe { editor_bridge_is_language_service_connected(bridge) }, 0);
        unsafe { editor_bridge_free(bridge) };
    }

    #[test]
    fn test_errors_are_reported_per_thread() {
        let bridge = unsafe { editor_bridge_new(ptr::null(), None, ptr::null_mut()) };

        let result = call(bridge, &json!({"call": "setModel", "uri": "***"}));
        assert!(result.is_null());
        let message = take_string(editor_bridge_last_error());
        assert!(message.starts_with("invalid base64 payload"), "{message}");

        let result = call(bridge, &json!({"call": "exitDiffView"}));
        assert_eq!(take_string(result), "null");
        assert!(editor_bridge_last_error().is_null());

        let result = unsafe { editor_bridge_call(ptr::null_mut(), ptr::null()) };
        assert!(result.is_null());
        assert_eq!(
            take_string(editor_bridge_last_error()),
            "null pointer passed for 'bridge'"
        );
        unsafe { editor_bridge_free(bridge) };
    }

    #[test]
    fn test_bad_config_returns_null() {
        let config = CString::new("{ not json").unwrap();
        let bridge = unsafe { editor_bridge_new(config.as_ptr(), None, ptr::null_mut()) };
        assert!(bridge.is_null());
        assert!(take_string(editor_bridge_last_error()).starts_with("invalid JSON payload"));
    }
}

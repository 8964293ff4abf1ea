use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::kernel::registry::{ResultHandlerRegistry, NOT_APPLICABLE_REQUEST_CODE};

/// Receives the result of a child activity started with a request code.
pub trait ActivityResultHandler: Send + Sync {
    fn on_activity_result(&self, request_code: i32, result_code: i32, data: Option<&serde_json::Value>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionGrant {
    Granted,
    Denied,
}

/// Receives the answer to a permission prompt. Empty slices mean the prompt was
/// interrupted and should be treated as a cancellation.
pub trait PermissionsResultHandler: Send + Sync {
    fn on_permissions_result(&self, request_code: i32, permissions: &[String], grants: &[PermissionGrant]);
}

/// What was asked for when a permission prompt was shown.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PermissionsSettings {
    pub permissions: Vec<String>,
    pub rationale: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformCapabilities {
    /// False on hosts without runtime permission prompts; permission
    /// registrations then return `NOT_APPLICABLE_REQUEST_CODE`.
    pub runtime_permissions: bool,
}

/// Per-activity routing table for asynchronous host callbacks.
pub struct ResultRouter {
    capabilities: PlatformCapabilities,
    activity_handlers: ResultHandlerRegistry<dyn ActivityResultHandler>,
    permission_handlers: ResultHandlerRegistry<dyn PermissionsResultHandler>,
    // Keyed by the same codes as `permission_handlers`.
    pending_settings: Mutex<HashMap<i32, PermissionsSettings>>,
}

impl ResultRouter {
    pub fn new(capabilities: PlatformCapabilities) -> Self {
        Self {
            capabilities,
            activity_handlers: ResultHandlerRegistry::new(),
            permission_handlers: ResultHandlerRegistry::new(),
            pending_settings: Mutex::new(HashMap::new()),
        }
    }

    pub fn register_activity_handler(&self, handler: &Arc<dyn ActivityResultHandler>) -> i32 {
        self.activity_handlers.register(handler)
    }

    pub fn register_activity_handler_block(
        &self,
        handler: &Arc<dyn ActivityResultHandler>,
        count: i32,
    ) -> i32 {
        self.activity_handlers.register_block(handler, count)
    }

    pub fn unregister_activity_handler(&self, handler: &Arc<dyn ActivityResultHandler>) -> Vec<i32> {
        self.activity_handlers.unregister(handler)
    }

    /// Routes a child activity result. Returns false for unknown codes.
    pub fn deliver_activity_result(
        &self,
        request_code: i32,
        result_code: i32,
        data: Option<&serde_json::Value>,
    ) -> bool {
        // Lookup releases the registry lock before the handler runs.
        match self.activity_handlers.lookup(request_code) {
            Some(handler) => {
                handler.on_activity_result(request_code, result_code, data);
                true
            }
            None => {
                debug!("No activity result handler for request code {}", request_code);
                false
            }
        }
    }

    pub fn register_permissions_handler(
        &self,
        handler: &Arc<dyn PermissionsResultHandler>,
        settings: Option<PermissionsSettings>,
    ) -> i32 {
        if !self.capabilities.runtime_permissions {
            return NOT_APPLICABLE_REQUEST_CODE;
        }
        let code = self.permission_handlers.register(handler);
        if code > 0 {
            if let Some(settings) = settings {
                self.pending_settings.lock().insert(code, settings);
            }
        }
        code
    }

    /// Contiguous variant; `settings` are attached to every code of the block.
    pub fn register_permissions_handler_block(
        &self,
        handler: &Arc<dyn PermissionsResultHandler>,
        count: i32,
        settings: Option<PermissionsSettings>,
    ) -> i32 {
        if !self.capabilities.runtime_permissions {
            return NOT_APPLICABLE_REQUEST_CODE;
        }
        let start = self.permission_handlers.register_block(handler, count);
        if start > 0 {
            if let Some(settings) = settings {
                let mut pending = self.pending_settings.lock();
                // start + count would overflow for a block ending at i32::MAX.
                for code in (0..count).map(|offset| start + offset) {
                    pending.insert(code, settings.clone());
                }
            }
        }
        start
    }

    /// Frees the handler's codes and their settings. Returns the settings that
    /// were attached, if any.
    pub fn unregister_permissions_handler(
        &self,
        handler: &Arc<dyn PermissionsResultHandler>,
    ) -> Option<PermissionsSettings> {
        let freed = self.permission_handlers.unregister(handler);
        let mut pending = self.pending_settings.lock();
        let mut released = None;
        for code in freed {
            if let Some(settings) = pending.remove(&code) {
                released.get_or_insert(settings);
            }
        }
        released
    }

    /// Settings recorded for a code still awaiting its result.
    pub fn permissions_settings(&self, request_code: i32) -> Option<PermissionsSettings> {
        self.pending_settings.lock().get(&request_code).cloned()
    }

    /// Routes a permission prompt result. Returns false for unknown codes.
    pub fn deliver_permissions_result(
        &self,
        request_code: i32,
        permissions: &[String],
        grants: &[PermissionGrant],
    ) -> bool {
        match self.permission_handlers.lookup(request_code) {
            Some(handler) => {
                handler.on_permissions_result(request_code, permissions, grants);
                true
            }
            None => {
                debug!("No permissions handler for request code {}", request_code);
                false
            }
        }
    }
}

impl std::fmt::Debug for ResultRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultRouter")
            .field("capabilities", &self.capabilities)
            .field("activity_handlers", &self.activity_handlers)
            .field("permission_handlers", &self.permission_handlers)
            .finish()
    }
}

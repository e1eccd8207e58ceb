//! SMS permission negotiation.
//!
//! Each request gets its own request code and its continuation is parked in a
//! pending map under that code. The platform answers through a
//! [`PermissionResponder`], which removes the entry and fires the continuation
//! once. Concurrent requests therefore never overwrite each other.
//!
//! CHANGELOG:
//! - 10/16/2026 - Results for unknown request codes no longer touch the ledger
//! - 02/06/2026 - PermissionGate for stores, StaticPermissionSystem for the daemon
//! - 02/05/2026 - Initial broker

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use crate::error::{EngineError, Result};
use crate::store::{ContentStore, Cursor};

/// Message delivered when no foreground activity can show the prompt.
pub const NO_ACTIVITY_MESSAGE: &str = "Activity doesn't exist";

/// First request code handed out by a broker.
const FIRST_REQUEST_CODE: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ReadSms,
    ReceiveSms,
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::ReadSms => "android.permission.READ_SMS",
            Permission::ReceiveSms => "android.permission.RECEIVE_SMS",
        }
    }
}

/// Requested together by `request_read_sms_permission`.
pub const SMS_PERMISSIONS: [Permission; 2] = [Permission::ReadSms, Permission::ReceiveSms];

/// Outcome delivered to a permission continuation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionStatus {
    NoActivity,
    Granted,
    Denied { denied: Vec<Permission> },
}

impl PermissionStatus {
    /// String form handed to the host continuation.
    pub fn message(&self) -> &'static str {
        match self {
            PermissionStatus::NoActivity => NO_ACTIVITY_MESSAGE,
            PermissionStatus::Granted => "granted",
            PermissionStatus::Denied { .. } => "denied",
        }
    }
}

/// One entry of a platform permission result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionGrant {
    pub permission: Permission,
    pub granted: bool,
}

pub type PermissionCallback = Box<dyn FnOnce(PermissionStatus) + Send>;

/// Permissions granted so far. Cloning shares the same set.
#[derive(Debug, Clone, Default)]
pub struct PermissionLedger {
    granted: Arc<RwLock<HashSet<Permission>>>,
}

impl PermissionLedger {
    pub fn is_granted(&self, permission: Permission) -> bool {
        self.granted
            .read()
            .map(|set| set.contains(&permission))
            .unwrap_or_else(|poisoned| poisoned.into_inner().contains(&permission))
    }

    pub fn record(&self, grants: &[PermissionGrant]) {
        let mut set = self
            .granted
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for grant in grants {
            if grant.granted {
                set.insert(grant.permission);
            } else {
                set.remove(&grant.permission);
            }
        }
    }
}

struct Pending {
    permissions: Vec<Permission>,
    callback: PermissionCallback,
}

type PendingMap = Arc<Mutex<HashMap<i32, Pending>>>;

fn lock(pending: &PendingMap) -> MutexGuard<'_, HashMap<i32, Pending>> {
    pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Handle the platform uses to answer a request.
#[derive(Clone)]
pub struct PermissionResponder {
    pending: PendingMap,
    ledger: PermissionLedger,
}

impl PermissionResponder {
    /// Deliver the platform result for `request_code`. Returns false when no
    /// request with that code is waiting (already answered, or never issued);
    /// such results leave the ledger untouched.
    pub fn deliver(&self, request_code: i32, grants: &[PermissionGrant]) -> bool {
        // Lock released before the continuation runs; it may issue a new request.
        let entry = lock(&self.pending).remove(&request_code);
        let Some(Pending {
            permissions,
            callback,
        }) = entry
        else {
            tracing::warn!(request_code, "permission result for unknown request");
            return false;
        };

        self.ledger.record(grants);

        let denied: Vec<Permission> = permissions
            .into_iter()
            .filter(|p| {
                !grants
                    .iter()
                    .any(|g| g.permission == *p && g.granted)
            })
            .collect();

        let status = if denied.is_empty() {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied { denied }
        };
        tracing::debug!(request_code, status = status.message(), "permission result");
        callback(status);
        true
    }
}

/// Platform permission facility.
pub trait PermissionSystem: Send + Sync {
    /// Whether a foreground activity exists to host the prompt.
    fn has_foreground_activity(&self) -> bool;

    /// Show the prompt. The answer must come back through `responder` with the
    /// same `request_code`, now or later.
    fn request_permissions(
        &self,
        permissions: &[Permission],
        request_code: i32,
        responder: PermissionResponder,
    );
}

/// Issues permission requests and routes results back to their continuations.
pub struct PermissionBroker {
    system: Arc<dyn PermissionSystem>,
    responder: PermissionResponder,
    next_code: AtomicI32,
}

impl PermissionBroker {
    pub fn new(system: Arc<dyn PermissionSystem>) -> Self {
        Self::with_ledger(system, PermissionLedger::default())
    }

    pub fn with_ledger(system: Arc<dyn PermissionSystem>, ledger: PermissionLedger) -> Self {
        Self {
            system,
            responder: PermissionResponder {
                pending: Arc::new(Mutex::new(HashMap::new())),
                ledger,
            },
            next_code: AtomicI32::new(FIRST_REQUEST_CODE),
        }
    }

    pub fn ledger(&self) -> PermissionLedger {
        self.responder.ledger.clone()
    }

    /// Number of requests still waiting for a platform answer.
    pub fn pending_requests(&self) -> usize {
        lock(&self.responder.pending).len()
    }

    /// Ask for READ_SMS + RECEIVE_SMS. The continuation runs exactly once:
    /// immediately with `NoActivity` when there is no foreground activity,
    /// otherwise when the platform answers.
    pub fn request_read_sms_permission<F>(&self, continuation: F)
    where
        F: FnOnce(PermissionStatus) + Send + 'static,
    {
        if !self.system.has_foreground_activity() {
            tracing::warn!("permission requested with no foreground activity");
            continuation(PermissionStatus::NoActivity);
            return;
        }

        let request_code = self.next_code.fetch_add(1, Ordering::Relaxed);
        lock(&self.responder.pending).insert(
            request_code,
            Pending {
                permissions: SMS_PERMISSIONS.to_vec(),
                callback: Box::new(continuation),
            },
        );

        tracing::debug!(
            request_code,
            permissions = ?SMS_PERMISSIONS.map(Permission::as_str),
            "requesting permissions"
        );
        self.system
            .request_permissions(&SMS_PERMISSIONS, request_code, self.responder.clone());
    }
}

/// Policy-driven permission system that answers immediately. Used where no
/// interactive prompt exists (daemon, tests).
#[derive(Debug, Clone, Copy)]
pub struct StaticPermissionSystem {
    pub foreground_activity: bool,
    pub grant: bool,
}

impl PermissionSystem for StaticPermissionSystem {
    fn has_foreground_activity(&self) -> bool {
        self.foreground_activity
    }

    fn request_permissions(
        &self,
        permissions: &[Permission],
        request_code: i32,
        responder: PermissionResponder,
    ) {
        let grants: Vec<PermissionGrant> = permissions
            .iter()
            .map(|p| PermissionGrant {
                permission: *p,
                granted: self.grant,
            })
            .collect();
        responder.deliver(request_code, &grants);
    }
}

/// Store wrapper that refuses queries until READ_SMS is granted.
pub struct PermissionGate<S> {
    inner: S,
    ledger: PermissionLedger,
}

impl<S> PermissionGate<S> {
    pub fn new(inner: S, ledger: PermissionLedger) -> Self {
        Self { inner, ledger }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: ContentStore> ContentStore for PermissionGate<S> {
    fn query(
        &self,
        uri: &str,
        projection: &[&str],
        predicate: Option<&str>,
        args: &[String],
        sort: &str,
        limit: Option<u32>,
    ) -> Result<Option<Box<dyn Cursor + '_>>> {
        if !self.ledger.is_granted(Permission::ReadSms) {
            return Err(EngineError::StoreUnavailable(format!(
                "Permission Denial: reading {} requires {}",
                uri,
                Permission::ReadSms.as_str()
            )));
        }
        self.inner.query(uri, projection, predicate, args, sort, limit)
    }
}

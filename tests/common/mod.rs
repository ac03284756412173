#![allow(dead_code)]

use async_trait::async_trait;
use canniflow::directory::{Role, RoleDirectory, Session, UserProfile};
use canniflow::error::{Result, WorkflowError};
use canniflow::notify::{PushGateway, PushMessage};
use canniflow::store::{Document, DocumentStore, MemoryDocumentStore, SetOptions, Subscription};
use canniflow::workflow::{
    ActionForm, PermissionForm, ReportExporter, RequestForm, WorkflowEngine,
};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Ordered record of store and gateway calls, shared by the fakes
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }

    /// Entries starting with `prefix`
    pub fn matching(&self, prefix: &str) -> Vec<String> {
        self.entries().into_iter().filter(|e| e.starts_with(prefix)).collect()
    }
}

/// In-memory store that logs every call and can be told to fail writes
pub struct RecordingStore {
    inner: MemoryDocumentStore,
    log: CallLog,
    fail_sets: AtomicBool,
}

impl RecordingStore {
    pub fn new(log: CallLog) -> Self {
        Self {
            inner: MemoryDocumentStore::new(),
            log,
            fail_sets: AtomicBool::new(false),
        }
    }

    pub fn fail_sets(&self, fail: bool) {
        self.fail_sets.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        self.log.push(format!("get:{}", path));
        self.inner.get(path).await
    }

    async fn set(&self, path: &str, data: Value, options: SetOptions) -> Result<()> {
        self.log.push(format!("set:{}", path));
        if self.fail_sets.load(Ordering::SeqCst) {
            return Err(WorkflowError::PersistenceFailure("disk full".to_string()));
        }
        self.inner.set(path, data, options).await
    }

    async fn delete(&self, path: &str) -> Result<bool> {
        self.log.push(format!("delete:{}", path));
        self.inner.delete(path).await
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>> {
        self.log.push(format!("list:{}", collection));
        self.inner.list(collection).await
    }

    fn subscribe(&self, collection: &str) -> Subscription {
        self.inner.subscribe(collection)
    }
}

/// Push gateway that records messages instead of sending them
pub struct FakeGateway {
    log: CallLog,
    sent: Mutex<Vec<PushMessage>>,
    failing: AtomicBool,
}

impl FakeGateway {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            sent: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<PushMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushGateway for FakeGateway {
    async fn send(&self, message: &PushMessage) -> Result<()> {
        self.log.push(format!("send:{}", message.to));
        if self.failing.load(Ordering::SeqCst) {
            return Err(WorkflowError::NotificationUndeliverable(
                "push relay returned 500".to_string(),
            ));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Exporter keeping reports in memory
#[derive(Default)]
pub struct MemoryExporter {
    pub exported: Mutex<Vec<(String, String)>>,
    pub failing: AtomicBool,
}

#[async_trait]
impl ReportExporter for MemoryExporter {
    async fn export(&self, case_id: &str, content: &str) -> Result<String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(WorkflowError::ExportFailure("read-only filesystem".to_string()));
        }
        self.exported
            .lock()
            .unwrap()
            .push((case_id.to_string(), content.to_string()));
        Ok(format!("memory://{}", case_id))
    }
}

pub const REQUESTER: &str = "bilal@pia.com";
pub const PLANNER: &str = "ayesha@pia.com";
pub const CHIEF: &str = "imran@pia.com";
pub const OFFICER: &str = "hina@pia.com";

/// Engine over fakes with one registered user per acting role
pub struct Harness {
    pub log: CallLog,
    pub store: Arc<RecordingStore>,
    pub gateway: Arc<FakeGateway>,
    pub exporter: Arc<MemoryExporter>,
    pub engine: WorkflowEngine,
}

impl Harness {
    pub async fn new() -> Self {
        let log = CallLog::default();
        let store = Arc::new(RecordingStore::new(log.clone()));
        let gateway = Arc::new(FakeGateway::new(log.clone()));
        let exporter = Arc::new(MemoryExporter::default());
        let engine = WorkflowEngine::new(store.clone(), gateway.clone(), exporter.clone());

        let directory = RoleDirectory::new(store.clone());
        for (email, name, role) in [
            (REQUESTER, "Bilal Khan", Role::Requester),
            (PLANNER, "Ayesha Noor", Role::RotablePlanning),
            (CHIEF, "Imran Ali", Role::ChiefMoc),
            (OFFICER, "Hina Shah", Role::RpOfficer),
        ] {
            directory
                .register(&UserProfile {
                    name: name.to_string(),
                    profession: "Engineer".to_string(),
                    role: Some(role),
                    email: email.to_string(),
                    token: format!("ExponentPushToken[{}]", role.number()),
                })
                .await
                .unwrap();
        }
        log.clear();

        Self {
            log,
            store,
            gateway,
            exporter,
            engine,
        }
    }

    pub async fn session(&self, email: &str) -> Session {
        self.engine.directory().sign_in(email).await.unwrap()
    }
}

pub fn token(role: Role) -> String {
    format!("ExponentPushToken[{}]", role.number())
}

pub fn brake_unit_request() -> RequestForm {
    RequestForm {
        nomenclature: "Brake Unit".to_string(),
        part_no: "12345".to_string(),
        recipient_reg: "AP-BEX".to_string(),
        recipient_station: "KHI".to_string(),
        reason: "NIL stock".to_string(),
        atlb: "REF-001".to_string(),
        ..Default::default()
    }
}

pub fn permission_form() -> PermissionForm {
    PermissionForm {
        donor_reg: "AP-BHV".to_string(),
        preserved: true,
        c_of_a_valid: true,
        remarks: "Donor grounded for C-check".to_string(),
        approval_ref: "CM-2291".to_string(),
    }
}

pub fn action_form() -> ActionForm {
    let mut form = ActionForm::default();
    form.donor_section.serviceability = true;
    form.donor_section.inspected = true;
    form.donor_section.atlb_ref_no = "ATLB-778".to_string();
    form.recipient_section.off_part_no = "12345".to_string();
    form.recipient_section.off_serial_no = "SN-OFF-1".to_string();
    form.recipient_section.on_part_no = "12345".to_string();
    form.recipient_section.on_serial_no = "SN-ON-9".to_string();
    form.recipient_section.ipc_ref = "IPC 32-42-01".to_string();
    form
}

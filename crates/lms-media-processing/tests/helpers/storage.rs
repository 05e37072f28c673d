use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use lms_media_core::{UploadBackend, UploadOutcome};
use lms_media_storage::{ObjectUploader, UploadError, UploadRequest, UploadResult};

#[derive(Debug, Clone, Copy)]
pub enum UploadFailure {
    Status(u16),
    Unreachable,
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub folder: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub url: String,
}

/// In-memory uploader with scripted per-folder failures and latencies.
#[derive(Default)]
pub struct MemoryUploader {
    counter: AtomicUsize,
    objects: Mutex<Vec<StoredObject>>,
    failures: Mutex<HashMap<String, UploadFailure>>,
    delays: Mutex<HashMap<String, Duration>>,
}

impl MemoryUploader {
    pub fn fail_folder(&self, folder: &str, failure: UploadFailure) {
        self.failures
            .lock()
            .unwrap()
            .insert(folder.to_string(), failure);
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    pub fn delay_folder(&self, folder: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(folder.to_string(), delay);
    }

    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects.lock().unwrap().clone()
    }

    pub fn folders(&self) -> Vec<String> {
        self.objects().into_iter().map(|o| o.folder).collect()
    }
}

#[async_trait]
impl ObjectUploader for MemoryUploader {
    async fn upload(&self, request: UploadRequest) -> UploadResult<UploadOutcome> {
        let delay = self.delays.lock().unwrap().get(&request.folder).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failures.lock().unwrap().get(&request.folder).copied();
        match failure {
            Some(UploadFailure::Status(status)) => {
                return Err(UploadError::UploadFailed {
                    folder: request.folder.clone(),
                    size_bytes: request.size(),
                    status,
                    message: "scripted failure".to_string(),
                })
            }
            Some(UploadFailure::Unreachable) => {
                return Err(UploadError::Unreachable {
                    folder: request.folder.clone(),
                    size_bytes: request.size(),
                    message: "connection refused".to_string(),
                })
            }
            None => {}
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let url = format!(
            "https://cdn.test/{}/{}-{}",
            request.folder, n, request.file_name
        );
        self.objects.lock().unwrap().push(StoredObject {
            folder: request.folder.clone(),
            file_name: request.file_name.clone(),
            content_type: request.content_type.clone(),
            size_bytes: request.size(),
            url: url.clone(),
        });
        Ok(UploadOutcome { url })
    }

    fn backend_type(&self) -> UploadBackend {
        UploadBackend::Local
    }
}

//! In-memory sidecar used by the unit tests of this crate.

use std::{
    collections::{BTreeMap, VecDeque},
    sync::Mutex,
};

use async_trait::async_trait;

use crate::{
    api::{
        DeleteStateRequest, GetStateRequest, GetStateResponse, SaveStateRequest, StateApi,
    },
    error::{Error, Result},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Get(GetStateRequest),
    Save(SaveStateRequest),
    Delete(DeleteStateRequest),
}

/// Stores items per (store, key), versions them with a counter, and rejects
/// writes whose etag does not match, like a real store configured for
/// optimistic concurrency. Every request is recorded.
#[derive(Default)]
pub(crate) struct FakeSidecar {
    items: Mutex<BTreeMap<(String, String), (Vec<u8>, u64)>>,
    calls: Mutex<Vec<Call>>,
    /// Statuses to fail the next calls with, oldest first.
    faults: Mutex<VecDeque<u16>>,
}

impl FakeSidecar {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail_next(&self, status: u16) {
        self.faults.lock().unwrap().push_back(status);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn put_raw(&self, store: &str, key: &str, bytes: &[u8]) {
        let mut items = self.items.lock().unwrap();
        let version = items
            .get(&(store.to_string(), key.to_string()))
            .map(|(_, v)| v + 1)
            .unwrap_or(1);
        items.insert((store.to_string(), key.to_string()), (bytes.to_vec(), version));
    }

    fn record(&self, call: Call) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        match self.faults.lock().unwrap().pop_front() {
            Some(status) => Err(Error::RemoteFault {
                status,
                message: "injected".to_string(),
            }),
            None => Ok(()),
        }
    }

    fn check_etag(current: Option<u64>, etag: &Option<String>) -> Result<()> {
        match etag {
            None => Ok(()),
            Some(etag) if current.map(|v| v.to_string()).as_deref() == Some(etag.as_str()) => {
                Ok(())
            }
            Some(_) => Err(Error::RemoteFault {
                status: 409,
                message: "possible etag mismatch".to_string(),
            }),
        }
    }
}

#[async_trait]
impl StateApi for FakeSidecar {
    async fn get_state(&self, request: GetStateRequest) -> Result<GetStateResponse> {
        self.record(Call::Get(request.clone()))?;
        let items = self.items.lock().unwrap();
        Ok(match items.get(&(request.store, request.key)) {
            Some((bytes, version)) => GetStateResponse {
                data: Some(bytes.clone()),
                etag: Some(version.to_string()),
            },
            None => GetStateResponse::default(),
        })
    }

    async fn save_state(&self, request: SaveStateRequest) -> Result<()> {
        self.record(Call::Save(request.clone()))?;
        let mut items = self.items.lock().unwrap();
        for item in &request.requests {
            let id = (request.store.clone(), item.key.clone());
            let current = items.get(&id).map(|(_, v)| *v);
            Self::check_etag(current, &item.etag)?;
            match &item.value {
                Some(bytes) => {
                    items.insert(id, (bytes.clone(), current.unwrap_or(0) + 1));
                }
                None => {
                    items.remove(&id);
                }
            }
        }
        Ok(())
    }

    async fn delete_state(&self, request: DeleteStateRequest) -> Result<()> {
        self.record(Call::Delete(request.clone()))?;
        let mut items = self.items.lock().unwrap();
        let id = (request.store, request.key);
        let current = items.get(&id).map(|(_, v)| *v);
        Self::check_etag(current, &request.etag)?;
        items.remove(&id);
        Ok(())
    }
}

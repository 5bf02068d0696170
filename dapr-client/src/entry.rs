use serde::Serialize;

use crate::{
    api::StateApi,
    error::Result,
    options::StateOptions,
    state::{StateClient, WriteRequest},
};

/// A value read from a state store, together with the key it was read from
/// and the etag it was read with.
///
/// The entry holds no connection; pass the client to [`save_entry`] and
/// friends to write it back. Saving does not refresh `etag`: read the entry
/// again to continue with the new version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateEntry<T> {
    store: String,
    key: String,
    pub value: Option<T>,
    pub etag: Option<String>,
}

impl<T> StateEntry<T> {
    pub fn new(store: String, key: String, value: Option<T>, etag: Option<String>) -> Self {
        StateEntry {
            store,
            key,
            value,
            etag,
        }
    }

    pub fn store(&self) -> &str {
        &self.store
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn write_request(&self, options: Option<StateOptions>) -> WriteRequest<'_, T> {
        WriteRequest {
            store: &self.store,
            key: &self.key,
            value: self.value.as_ref(),
            etag: self.etag.as_deref(),
            options,
            metadata: None,
        }
    }
}

/// Write the entry's current value back under its key, with its etag.
/// An etag conflict is an error here; see [`try_save_entry`].
pub async fn save_entry<A: StateApi, T: Serialize>(
    client: &StateClient<A>,
    entry: &StateEntry<T>,
    options: Option<StateOptions>,
) -> Result<()> {
    client.write(entry.write_request(options)).await
}

/// Like [`save_entry`], but an etag conflict yields `false`.
pub async fn try_save_entry<A: StateApi, T: Serialize>(
    client: &StateClient<A>,
    entry: &StateEntry<T>,
    options: Option<StateOptions>,
) -> Result<bool> {
    StateClient::<A>::soften(client.write(entry.write_request(options)).await)
}

/// Delete the item the entry was read from, with the entry's etag.
pub async fn delete_entry<A: StateApi, T>(
    client: &StateClient<A>,
    entry: &StateEntry<T>,
    options: Option<StateOptions>,
) -> Result<()> {
    client
        .remove(&entry.store, &entry.key, entry.etag.as_deref(), options)
        .await
}

/// Like [`delete_entry`], but an etag conflict yields `false`.
pub async fn try_delete_entry<A: StateApi, T>(
    client: &StateClient<A>,
    entry: &StateEntry<T>,
    options: Option<StateOptions>,
) -> Result<bool> {
    StateClient::<A>::soften(
        client
            .remove(&entry.store, &entry.key, entry.etag.as_deref(), options)
            .await,
    )
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::testing::{Call, FakeSidecar};

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Widget {
        size: String,
        color: String,
    }

    fn yellow() -> Widget {
        Widget {
            size: "small".to_string(),
            color: "yellow".to_string(),
        }
    }

    async fn seeded() -> StateClient<FakeSidecar> {
        let client = StateClient::new(FakeSidecar::new());
        client
            .save_state("testStore", "test", Some(&yellow()), None, None)
            .await
            .unwrap();
        client
    }

    #[tokio::test]
    async fn test_entry_save_sends_mutated_value() {
        let client = seeded().await;
        let mut entry = client
            .get_state_entry::<Widget>("testStore", "test", None)
            .await
            .unwrap();
        assert_eq!(entry.key(), "test");
        assert_eq!(entry.store(), "testStore");
        let etag = entry.etag.clone();
        assert_eq!(etag.as_deref(), Some("1"));

        entry.value.as_mut().unwrap().color = "green".to_string();
        save_entry(&client, &entry, None).await.unwrap();

        let calls = client.api().calls();
        let Call::Save(request) = calls.last().unwrap() else {
            panic!("expected a save, got {:?}", calls.last());
        };
        assert_eq!(request.store, "testStore");
        assert_eq!(request.requests.len(), 1);
        let item = &request.requests[0];
        assert_eq!(item.key, "test");
        assert_eq!(item.etag, etag);
        let saved: Widget = serde_json::from_slice(item.value.as_ref().unwrap()).unwrap();
        assert_eq!(saved.color, "green");
        assert_eq!(saved.size, "small");

        // not refreshed
        assert_eq!(entry.etag, etag);
    }

    #[tokio::test]
    async fn test_entry_second_save_conflicts() {
        let client = seeded().await;
        let entry = client
            .get_state_entry::<Widget>("testStore", "test", None)
            .await
            .unwrap();
        assert!(try_save_entry(&client, &entry, None).await.unwrap());
        // The stored version moved on, the entry's etag did not.
        assert!(!try_save_entry(&client, &entry, None).await.unwrap());
        let e = save_entry(&client, &entry, None).await.unwrap_err();
        assert!(e.is_precondition_failed());
    }

    #[tokio::test]
    async fn test_entry_delete() {
        let client = seeded().await;
        let entry = client
            .get_state_entry::<Widget>("testStore", "test", None)
            .await
            .unwrap();
        delete_entry(&client, &entry, Some(StateOptions::default()))
            .await
            .unwrap();

        let calls = client.api().calls();
        let Call::Delete(request) = calls.last().unwrap() else {
            panic!("expected a delete, got {:?}", calls.last());
        };
        assert_eq!(request.store, "testStore");
        assert_eq!(request.key, "test");
        assert_eq!(request.etag.as_deref(), Some("1"));
        assert_eq!(request.options, Some(StateOptions::default()));

        let gone: Option<Widget> = client.get_state("testStore", "test", None).await.unwrap();
        assert_eq!(gone, None);
    }

    #[tokio::test]
    async fn test_entry_try_delete_stale() {
        let client = seeded().await;
        let entry = client
            .get_state_entry::<Widget>("testStore", "test", None)
            .await
            .unwrap();
        client
            .save_state("testStore", "test", Some(&yellow()), None, None)
            .await
            .unwrap();
        assert!(!try_delete_entry(&client, &entry, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_entry_saves_clear() {
        let client = StateClient::new(FakeSidecar::new());
        let entry = client
            .get_state_entry::<Widget>("testStore", "missing", None)
            .await
            .unwrap();
        assert_eq!(entry.key(), "missing");
        assert_eq!(entry.value, None);
        assert_eq!(entry.etag, None);

        save_entry(&client, &entry, None).await.unwrap();
        let calls = client.api().calls();
        let Call::Save(request) = calls.last().unwrap() else {
            panic!("expected a save");
        };
        assert_eq!(request.requests[0].value, None);
    }
}
